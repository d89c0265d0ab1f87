//! Compiled numeric formulas for per-stack rule values.
//!
//! Designers author rule values either as plain numbers or as small
//! arithmetic formulas referencing the evaluating battler (`a`) and,
//! where the event provides one, a target battler (`b`), e.g.
//! `a.atk / 10` or `max(1, a.mhp / 100)`. Formulas are compiled once
//! into an AST at load time and evaluated at every query, because they
//! may read mutable battler state.
//!
//! Parameter fields (`atk`, `mhp`, ...) resolve against the battler's
//! *native* (pre-stack) values. Stack contributions are applied on top
//! of the native pipeline, so a rule formula can never recurse into the
//! modifier it is part of.
//!
//! Evaluation failure is not fatal: [`StackValue::evaluate`] degrades to
//! a `0.0` contribution and emits a debug-level diagnostic.

use std::fmt;
use std::str::FromStr;

use crate::battler::{Battler, ParamId};
use crate::config::EngineConfig;

/// Read-only evaluation context handed to formulas and modifier rules.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub actor: &'a Battler,
    pub target: Option<&'a Battler>,
    pub config: &'a EngineConfig,
}

impl<'a> EvalContext<'a> {
    pub fn new(config: &'a EngineConfig, actor: &'a Battler) -> Self {
        Self {
            actor,
            target: None,
            config,
        }
    }

    pub fn with_target(mut self, target: &'a Battler) -> Self {
        self.target = Some(target);
        self
    }
}

/// Errors produced while compiling or evaluating a formula.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("unexpected character `{0}` at byte {1}")]
    UnexpectedChar(char, usize),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("expected `{0}`")]
    Expected(&'static str),

    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    #[error("unknown battler field `{0}`")]
    UnknownField(String),

    #[error("wrong argument count for `{0}`")]
    BadArity(&'static str),

    #[error("formula references `b` but the event has no target")]
    NoTarget,

    #[error("division by zero")]
    DivisionByZero,

    #[error("formula produced a non-finite value")]
    NonFinite,
}

/// Which battler a field access reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Subject {
    /// `a` — the battler owning the stacks.
    Actor,
    /// `b` — the opposing battler, when the event provides one.
    Target,
}

/// Battler fields addressable from formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Hp,
    Mp,
    Tp,
    Param(ParamId),
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "hp" => Some(Self::Hp),
            "mp" => Some(Self::Mp),
            "tp" => Some(Self::Tp),
            _ => ParamId::from_str(name).ok().map(Self::Param),
        }
    }

    fn read(self, battler: &Battler, config: &EngineConfig) -> f64 {
        match self {
            Self::Hp => battler.hp as f64,
            Self::Mp => battler.mp as f64,
            Self::Tp => battler.tp as f64,
            Self::Param(param) => battler.native_param(config, param) as f64,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Func {
    Min,
    Max,
    Floor,
    Abs,
}

impl Func {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "floor" => Some(Self::Floor),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Floor => "floor",
            Self::Abs => "abs",
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::Min | Self::Max => 2,
            Self::Floor | Self::Abs => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    Number(f64),
    Field(Subject, Field),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

impl Expr {
    fn eval(&self, ctx: &EvalContext<'_>) -> Result<f64, FormulaError> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Field(subject, field) => {
                let battler = match subject {
                    Subject::Actor => ctx.actor,
                    Subject::Target => ctx.target.ok_or(FormulaError::NoTarget)?,
                };
                field.read(battler, ctx.config)
            }
            Self::Neg(inner) => -inner.eval(ctx)?,
            Self::Binary(op, lhs, rhs) => {
                let l = lhs.eval(ctx)?;
                let r = rhs.eval(ctx)?;
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div if r == 0.0 => return Err(FormulaError::DivisionByZero),
                    BinOp::Div => l / r,
                    BinOp::Rem if r == 0.0 => return Err(FormulaError::DivisionByZero),
                    BinOp::Rem => l % r,
                }
            }
            Self::Call(func, args) => {
                let a = args[0].eval(ctx)?;
                match func {
                    Func::Min => a.min(args[1].eval(ctx)?),
                    Func::Max => a.max(args[1].eval(ctx)?),
                    Func::Floor => a.floor(),
                    Func::Abs => a.abs(),
                }
            }
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite)
        }
    }
}

/// A formula compiled from designer-authored source.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    source: String,
    root: Expr,
}

impl Formula {
    /// Compile `source` into an evaluable formula.
    pub fn compile(source: &str) -> Result<Self, FormulaError> {
        let mut parser = Parser::new(source);
        let root = parser.expr()?;
        parser.expect_end()?;
        Ok(Self {
            source: source.to_owned(),
            root,
        })
    }

    /// The original source text, kept for diagnostics.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against the context, propagating failures to the caller.
    pub fn eval(&self, ctx: &EvalContext<'_>) -> Result<f64, FormulaError> {
        self.root.eval(ctx)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A per-stack rule value: either a plain number or a compiled formula.
#[derive(Clone, Debug, PartialEq)]
pub enum StackValue {
    Number(f64),
    Formula(Formula),
}

impl StackValue {
    /// Parse a designer-authored value string.
    ///
    /// A string that parses as a number stays a number; anything else is
    /// compiled as a formula. Compile failures are returned so loaders
    /// can decide how tolerant to be.
    pub fn from_source(source: &str) -> Result<Self, FormulaError> {
        let trimmed = source.trim();
        if let Ok(number) = trimmed.parse::<f64>() {
            return Ok(Self::Number(number));
        }
        Formula::compile(trimmed).map(Self::Formula)
    }

    /// Evaluate to a contribution value.
    ///
    /// Failures degrade to `0.0` with a debug diagnostic; a broken rule
    /// must never abort the surrounding combat resolution.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Formula(formula) => match formula.eval(ctx) {
                Ok(value) => value,
                Err(error) => {
                    tracing::debug!(
                        formula = formula.source(),
                        %error,
                        "formula evaluation failed, contributing 0"
                    );
                    0.0
                }
            },
        }
    }
}

impl From<f64> for StackValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

struct Parser<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8, what: &'static str) -> Result<(), FormulaError> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(FormulaError::Expected(what))
        }
    }

    fn expect_end(&mut self) -> Result<(), FormulaError> {
        match self.peek() {
            None => Ok(()),
            Some(b) => Err(FormulaError::UnexpectedChar(b as char, self.pos)),
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(b'+') => BinOp::Add,
                Some(b'-') => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(b'*') => BinOp::Mul,
                Some(b'/') => BinOp::Div,
                Some(b'%') => BinOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if self.eat(b'-') {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            None => Err(FormulaError::UnexpectedEnd),
            Some(b'(') => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(b')', ")")?;
                Ok(inner)
            }
            Some(b) if b.is_ascii_digit() || b == b'.' => self.number(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.identifier(),
            Some(b) => Err(FormulaError::UnexpectedChar(b as char, self.pos)),
        }
    }

    fn number(&mut self) -> Result<Expr, FormulaError> {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_digit() || *b == b'.')
        {
            self.pos += 1;
        }
        self.source[start..self.pos]
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|_| FormulaError::UnexpectedChar(self.bytes[start] as char, start))
    }

    fn ident(&mut self) -> &'s str {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    fn identifier(&mut self) -> Result<Expr, FormulaError> {
        let name = self.ident();
        let subject = match name {
            "a" | "actor" => Some(Subject::Actor),
            "b" | "target" => Some(Subject::Target),
            _ => None,
        };
        if let Some(subject) = subject {
            self.expect(b'.', ".")?;
            self.skip_ws();
            let field_name = self.ident();
            let field = Field::parse(field_name)
                .ok_or_else(|| FormulaError::UnknownField(field_name.to_owned()))?;
            return Ok(Expr::Field(subject, field));
        }
        if let Some(func) = Func::parse(name) {
            self.expect(b'(', "(")?;
            let mut args = vec![self.expr()?];
            while self.eat(b',') {
                args.push(self.expr()?);
            }
            self.expect(b')', ")")?;
            if args.len() != func.arity() {
                return Err(FormulaError::BadArity(func.name()));
            }
            return Ok(Expr::Call(func, args));
        }
        Err(FormulaError::UnknownIdentifier(name.to_owned()))
    }
}
