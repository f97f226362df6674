//! Restricted expression evaluator that turns text such as `"cos(x)"` into a
//! callable real-to-real function.
//!
//! Only `x`, numeric literals, the arithmetic operators, the constants `pi` and
//! `e`, and the functions listed in [`Builtin`] are visible to an expression.
//! Every other name is rejected with
//! [`UndefinedSymbol`](crate::error::FixedPointError::UndefinedSymbol) when the
//! expression is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FixedPointError, Result};
use crate::parser;

/// A real-valued function of one real argument that may fail to evaluate.
///
/// Implemented for [`Expression`] and for any `Fn(f64) -> f64` closure, so the
/// iteration engine accepts parsed text and native Rust functions alike.
pub trait ScalarFunction {
    /// Evaluates the function at `x`.
    fn evaluate(&self, x: f64) -> Result<f64>;
}

impl<F> ScalarFunction for F
where
    F: Fn(f64) -> f64,
{
    fn evaluate(&self, x: f64) -> Result<f64> {
        Ok(self(x))
    }
}

/// Unit in which trigonometric functions read their arguments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    /// Standard behaviour.
    #[default]
    Radians,
    /// `sin`, `cos` and `tan` take degrees; `arcsin`, `arccos` and `arctan`
    /// return degrees.
    Degrees,
}

impl AngleUnit {
    fn to_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Radians => angle,
            AngleUnit::Degrees => angle.to_radians(),
        }
    }

    fn from_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Radians => angle,
            AngleUnit::Degrees => angle.to_degrees(),
        }
    }
}

/// The allow-listed functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Log10,
    Sqrt,
    Abs,
    Arcsin,
    Arccos,
    Arctan,
    Sinh,
    Cosh,
    Tanh,
}

impl Builtin {
    /// Every allow-listed function, in a stable order.
    pub const ALL: [Builtin; 14] = [
        Builtin::Sin,
        Builtin::Cos,
        Builtin::Tan,
        Builtin::Exp,
        Builtin::Log,
        Builtin::Log10,
        Builtin::Sqrt,
        Builtin::Abs,
        Builtin::Arcsin,
        Builtin::Arccos,
        Builtin::Arctan,
        Builtin::Sinh,
        Builtin::Cosh,
        Builtin::Tanh,
    ];

    /// Looks up a function by the name used in expression text.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    /// Name used in expression text.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Exp => "exp",
            Builtin::Log => "log",
            Builtin::Log10 => "log10",
            Builtin::Sqrt => "sqrt",
            Builtin::Abs => "abs",
            Builtin::Arcsin => "arcsin",
            Builtin::Arccos => "arccos",
            Builtin::Arctan => "arctan",
            Builtin::Sinh => "sinh",
            Builtin::Cosh => "cosh",
            Builtin::Tanh => "tanh",
        }
    }

    fn apply(self, value: f64, unit: AngleUnit) -> Result<f64> {
        let result = match self {
            Builtin::Sin => unit.to_radians(value).sin(),
            Builtin::Cos => unit.to_radians(value).cos(),
            Builtin::Tan => unit.to_radians(value).tan(),
            Builtin::Exp => value.exp(),
            Builtin::Log | Builtin::Log10 if value <= 0.0 => {
                return Err(FixedPointError::domain(self.name(), value));
            }
            Builtin::Log => value.ln(),
            Builtin::Log10 => value.log10(),
            Builtin::Sqrt if value < 0.0 => {
                return Err(FixedPointError::domain(self.name(), value));
            }
            Builtin::Sqrt => value.sqrt(),
            Builtin::Abs => value.abs(),
            Builtin::Arcsin | Builtin::Arccos if !(-1.0..=1.0).contains(&value) => {
                return Err(FixedPointError::domain(self.name(), value));
            }
            Builtin::Arcsin => unit.from_radians(value.asin()),
            Builtin::Arccos => unit.from_radians(value.acos()),
            Builtin::Arctan => unit.from_radians(value.atan()),
            Builtin::Sinh => value.sinh(),
            Builtin::Cosh => value.cosh(),
            Builtin::Tanh => value.tanh(),
        };
        Ok(result)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn apply(self, lhs: f64, rhs: f64) -> Result<f64> {
        match self {
            BinaryOp::Add => Ok(lhs + rhs),
            BinaryOp::Sub => Ok(lhs - rhs),
            BinaryOp::Mul => Ok(lhs * rhs),
            BinaryOp::Div if rhs == 0.0 => Err(FixedPointError::domain("division", lhs)),
            BinaryOp::Div => Ok(lhs / rhs),
            BinaryOp::Pow if lhs == 0.0 && rhs < 0.0 => {
                Err(FixedPointError::domain("power", lhs))
            }
            // A negative base with a fractional exponent has no real value.
            BinaryOp::Pow if lhs < 0.0 && rhs.is_finite() && rhs.fract() != 0.0 => {
                Err(FixedPointError::domain("power", lhs))
            }
            BinaryOp::Pow => Ok(lhs.powf(rhs)),
        }
    }
}

/// Syntax tree of a parsed expression. Constants are folded into literals.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Node {
    Number(f64),
    Variable,
    Negate(Box<Node>),
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Call {
        function: Builtin,
        argument: Box<Node>,
    },
}

impl Node {
    pub(crate) fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Self {
        Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn eval(&self, x: f64, unit: AngleUnit) -> Result<f64> {
        match self {
            Node::Number(value) => Ok(*value),
            Node::Variable => Ok(x),
            Node::Negate(inner) => Ok(-inner.eval(x, unit)?),
            Node::Binary { op, lhs, rhs } => op.apply(lhs.eval(x, unit)?, rhs.eval(x, unit)?),
            Node::Call { function, argument } => function.apply(argument.eval(x, unit)?, unit),
        }
    }
}

/// A parsed expression in the single free variable `x`.
#[derive(Clone, Debug)]
pub struct Expression {
    source: String,
    root: Node,
    angle_unit: AngleUnit,
}

impl Expression {
    /// Parses `text` with trigonometric functions in radians.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_unit(text, AngleUnit::Radians)
    }

    /// Parses `text`, interpreting trigonometric functions in `angle_unit`.
    pub fn parse_with_unit(text: &str, angle_unit: AngleUnit) -> Result<Self> {
        let root = parser::parse(text)?;
        log::debug!("built g(x) = {text} ({angle_unit:?})");
        Ok(Self {
            source: text.to_string(),
            root,
            angle_unit,
        })
    }

    /// Returns the original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Angle unit the expression was built with.
    pub fn angle_unit(&self) -> AngleUnit {
        self.angle_unit
    }

    /// Evaluates the expression at `x`.
    ///
    /// Out-of-domain operations fail with
    /// [`Domain`](FixedPointError::Domain). Overflow is not an error here and
    /// yields an infinite value.
    pub fn evaluate(&self, x: f64) -> Result<f64> {
        self.root.eval(x, self.angle_unit)
    }
}

impl ScalarFunction for Expression {
    fn evaluate(&self, x: f64) -> Result<f64> {
        Expression::evaluate(self, x)
    }
}

impl FromStr for Expression {
    type Err = FixedPointError;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
