//! The operator registry: every symbol a tree node may carry, its arity and how it evaluates.

use super::memory::Memory;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Functions that may appear at branch nodes (and `read`, which takes no operands).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Gt,
    Abs,
    Read,
    Write,
}

/// Leaf values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Terminal {
    /// The first input.
    A,
    /// The second input.
    B,
    /// A numeric literal, only produced by parsing.
    Const(f64),
}

/// The value stored at each node of an expression tree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Symbol {
    Terminal(Terminal),
    Operator(Operator),
}

/// The terminals the generator and the mutators choose from.
pub const TERMINALS: [Terminal; 2] = [Terminal::A, Terminal::B];

const STANDARD: [Operator; 6] = [
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::Div,
    Operator::Gt,
    Operator::Abs,
];

const WITH_MEMORY: [Operator; 8] = [
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::Div,
    Operator::Gt,
    Operator::Abs,
    Operator::Read,
    Operator::Write,
];

/// Replace NaN and infinities with 0.
pub fn sanitize(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

impl Operator {
    /// The operators enabled for the given observability mode.
    pub fn enabled(partially_observable: bool) -> &'static [Operator] {
        if partially_observable {
            &WITH_MEMORY
        } else {
            &STANDARD
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Operator::Read => 0,
            Operator::Abs | Operator::Write => 1,
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Gt => 2,
        }
    }

    /// Apply the operator to its evaluated operands.
    ///
    /// Unary operators ignore `y`, `read` ignores both. `write` stores `x` in the memory
    /// register. The result is always finite.
    pub fn apply(self, x: f64, y: f64, memory: &mut Memory) -> f64 {
        let result = match self {
            Operator::Add => x + y,
            Operator::Sub => x - y,
            Operator::Mul => x * y,
            Operator::Div => x / y,
            Operator::Gt => {
                if x > y {
                    1.0
                } else {
                    -1.0
                }
            }
            Operator::Abs => x.abs(),
            Operator::Read => memory.read(),
            Operator::Write => {
                memory.write(x);
                x
            }
        };
        sanitize(result)
    }

    pub fn name(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Gt => ">",
            Operator::Abs => "abs",
            Operator::Read => "read",
            Operator::Write => "write",
        }
    }
}

impl Symbol {
    pub fn arity(&self) -> usize {
        match *self {
            Symbol::Terminal(_) => 0,
            Symbol::Operator(op) => op.arity(),
        }
    }
}

impl From<Terminal> for Symbol {
    fn from(t: Terminal) -> Self {
        Symbol::Terminal(t)
    }
}

impl From<Operator> for Symbol {
    fn from(op: Operator) -> Self {
        Symbol::Operator(op)
    }
}

impl FromStr for Operator {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let op = match s {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            ">" => Operator::Gt,
            "abs" => Operator::Abs,
            "read" => Operator::Read,
            "write" => Operator::Write,
            _ => return Err(Error::MalformedTree(format!("unknown operator `{}`", s))),
        };
        Ok(op)
    }
}

impl FromStr for Symbol {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "a" => return Ok(Terminal::A.into()),
            "b" => return Ok(Terminal::B.into()),
            _ => (),
        }
        if let Ok(op) = s.parse::<Operator>() {
            return Ok(op.into());
        }
        match s.parse::<f64>() {
            Ok(c) if c.is_finite() => Ok(Terminal::Const(c).into()),
            Ok(_) => Err(Error::MalformedTree(format!(
                "constant `{}` is not finite",
                s
            ))),
            Err(_) => Err(Error::MalformedTree(format!("unrecognised token `{}`", s))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Terminal::A => f.write_str("a"),
            Terminal::B => f.write_str("b"),
            Terminal::Const(c) => write!(f, "{}", c),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Symbol::Terminal(t) => write!(f, "{}", t),
            Symbol::Operator(op) => write!(f, "{}", op),
        }
    }
}
