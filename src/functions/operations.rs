use serde::{Deserialize, Serialize};
use std::fmt;

/// First code assigned to an operator; everything below is a terminal.
pub const OPERATOR_BASE: u32 = 110;

/// Divisors with magnitude at or below this value return the numerator.
pub const DIVISION_GUARD: f64 = 0.001;

/// Exponents above this value are returned unchanged.
pub const EXPONENT_GUARD: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

impl Arity {
    pub fn operand_count(self) -> usize {
        match self {
            Arity::Unary => 1,
            Arity::Binary => 2,
        }
    }
}

/// The fixed operator vocabulary, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
    Exp,
    Sin,
    Cos,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Add,
        Operation::Sub,
        Operation::Mul,
        Operation::Div,
        Operation::Exp,
        Operation::Sin,
        Operation::Cos,
    ];

    pub fn arity(self) -> Arity {
        match self {
            Operation::Add | Operation::Sub | Operation::Mul | Operation::Div => Arity::Binary,
            Operation::Exp | Operation::Sin | Operation::Cos => Arity::Unary,
        }
    }

    pub fn is_binary(self) -> bool {
        self.arity() == Arity::Binary
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "ADD",
            Operation::Sub => "SUB",
            Operation::Mul => "MUL",
            Operation::Div => "DIV",
            Operation::Exp => "EXP",
            Operation::Sin => "SIN",
            Operation::Cos => "COS",
        }
    }

    /// Infix symbol for binary operations.
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Operation::Add => Some("+"),
            Operation::Sub => Some("-"),
            Operation::Mul => Some("*"),
            Operation::Div => Some("/"),
            _ => None,
        }
    }

    /// Applies the operation. Unary operations read only `a`.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Operation::Add => a + b,
            Operation::Sub => a - b,
            Operation::Mul => a * b,
            Operation::Div => protected_div(a, b),
            Operation::Exp => clipped_exp(a),
            Operation::Sin => a.to_radians().sin(),
            Operation::Cos => a.to_radians().cos(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn protected_div(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() <= DIVISION_GUARD {
        numerator
    } else {
        numerator / denominator
    }
}

pub fn clipped_exp(exponent: f64) -> f64 {
    if exponent <= EXPONENT_GUARD {
        exponent.exp()
    } else {
        exponent
    }
}
