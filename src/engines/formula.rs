use crate::types::{Node, Program};
use std::fmt::Write;

/// Infix rendering: `(L op R)` for binary operators, `OP(X)` for unary ones,
/// `X1`, `X2`, ... for variables and the literal for constants.
pub fn to_formula(program: &Program) -> String {
    let mut out = String::with_capacity(program.len() * 4);
    // Infix symbols still owed by open operators; `None` once only the
    // closing parenthesis remains.
    let mut open: Vec<Option<&'static str>> = Vec::new();
    for node in program.nodes() {
        match *node {
            Node::Variable(index) => {
                let _ = write!(out, "X{}", index + 1);
                close_operands(&mut open, &mut out);
            }
            Node::Constant(value) => {
                let _ = write!(out, "{value:?}");
                close_operands(&mut open, &mut out);
            }
            Node::Operator(op) => {
                match op.symbol() {
                    Some(_) => out.push('('),
                    None => {
                        let _ = write!(out, "{}(", op.name());
                    }
                }
                open.push(op.symbol());
            }
        }
    }
    out
}

/// Formula truncated to at most `max_chars` characters, with a trailing `...`.
pub fn to_formula_short(program: &Program, max_chars: usize) -> String {
    let formula = to_formula(program);
    if formula.chars().count() <= max_chars {
        return formula;
    }
    let kept: String = formula.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Called after an operand is complete: emits the infix symbol of a binary
/// operator waiting for its right operand, or closes finished operators.
fn close_operands(open: &mut Vec<Option<&'static str>>, out: &mut String) {
    while let Some(pending) = open.last_mut() {
        if let Some(symbol) = pending.take() {
            let _ = write!(out, " {symbol} ");
            return;
        }
        out.push(')');
        open.pop();
    }
}
