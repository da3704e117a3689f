//! Single-pass constant folding.
//!
//! Nodes are pushed onto a working stack in program order. Each time a
//! constant lands on top, the top is folded for as long as it reads
//! `binary-op, constant, constant` or `unary-op, constant`. The pass is greedy
//! and only ever collapses fully constant subtrees; anything touching a
//! variable is left as it was. The result is not a canonical form.

use crate::types::{Node, Program};

pub fn simplify(program: &Program) -> Program {
    let mut stack: Vec<Node> = Vec::with_capacity(program.len());
    for node in program.nodes() {
        stack.push(*node);
        if node.is_constant() {
            fold_top(&mut stack);
        }
    }
    // Each fold replaces a complete subtree with a single leaf, so the
    // sequence is still exactly one tree.
    Program::from_folded(stack)
}

fn fold_top(stack: &mut Vec<Node>) {
    loop {
        let folded = match stack.as_slice() {
            [.., Node::Operator(op), Node::Constant(a), Node::Constant(b)] if op.is_binary() => {
                Some((3, op.apply(*a, *b)))
            }
            [.., Node::Operator(op), Node::Constant(a)] if !op.is_binary() => {
                Some((2, op.apply(*a, 0.0)))
            }
            _ => None,
        };

        match folded {
            Some((consumed, value)) => {
                stack.truncate(stack.len() - consumed);
                stack.push(Node::Constant(value));
            }
            None => break,
        }
    }
}
