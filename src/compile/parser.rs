//! Postfix fold into the boolean query tree
//!
//! Walks the lexer's postfix stream left-to-right with an operand stack,
//! folding directly into the output document instead of building an AST.
//! Negation is recorded by one-token lookahead: an atom or binary merge
//! followed by `NOT` carries a pending negation; a `NOT` followed by
//! another `NOT` applies one extra negation to the stack top, which is how
//! arbitrary NOT chains resolve with a single token of lookahead.
//!
//! Structural simplifications:
//! - associativity flattening: merging into a node whose sole clause is
//!   the same operator splices its children in place, preserving order;
//! - double negation: negating a merged subexpression whose sole clause is
//!   `must_not` rewrites it to `must`. Negating a bare term never
//!   collapses, so chained NOTs on a term nest verbatim.

use super::lexer::{BoolOp, Token};
use super::term::TermAnalyzer;
use crate::document::{BoolClause, BoolNode, Node};
use crate::error::{ParseError, Result};

/// Where a stack operand came from
///
/// Negating a merged subexpression may collapse a double negation;
/// negating a term always wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Term,
    Subexp,
}

#[derive(Debug)]
struct Operand {
    origin: Origin,
    negate: bool,
    node: Node,
}

/// Fold a postfix token stream into a query document
///
/// Returns the root node and whether any leaf demands scoring-query
/// placement. An empty stream folds to `match_none`.
pub(crate) fn fold(tokens: &[Token], analyzer: &TermAnalyzer) -> Result<(Node, bool)> {
    if tokens.is_empty() {
        return Ok((Node::match_none(), false));
    }

    let mut requires_query = false;
    let mut stack: Vec<Operand> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let negate_next = matches!(tokens.get(i + 1), Some(Token::Op(BoolOp::Not)));
        match token {
            Token::Atom(atom) => {
                let analyzed = analyzer.analyze(atom)?;
                requires_query |= analyzed.flags.any();
                stack.push(Operand {
                    origin: Origin::Term,
                    negate: negate_next,
                    node: analyzed.node,
                });
            }
            Token::Op(BoolOp::And) => merge(&mut stack, BoolClause::Must, negate_next)?,
            Token::Op(BoolOp::Or) => merge(&mut stack, BoolClause::Should, negate_next)?,
            Token::Op(BoolOp::Not) => {
                // This NOT was consumed by the previous token's lookahead.
                // When another NOT follows, apply that one here.
                if negate_next {
                    chain_negate(&mut stack)?;
                }
            }
        }
    }

    let mut remaining = stack.into_iter();
    let result = remaining.next().ok_or(ParseError::MissingOperand)?;
    if remaining.next().is_some() {
        return Err(ParseError::MissingOperator.into());
    }

    let node = if result.negate {
        wrap_must_not(result.node)
    } else {
        result.node
    };
    Ok((node, requires_query))
}

/// Pop two operands and combine them under `must` (AND) or `should` (OR)
fn merge(stack: &mut Vec<Operand>, target: BoolClause, negate_result: bool) -> Result<()> {
    let b = stack.pop().ok_or(ParseError::MissingOperand)?;
    let a = stack.pop().ok_or(ParseError::MissingOperand)?;

    let mut children = Vec::new();
    for operand in [a, b] {
        let node = if operand.negate {
            wrap_must_not(operand.node)
        } else {
            operand.node
        };
        match node {
            // Same operator below: splice the children in, keeping order.
            Node::Bool(inner) if inner.sole_clause() == Some(target) => {
                children.extend(inner.into_children(target));
            }
            other => children.push(other),
        }
    }

    let mut node = Node::Bool(BoolNode::of(target, children));
    if negate_result {
        node = negate_subexp(node);
    }
    stack.push(Operand {
        origin: Origin::Subexp,
        negate: false,
        node,
    });
    Ok(())
}

/// Apply one negation to the stack top, for the second and later NOTs of
/// a chain
fn chain_negate(stack: &mut Vec<Operand>) -> Result<()> {
    let top = stack.pop().ok_or(ParseError::MissingOperand)?;
    let node = if top.negate {
        wrap_must_not(top.node)
    } else {
        top.node
    };
    let node = match top.origin {
        Origin::Term => wrap_must_not(node),
        Origin::Subexp => negate_subexp(node),
    };
    stack.push(Operand {
        origin: top.origin,
        negate: false,
        node,
    });
    Ok(())
}

fn wrap_must_not(node: Node) -> Node {
    Node::Bool(BoolNode::of(BoolClause::MustNot, vec![node]))
}

/// Negate a merged subexpression, collapsing a sole `must_not` to `must`
fn negate_subexp(node: Node) -> Node {
    match node {
        Node::Bool(inner) if inner.sole_clause() == Some(BoolClause::MustNot) => {
            Node::Bool(BoolNode::of(
                BoolClause::Must,
                inner.into_children(BoolClause::MustNot),
            ))
        }
        other => wrap_must_not(other),
    }
}
