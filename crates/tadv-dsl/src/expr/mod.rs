//! The story expression language.
//!
//! Conditions (`{% if energy > 50 %}`), interpolations (`{{ player.name }}`)
//! and choice conditions share this pipeline: a logos lexer, a chumsky
//! parser producing an [`Expr`] tree, and a tree walker that evaluates it
//! against a [`Scope`]. Nothing here can reach host functions beyond the
//! whitelisted builtins and whatever the scope exposes.

/// Expression tree.
pub mod ast;
/// Tree evaluator.
pub mod eval;
/// Numeric format specs for interpolation.
pub mod format;
/// Tokens.
pub mod lexer;
/// Token stream to [`Expr`].
pub mod parser;

pub use ast::{BinaryOp, CmpOp, Expr, UnaryOp};
pub use eval::{EvalError, Scope, evaluate, get_field, values_equal};
pub use format::{FormatSpec, split_format};
pub use parser::{ParseError, parse_expr};

/// Parse and evaluate `source` in one step.
pub fn eval_str(source: &str, scope: &dyn Scope) -> Result<tadv_core::Value, EvalError> {
    let expr = parse_expr(source).map_err(syntax_error)?;
    evaluate(&expr, scope)
}

/// Evaluate a condition with null-coalescing on numeric comparisons.
///
/// Errors are returned to the caller, which decides whether they count as
/// false.
pub fn eval_condition(source: &str, scope: &dyn Scope) -> Result<bool, EvalError> {
    let expr = parse_expr(source)
        .map_err(syntax_error)?
        .coalesce_numeric_comparisons();
    evaluate(&expr, scope).map(|v| v.is_truthy())
}

fn syntax_error(errors: Vec<ParseError>) -> EvalError {
    let message = errors
        .into_iter()
        .map(|e| e.message)
        .collect::<Vec<_>>()
        .join("; ");
    EvalError::Syntax(message)
}
