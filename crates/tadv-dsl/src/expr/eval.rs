use std::cmp::Ordering;
use std::collections::HashMap;

use tadv_core::Value;
use thiserror::Error;

use super::ast::{BinaryOp, CmpOp, Expr, UnaryOp};

/// Errors raised while evaluating an expression.
///
/// Callers turn these into "false" for conditions and into an inline marker
/// for interpolation; they never abort a render.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The expression text did not parse.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A top-level name is not bound.
    #[error("unknown name `{0}`")]
    UnknownName(String),

    /// A function name is not whitelisted.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    /// A function received the wrong number of arguments.
    #[error("{name}() takes {expected} argument(s), got {got}")]
    Arity {
        /// Function name.
        name: String,
        /// Accepted argument counts, e.g. `1 or 2`.
        expected: &'static str,
        /// Arguments supplied.
        got: usize,
    },

    /// An operator or function was applied to unsupported types.
    #[error("{0}")]
    Type(String),

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,
}

/// Read-only bindings an expression is evaluated against.
pub trait Scope {
    /// Resolve a dotted name such as `["player", "energy"]`.
    fn resolve(&self, path: &[String]) -> Result<Value, EvalError>;

    /// Call a function provided by the scope.
    ///
    /// Returns `None` when the scope does not define `name`, in which case
    /// the builtin functions are tried.
    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, EvalError>> {
        let _ = (name, args);
        None
    }
}

/// A flat map of names, mostly useful in tests and tools.
impl Scope for HashMap<String, Value> {
    fn resolve(&self, path: &[String]) -> Result<Value, EvalError> {
        let Some((head, rest)) = path.split_first() else {
            return Err(EvalError::UnknownName(String::new()));
        };
        let value = self
            .get(head)
            .cloned()
            .ok_or_else(|| EvalError::UnknownName(head.clone()))?;
        rest.iter().try_fold(value, |v, field| get_field(&v, field))
    }
}

/// Read `field` from a map value. Missing keys read as null.
pub fn get_field(value: &Value, field: &str) -> Result<Value, EvalError> {
    match value {
        Value::Map(map) => Ok(map.get(field).cloned().unwrap_or(Value::Null)),
        other => Err(EvalError::Type(format!(
            "cannot read `{field}` of {}",
            other.type_name()
        ))),
    }
}

/// Evaluate an expression tree.
pub fn evaluate(expr: &Expr, scope: &dyn Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Path(path) => scope.resolve(path),
        Expr::Attr { target, name } => get_field(&evaluate(target, scope)?, name),
        Expr::Index { target, index } => {
            subscript(&evaluate(target, scope)?, &evaluate(index, scope)?)
        }
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|a| evaluate(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            match scope.call(name, &args) {
                Some(result) => result,
                None => call_builtin(name, &args),
            }
        }
        Expr::List(items) => items
            .iter()
            .map(|e| evaluate(e, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Unary { op, expr } => {
            let value = evaluate(expr, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
                UnaryOp::Neg => match value {
                    Value::Integer(n) => n
                        .checked_neg()
                        .map(Value::Integer)
                        .ok_or_else(|| EvalError::Type("integer overflow".into())),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    other => Err(EvalError::Type(format!(
                        "cannot negate {}",
                        other.type_name()
                    ))),
                },
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            arithmetic(*op, &evaluate(lhs, scope)?, &evaluate(rhs, scope)?)
        }
        Expr::Compare { first, rest } => {
            let mut lhs = evaluate(first, scope)?;
            for (op, e) in rest {
                let rhs = evaluate(e, scope)?;
                if !compare(*op, &lhs, &rhs)? {
                    return Ok(Value::Boolean(false));
                }
                lhs = rhs;
            }
            Ok(Value::Boolean(true))
        }
        Expr::And(a, b) => {
            let lhs = evaluate(a, scope)?;
            if lhs.is_truthy() {
                evaluate(b, scope)
            } else {
                Ok(lhs)
            }
        }
        Expr::Or(a, b) => {
            let lhs = evaluate(a, scope)?;
            if lhs.is_truthy() {
                Ok(lhs)
            } else {
                evaluate(b, scope)
            }
        }
        Expr::Coalesce { expr, fallback } => match evaluate(expr, scope)? {
            Value::Null => Ok(fallback.clone()),
            value => Ok(value),
        },
    }
}

fn subscript(target: &Value, index: &Value) -> Result<Value, EvalError> {
    match (target, index) {
        (Value::Map(map), Value::String(key)) => Ok(map.get(key).cloned().unwrap_or(Value::Null)),
        (Value::List(items), Value::Integer(i)) => {
            let len = items.len() as i64;
            let i = if *i < 0 { i + len } else { *i };
            usize::try_from(i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| EvalError::Type("list index out of range".into()))
        }
        (Value::String(s), Value::Integer(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len() as i64;
            let i = if *i < 0 { i + len } else { *i };
            usize::try_from(i)
                .ok()
                .and_then(|i| chars.get(i))
                .map(|c| Value::String(c.to_string()))
                .ok_or_else(|| EvalError::Type("string index out of range".into()))
        }
        (t, i) => Err(EvalError::Type(format!(
            "cannot index {} with {}",
            t.type_name(),
            i.type_name()
        ))),
    }
}

fn type_error(op: &str, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::Type(format!(
        "unsupported operand types for {op}: {} and {}",
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let symbol = match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Rem => "%",
    };
    let overflow = || EvalError::Type("integer overflow".into());

    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => {
            Ok(Value::String(format!("{a}{b}")))
        }
        (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (Value::Integer(a), Value::Integer(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinaryOp::Add => a.checked_add(b).map(Value::Integer).ok_or_else(overflow),
                BinaryOp::Sub => a.checked_sub(b).map(Value::Integer).ok_or_else(overflow),
                BinaryOp::Mul => a.checked_mul(b).map(Value::Integer).ok_or_else(overflow),
                BinaryOp::Div if b == 0 => Err(EvalError::DivisionByZero),
                BinaryOp::Div => Ok(Value::Float(a as f64 / b as f64)),
                _ if b == 0 => Err(EvalError::DivisionByZero),
                BinaryOp::FloorDiv => {
                    let q = a.checked_div(b).ok_or_else(overflow)?;
                    let floored = if a % b != 0 && ((a < 0) != (b < 0)) { q - 1 } else { q };
                    Ok(Value::Integer(floored))
                }
                BinaryOp::Rem => {
                    // Result takes the sign of the divisor.
                    let r = a.checked_rem(b).ok_or_else(overflow)?;
                    let r = if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r };
                    Ok(Value::Integer(r))
                }
            }
        }
        (a, b) => {
            let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
                return Err(type_error(symbol, a, b));
            };
            match op {
                BinaryOp::Add => Ok(Value::Float(x + y)),
                BinaryOp::Sub => Ok(Value::Float(x - y)),
                BinaryOp::Mul => Ok(Value::Float(x * y)),
                _ if y == 0.0 => Err(EvalError::DivisionByZero),
                BinaryOp::Div => Ok(Value::Float(x / y)),
                BinaryOp::FloorDiv => Ok(Value::Float((x / y).floor())),
                BinaryOp::Rem => Ok(Value::Float(x - y * (x / y).floor())),
            }
        }
    }
}

/// Equality across types: numbers compare by value, everything else must
/// match in kind.
pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
        }
        (a, b) if a.is_number() && b.is_number() => a.as_f64() == b.as_f64(),
        (a, b) => a == b,
    }
}

fn ordering(lhs: &Value, rhs: &Value) -> Result<Option<Ordering>, EvalError> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Some(a.cmp(b))),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(x.partial_cmp(&y)),
            _ => Err(EvalError::Type(format!(
                "cannot order {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        },
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match (container, item) {
        (Value::List(items), item) => Ok(items.iter().any(|v| values_equal(v, item))),
        (Value::String(s), Value::String(sub)) => Ok(s.contains(sub.as_str())),
        (Value::Map(map), Value::String(key)) => Ok(map.contains_key(key)),
        (c, i) => Err(EvalError::Type(format!(
            "cannot test {} membership in {}",
            i.type_name(),
            c.type_name()
        ))),
    }
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    Ok(match op {
        CmpOp::Eq => values_equal(lhs, rhs),
        CmpOp::NotEq => !values_equal(lhs, rhs),
        CmpOp::Lt => ordering(lhs, rhs)? == Some(Ordering::Less),
        CmpOp::LtEq => matches!(
            ordering(lhs, rhs)?,
            Some(Ordering::Less | Ordering::Equal)
        ),
        CmpOp::Gt => ordering(lhs, rhs)? == Some(Ordering::Greater),
        CmpOp::GtEq => matches!(
            ordering(lhs, rhs)?,
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CmpOp::In => contains(rhs, lhs)?,
        CmpOp::NotIn => !contains(rhs, lhs)?,
        CmpOp::Is => lhs == rhs,
        CmpOp::IsNot => lhs != rhs,
    })
}

fn arity(name: &str, expected: &'static str, got: usize) -> EvalError {
    EvalError::Arity {
        name: name.to_string(),
        expected,
        got,
    }
}

fn extreme(name: &str, args: &[Value], want: Ordering) -> Result<Value, EvalError> {
    let items = match args {
        [Value::List(items)] => items.as_slice(),
        [] => return Err(arity(name, "at least 1", 0)),
        _ => args,
    };
    let mut best: Option<&Value> = None;
    for item in items {
        best = match best {
            Some(b) if ordering(item, b)? != Some(want) => Some(b),
            _ => Some(item),
        };
    }
    best.cloned()
        .ok_or_else(|| EvalError::Type(format!("{name}() of an empty list")))
}

/// Functions every expression may call.
fn call_builtin(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "min" => extreme(name, args, Ordering::Less),
        "max" => extreme(name, args, Ordering::Greater),
        "abs" => match args {
            [Value::Integer(n)] => Ok(Value::Integer(n.saturating_abs())),
            [Value::Float(f)] => Ok(Value::Float(f.abs())),
            [other] => Err(EvalError::Type(format!(
                "abs() of {}",
                other.type_name()
            ))),
            _ => Err(arity(name, "1", args.len())),
        },
        "round" => match args {
            [Value::Integer(n)] => Ok(Value::Integer(*n)),
            [v] => match v.as_f64() {
                Some(f) if f.is_finite() => Ok(Value::Integer(f.round() as i64)),
                _ => Err(EvalError::Type(format!("round() of {}", v.type_name()))),
            },
            [v, Value::Integer(digits)] => {
                let Some(f) = v.as_f64() else {
                    return Err(EvalError::Type(format!("round() of {}", v.type_name())));
                };
                let scale = 10f64.powi((*digits).clamp(-15, 15) as i32);
                Ok(Value::Float((f * scale).round() / scale))
            }
            _ => Err(arity(name, "1 or 2", args.len())),
        },
        "len" => match args {
            [Value::String(s)] => Ok(Value::Integer(s.chars().count() as i64)),
            [Value::List(items)] => Ok(Value::Integer(items.len() as i64)),
            [Value::Map(map)] => Ok(Value::Integer(map.len() as i64)),
            [other] => Err(EvalError::Type(format!(
                "len() of {}",
                other.type_name()
            ))),
            _ => Err(arity(name, "1", args.len())),
        },
        "int" => match args {
            [Value::Integer(n)] => Ok(Value::Integer(*n)),
            [Value::Float(f)] if f.is_finite() => Ok(Value::Integer(f.trunc() as i64)),
            [Value::Boolean(b)] => Ok(Value::Integer(i64::from(*b))),
            [Value::String(s)] => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| EvalError::Type(format!("int() cannot parse {s:?}"))),
            [other] => Err(EvalError::Type(format!(
                "int() of {}",
                other.type_name()
            ))),
            _ => Err(arity(name, "1", args.len())),
        },
        "float" => match args {
            [Value::Boolean(b)] => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
            [Value::String(s)] => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| EvalError::Type(format!("float() cannot parse {s:?}"))),
            [v] => v
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| EvalError::Type(format!("float() of {}", v.type_name()))),
            _ => Err(arity(name, "1", args.len())),
        },
        "str" => match args {
            [v] => Ok(Value::String(v.to_string())),
            _ => Err(arity(name, "1", args.len())),
        },
        "bool" => match args {
            [v] => Ok(Value::Boolean(v.is_truthy())),
            _ => Err(arity(name, "1", args.len())),
        },
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}
