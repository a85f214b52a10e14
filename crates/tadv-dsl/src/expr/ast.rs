use tadv_core::Value;

/// A parsed story expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant.
    Literal(Value),
    /// A name with optional dotted fields: `player.energy`.
    Path(Vec<String>),
    /// Field access on a computed value: `var('stats').energy`.
    Attr {
        /// Value the field is read from.
        target: Box<Expr>,
        /// Field name.
        name: String,
    },
    /// Subscript: `items[0]`, `player.relationships['Coach']`.
    Index {
        /// List, string, or map being indexed.
        target: Box<Expr>,
        /// Position or key.
        index: Box<Expr>,
    },
    /// A whitelisted function call: `has_completed('intro')`.
    Call {
        /// Builtin name.
        name: String,
        /// Arguments in call order.
        args: Vec<Expr>,
    },
    /// A list literal.
    List(Vec<Expr>),
    /// `-x` or `not x`.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        expr: Box<Expr>,
    },
    /// Arithmetic.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// A comparison chain: `a < b <= c` means `a < b and b <= c`.
    Compare {
        /// Leftmost operand.
        first: Box<Expr>,
        /// Each operator with the operand to its right.
        rest: Vec<(CmpOp, Expr)>,
    },
    /// Short-circuit `and`, yielding the deciding operand.
    And(Box<Expr>, Box<Expr>),
    /// Short-circuit `or`, yielding the deciding operand.
    Or(Box<Expr>, Box<Expr>),
    /// `expr`, or `fallback` when it evaluates to null.
    Coalesce {
        /// Expression tried first.
        expr: Box<Expr>,
        /// Value used when `expr` is null.
        fallback: Value,
    },
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `not` / `!`
    Not,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`, also joins strings and lists.
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`, always a float.
    Div,
    /// `//`, rounds toward negative infinity.
    FloorDiv,
    /// `%`, takes the sign of the divisor.
    Rem,
}

/// Comparison operators. They chain: `a < b < c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `in`: list element, substring, or map key.
    In,
    /// `not in`
    NotIn,
    /// `is`: same kind and value, with no numeric promotion.
    Is,
    /// `is not`
    IsNot,
}

impl CmpOp {
    /// Equality and ordering operators, as opposed to membership and identity.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            CmpOp::Eq | CmpOp::NotEq | CmpOp::Lt | CmpOp::LtEq | CmpOp::Gt | CmpOp::GtEq
        )
    }
}

impl Expr {
    fn is_number_literal(&self) -> bool {
        match self {
            Expr::Literal(v) => v.is_number(),
            Expr::Unary {
                op: UnaryOp::Neg,
                expr,
            } => expr.is_number_literal(),
            _ => false,
        }
    }

    /// Rewrite every name compared against a number so that a null value
    /// reads as `0`.
    ///
    /// `energy > 50` becomes `(energy ?? 0) > 50`, so a missing stat
    /// compares as zero instead of failing.
    pub fn coalesce_numeric_comparisons(self) -> Expr {
        match self {
            Expr::Compare { first, rest } => {
                let first = first.coalesce_numeric_comparisons();
                let (ops, others): (Vec<CmpOp>, Vec<Expr>) = rest
                    .into_iter()
                    .map(|(op, e)| (op, e.coalesce_numeric_comparisons()))
                    .unzip();

                let mut operands = Vec::with_capacity(others.len() + 1);
                operands.push(first);
                operands.extend(others);

                let wrap: Vec<bool> = (0..operands.len())
                    .map(|i| {
                        let left = i > 0
                            && ops[i - 1].is_numeric()
                            && operands[i - 1].is_number_literal();
                        let right = i < ops.len()
                            && ops[i].is_numeric()
                            && operands[i + 1].is_number_literal();
                        matches!(operands[i], Expr::Path(_)) && (left || right)
                    })
                    .collect();

                let mut operands = operands
                    .into_iter()
                    .zip(wrap)
                    .map(|(e, wrap)| {
                        if wrap {
                            Expr::Coalesce {
                                expr: Box::new(e),
                                fallback: Value::Integer(0),
                            }
                        } else {
                            e
                        }
                    });
                let first = operands.next().unwrap_or(Expr::Literal(Value::Null));
                Expr::Compare {
                    first: Box::new(first),
                    rest: ops.into_iter().zip(operands).collect(),
                }
            }
            Expr::Attr { target, name } => Expr::Attr {
                target: Box::new(target.coalesce_numeric_comparisons()),
                name,
            },
            Expr::Index { target, index } => Expr::Index {
                target: Box::new(target.coalesce_numeric_comparisons()),
                index: Box::new(index.coalesce_numeric_comparisons()),
            },
            Expr::Call { name, args } => Expr::Call {
                name,
                args: args
                    .into_iter()
                    .map(Expr::coalesce_numeric_comparisons)
                    .collect(),
            },
            Expr::List(items) => Expr::List(
                items
                    .into_iter()
                    .map(Expr::coalesce_numeric_comparisons)
                    .collect(),
            ),
            Expr::Unary { op, expr } => Expr::Unary {
                op,
                expr: Box::new(expr.coalesce_numeric_comparisons()),
            },
            Expr::Binary { op, lhs, rhs } => Expr::Binary {
                op,
                lhs: Box::new(lhs.coalesce_numeric_comparisons()),
                rhs: Box::new(rhs.coalesce_numeric_comparisons()),
            },
            Expr::And(a, b) => Expr::And(
                Box::new(a.coalesce_numeric_comparisons()),
                Box::new(b.coalesce_numeric_comparisons()),
            ),
            Expr::Or(a, b) => Expr::Or(
                Box::new(a.coalesce_numeric_comparisons()),
                Box::new(b.coalesce_numeric_comparisons()),
            ),
            Expr::Coalesce { expr, fallback } => Expr::Coalesce {
                expr: Box::new(expr.coalesce_numeric_comparisons()),
                fallback,
            },
            leaf @ (Expr::Literal(_) | Expr::Path(_)) => leaf,
        }
    }
}
