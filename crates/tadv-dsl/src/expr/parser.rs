use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use tadv_core::Value;

use super::ast::{BinaryOp, CmpOp, Expr, UnaryOp};
use super::lexer::{self, Token};

type Span = SimpleSpan;

/// Parse or lex error with source span.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Byte range in the expression source.
    pub span: std::ops::Range<usize>,
    /// What was expected or found.
    pub message: String,
}

enum Postfix {
    Field(String),
    Index(Expr),
}

/// Build the expression parser.
///
/// Precedence, loosest first: `or`, `and`, `not`, comparison chains,
/// `+ -`, `* / // %`, unary minus, then field access, subscripts, and atoms.
fn expr_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    recursive(|expr| {
        let literal = select! {
            Token::Int(n) => Expr::Literal(Value::Integer(n)),
            Token::Float(f) => Expr::Literal(Value::Float(f)),
            Token::Str(s) => Expr::Literal(Value::String(s)),
            Token::True => Expr::Literal(Value::Boolean(true)),
            Token::False => Expr::Literal(Value::Boolean(false)),
            Token::Null => Expr::Literal(Value::Null),
        }
        .labelled("literal");
        let ident = select! { Token::Ident(name) => name }.labelled("name");

        let items = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<Expr>>();

        let call = ident
            .then(
                items
                    .clone()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map(|(name, args)| Expr::Call { name, args })
            .labelled("function call");
        let name = ident.map(|n| Expr::Path(vec![n]));
        let list = items
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Expr::List);
        let parens = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((literal, call, name, list, parens));

        let postfix = choice((
            just(Token::Dot).ignore_then(ident).map(Postfix::Field),
            expr.clone()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map(Postfix::Index),
        ));
        let access = atom
            .foldl(postfix.repeated(), |target, op| match (target, op) {
                (Expr::Path(mut segments), Postfix::Field(field)) => {
                    segments.push(field);
                    Expr::Path(segments)
                }
                (target, Postfix::Field(name)) => Expr::Attr {
                    target: Box::new(target),
                    name,
                },
                (target, Postfix::Index(index)) => Expr::Index {
                    target: Box::new(target),
                    index: Box::new(index),
                },
            })
            .boxed();

        let unary = just(Token::Minus)
            .to(UnaryOp::Neg)
            .repeated()
            .foldr(access, |op, expr| Expr::Unary {
                op,
                expr: Box::new(expr),
            });

        let binary = |op: BinaryOp, lhs: Expr, rhs: Expr| Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };

        let product_op = choice((
            just(Token::Star).to(BinaryOp::Mul),
            just(Token::SlashSlash).to(BinaryOp::FloorDiv),
            just(Token::Slash).to(BinaryOp::Div),
            just(Token::Percent).to(BinaryOp::Rem),
        ));
        let product = unary
            .clone()
            .foldl(product_op.then(unary).repeated(), move |lhs, (op, rhs)| {
                binary(op, lhs, rhs)
            });

        let sum_op = choice((
            just(Token::Plus).to(BinaryOp::Add),
            just(Token::Minus).to(BinaryOp::Sub),
        ));
        let sum = product
            .clone()
            .foldl(sum_op.then(product).repeated(), move |lhs, (op, rhs)| {
                binary(op, lhs, rhs)
            })
            .boxed();

        let cmp_op = choice((
            just(Token::EqEq).to(CmpOp::Eq),
            just(Token::NotEq).to(CmpOp::NotEq),
            just(Token::LtEq).to(CmpOp::LtEq),
            just(Token::GtEq).to(CmpOp::GtEq),
            just(Token::Lt).to(CmpOp::Lt),
            just(Token::Gt).to(CmpOp::Gt),
            just(Token::Not).then(just(Token::In)).to(CmpOp::NotIn),
            just(Token::In).to(CmpOp::In),
            just(Token::Is).then(just(Token::Not)).to(CmpOp::IsNot),
            just(Token::Is).to(CmpOp::Is),
        ));
        let comparison = sum
            .clone()
            .then(cmp_op.then(sum).repeated().collect::<Vec<_>>())
            .map(|(first, rest)| {
                if rest.is_empty() {
                    first
                } else {
                    Expr::Compare {
                        first: Box::new(first),
                        rest,
                    }
                }
            });

        let negation = choice((just(Token::Not), just(Token::Bang)))
            .to(UnaryOp::Not)
            .repeated()
            .foldr(comparison, |op, expr| Expr::Unary {
                op,
                expr: Box::new(expr),
            })
            .boxed();

        let conjunction = negation.clone().foldl(
            choice((just(Token::And), just(Token::AndAnd)))
                .ignore_then(negation)
                .repeated(),
            |lhs, rhs| Expr::And(Box::new(lhs), Box::new(rhs)),
        );

        conjunction.clone().foldl(
            choice((just(Token::Or), just(Token::OrOr)))
                .ignore_then(conjunction)
                .repeated(),
            |lhs, rhs| Expr::Or(Box::new(lhs), Box::new(rhs)),
        )
    })
}

/// Parse an expression string.
pub fn parse_expr(source: &str) -> Result<Expr, Vec<ParseError>> {
    let (tokens, lex_errors) = lexer::lex(source);
    if !lex_errors.is_empty() {
        return Err(lex_errors
            .into_iter()
            .map(|e| ParseError {
                span: e.span,
                message: e.message,
            })
            .collect());
    }

    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));

    let len = source.len();
    let eoi: Span = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = expr_parser()
        .then_ignore(end())
        .parse(stream)
        .into_output_errors();

    if let Some(expr) = output
        && errors.is_empty()
    {
        return Ok(expr);
    }

    Err(errors
        .into_iter()
        .map(|e| ParseError {
            span: e.span().into_range(),
            message: e.to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Expr {
        Expr::Path(segments.iter().map(|s| s.to_string()).collect())
    }

    fn int(n: i64) -> Expr {
        Expr::Literal(Value::Integer(n))
    }

    #[test]
    fn parse_dotted_comparison() {
        let expr = parse_expr("player.energy > 50").unwrap();
        assert_eq!(
            expr,
            Expr::Compare {
                first: Box::new(path(&["player", "energy"])),
                rest: vec![(CmpOp::Gt, int(50))],
            }
        );
    }

    #[test]
    fn arithmetic_precedence() {
        let expr = parse_expr("1 + 2 * 3").unwrap();
        let Expr::Binary { op, rhs, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn boolean_precedence() {
        // not binds looser than comparison, and binds tighter than or
        let expr = parse_expr("not a == 1 or b and c").unwrap();
        let Expr::Or(lhs, rhs) = expr else {
            panic!("expected or");
        };
        assert!(matches!(*lhs, Expr::Unary { op: UnaryOp::Not, .. }));
        assert!(matches!(*rhs, Expr::And(_, _)));
    }

    #[test]
    fn chained_comparison() {
        let expr = parse_expr("0 < x <= 10").unwrap();
        let Expr::Compare { rest, .. } = expr else {
            panic!("expected comparison");
        };
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[1].0, CmpOp::LtEq);
    }

    #[test]
    fn membership_and_identity() {
        let expr = parse_expr("'rope' not in player.inventory").unwrap();
        assert!(matches!(expr, Expr::Compare { ref rest, .. } if rest[0].0 == CmpOp::NotIn));
        let expr = parse_expr("var('x') is not None").unwrap();
        assert!(matches!(expr, Expr::Compare { ref rest, .. } if rest[0].0 == CmpOp::IsNot));
    }

    #[test]
    fn calls_and_postfix() {
        let expr = parse_expr("var('stats')['energy']").unwrap();
        assert!(matches!(expr, Expr::Index { .. }));
        let expr = parse_expr("has_completed('intro')").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                name: "has_completed".into(),
                args: vec![Expr::Literal(Value::from("intro"))],
            }
        );
        let expr = parse_expr("max(1, 2,)").unwrap();
        assert!(matches!(expr, Expr::Call { ref args, .. } if args.len() == 2));
    }

    #[test]
    fn unary_minus_and_lists() {
        let expr = parse_expr("-x * 2").unwrap();
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Mul, .. }));
        let expr = parse_expr("time_of_day in ['evening', 'night']").unwrap();
        let Expr::Compare { rest, .. } = expr else {
            panic!("expected comparison");
        };
        assert!(matches!(&rest[0].1, Expr::List(items) if items.len() == 2));
    }

    #[test]
    fn c_style_operators() {
        let expr = parse_expr("!done && (a || b)").unwrap();
        assert!(matches!(expr, Expr::And(_, _)));
    }

    #[test]
    fn errors_are_reported() {
        assert!(parse_expr("energy >").is_err());
        assert!(parse_expr("(a").is_err());
        assert!(parse_expr("a b").is_err());
        assert!(parse_expr("").is_err());
        let errors = parse_expr("a $ b").unwrap_err();
        assert_eq!(errors[0].span, 2..3);
    }

    #[test]
    fn coalescing_wraps_names_next_to_numbers() {
        let expr = parse_expr("energy > 50 and player.mood == 'ok'")
            .unwrap()
            .coalesce_numeric_comparisons();
        let Expr::And(lhs, rhs) = expr else {
            panic!("expected and");
        };
        let Expr::Compare { first, .. } = *lhs else {
            panic!("expected comparison");
        };
        assert!(matches!(*first, Expr::Coalesce { .. }));
        // String comparisons are left alone
        let Expr::Compare { first, .. } = *rhs else {
            panic!("expected comparison");
        };
        assert_eq!(*first, path(&["player", "mood"]));
    }

    #[test]
    fn coalescing_handles_number_on_left() {
        let expr = parse_expr("-5 < player.stress")
            .unwrap()
            .coalesce_numeric_comparisons();
        let Expr::Compare { rest, .. } = expr else {
            panic!("expected comparison");
        };
        assert!(matches!(rest[0].1, Expr::Coalesce { .. }));
    }
}
