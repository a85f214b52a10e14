use logos::Logos;
use std::fmt;

/// Token type for story expressions.
///
/// Word operators (`and`, `not`, `in`, ...) and the literal keywords are
/// recognized when identifiers are converted, so `inventory` never lexes as
/// `in` followed by `ventory`.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `==`
    EqEq,
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
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `//`
    SlashSlash,
    /// `%`
    Percent,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `in`
    In,
    /// `is`
    Is,
    /// `True` or `true`
    True,
    /// `False` or `false`
    False,
    /// `null`, `None` or `none`
    Null,
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal, quotes removed and escapes applied.
    Str(String),
    /// A name that is not a keyword.
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::SlashSlash => write!(f, "//"),
            Token::Percent => write!(f, "%"),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Bang => write!(f, "!"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::In => write!(f, "in"),
            Token::Is => write!(f, "is"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Ident(w) => write!(f, "{w}"),
        }
    }
}

#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("//")]
    SlashSlash,
    #[token("%")]
    Percent,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*")]
    Float,

    #[regex(r"[0-9][0-9_]*")]
    Int,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    DoubleQuoted,

    #[regex(r#"'([^'\\\n]|\\.)*'"#)]
    SingleQuoted,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
}

/// A lexer error with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    /// Byte range of the erroneous input in the source.
    pub span: std::ops::Range<usize>,
    /// Human-readable description of the lexer error.
    pub message: String,
}

/// Lex an expression into `(Token, Span)` pairs.
///
/// Lexing continues past errors so every bad character is reported.
pub fn lex(source: &str) -> (Vec<(Token, std::ops::Range<usize>)>, Vec<LexError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let Ok(raw) = result else {
            errors.push(LexError {
                span: span.clone(),
                message: format!("unexpected character: {:?}", &source[span]),
            });
            continue;
        };
        let token = match raw {
            RawToken::LParen => Token::LParen,
            RawToken::RParen => Token::RParen,
            RawToken::LBracket => Token::LBracket,
            RawToken::RBracket => Token::RBracket,
            RawToken::Comma => Token::Comma,
            RawToken::Dot => Token::Dot,
            RawToken::EqEq => Token::EqEq,
            RawToken::NotEq => Token::NotEq,
            RawToken::Lt => Token::Lt,
            RawToken::LtEq => Token::LtEq,
            RawToken::Gt => Token::Gt,
            RawToken::GtEq => Token::GtEq,
            RawToken::Plus => Token::Plus,
            RawToken::Minus => Token::Minus,
            RawToken::Star => Token::Star,
            RawToken::Slash => Token::Slash,
            RawToken::SlashSlash => Token::SlashSlash,
            RawToken::Percent => Token::Percent,
            RawToken::AndAnd => Token::AndAnd,
            RawToken::OrOr => Token::OrOr,
            RawToken::Bang => Token::Bang,
            RawToken::Float => match lexer.slice().replace('_', "").parse::<f64>() {
                Ok(n) => Token::Float(n),
                Err(_) => {
                    errors.push(LexError {
                        span,
                        message: format!("invalid float literal: {}", lexer.slice()),
                    });
                    continue;
                }
            },
            RawToken::Int => match lexer.slice().replace('_', "").parse::<i64>() {
                Ok(n) => Token::Int(n),
                Err(_) => {
                    errors.push(LexError {
                        span,
                        message: format!("integer literal out of range: {}", lexer.slice()),
                    });
                    continue;
                }
            },
            RawToken::DoubleQuoted | RawToken::SingleQuoted => {
                let slice = lexer.slice();
                Token::Str(unescape(&slice[1..slice.len() - 1]))
            }
            RawToken::Ident => keyword(lexer.slice()),
        };
        tokens.push((token, span));
    }

    (tokens, errors)
}

fn keyword(word: &str) -> Token {
    match word {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "in" => Token::In,
        "is" => Token::Is,
        "true" | "True" => Token::True,
        "false" | "False" => Token::False,
        "null" | "None" | "none" => Token::Null,
        _ => Token::Ident(word.to_string()),
    }
}

/// Process escape sequences in a string literal.
///
/// Supports `\\`, `\n`, `\t`, `\"`, `\'`. Unknown sequences are kept as-is.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let (tokens, errors) = lex(source);
        assert!(errors.is_empty(), "errors: {errors:?}");
        tokens.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn lex_comparison() {
        assert_eq!(
            tokens("player.energy >= 50"),
            vec![
                Token::Ident("player".into()),
                Token::Dot,
                Token::Ident("energy".into()),
                Token::GtEq,
                Token::Int(50),
            ]
        );
    }

    #[test]
    fn lex_word_operators() {
        assert_eq!(
            tokens("not done and x in items or None"),
            vec![
                Token::Not,
                Token::Ident("done".into()),
                Token::And,
                Token::Ident("x".into()),
                Token::In,
                Token::Ident("items".into()),
                Token::Or,
                Token::Null,
            ]
        );
    }

    #[test]
    fn identifiers_containing_keywords() {
        assert_eq!(
            tokens("inventory island"),
            vec![
                Token::Ident("inventory".into()),
                Token::Ident("island".into())
            ]
        );
    }

    #[test]
    fn lex_strings_both_quotes() {
        assert_eq!(
            tokens(r#"var('met') == "it's""#),
            vec![
                Token::Ident("var".into()),
                Token::LParen,
                Token::Str("met".into()),
                Token::RParen,
                Token::EqEq,
                Token::Str("it's".into()),
            ]
        );
    }

    #[test]
    fn lex_numbers_and_floor_division() {
        assert_eq!(
            tokens("7.5 // 2_000"),
            vec![Token::Float(7.5), Token::SlashSlash, Token::Int(2000)]
        );
    }

    #[test]
    fn lex_error_keeps_going() {
        let (tokens, errors) = lex("a $ b");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span, 2..3);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn lex_preserves_spans() {
        let (tokens, _) = lex("day > 3");
        assert_eq!(tokens[0].1, 0..3);
        assert_eq!(tokens[1].1, 4..5);
        assert_eq!(tokens[2].1, 6..7);
    }

    #[test]
    fn unescape_sequences() {
        assert_eq!(unescape(r"a\nb\tc\\d\'e"), "a\nb\tc\\d'e");
        assert_eq!(unescape(r"\x"), "\\x");
    }
}
