//! Tokenizer for filter expressions

use super::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    LParen,
    RParen,
    Cmp(CmpOp),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "column '{}'", name),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Str(s) => write!(f, "string '{}'", s),
            Token::True => f.write_str("true"),
            Token::False => f.write_str("false"),
            Token::Null => f.write_str("null"),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::Not => f.write_str("not"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Cmp(op) => write!(f, "'{}'", op),
        }
    }
}

/// Token with its byte offset in the source expression
pub type Spanned = (usize, Token);

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, FilterError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '(' => {
                chars.next();
                Token::LParen
            }
            ')' => {
                chars.next();
                Token::RParen
            }
            '=' | '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = chars.next_if(|&(_, n)| n == '=').is_some();
                match (c, followed_by_eq) {
                    ('=', true) => Token::Cmp(CmpOp::Eq),
                    ('!', true) => Token::Cmp(CmpOp::Ne),
                    ('<', true) => Token::Cmp(CmpOp::Le),
                    ('>', true) => Token::Cmp(CmpOp::Ge),
                    ('<', false) => Token::Cmp(CmpOp::Lt),
                    ('>', false) => Token::Cmp(CmpOp::Gt),
                    ('!', false) => Token::Not,
                    _ => {
                        return Err(FilterError::Syntax {
                            position: pos,
                            message: "use '==' for equality".to_string(),
                        })
                    }
                }
            }
            '&' | '|' => {
                chars.next();
                // `&&` and `&` are both accepted
                chars.next_if(|&(_, n)| n == c);
                if c == '&' {
                    Token::And
                } else {
                    Token::Or
                }
            }
            '\'' | '"' => {
                chars.next();
                Token::Str(read_quoted(&mut chars, c, pos)?)
            }
            '`' => {
                chars.next();
                Token::Ident(read_quoted(&mut chars, '`', pos)?)
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&(_, n)) = chars.peek() {
                    let exponent_sign =
                        (n == '-' || n == '+') && text.ends_with(|ch: char| ch == 'e' || ch == 'E');
                    if n.is_ascii_digit() || n == '.' || n == 'e' || n == 'E' || exponent_sign {
                        text.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                parse_number(&text, pos)?
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some((_, n)) = chars.next_if(|&(_, n)| n.is_alphanumeric() || n == '_' || n == '.') {
                    word.push(n);
                }
                keyword_or_ident(word)
            }
            other => {
                return Err(FilterError::Syntax {
                    position: pos,
                    message: format!("unexpected character '{}'", other),
                })
            }
        };

        tokens.push((pos, token));
    }

    Ok(tokens)
}

fn read_quoted(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
    start: usize,
) -> Result<String, FilterError> {
    let mut text = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => text.push(escaped),
                None => break,
            },
            c if c == quote => return Ok(text),
            c => text.push(c),
        }
    }

    Err(FilterError::Syntax {
        position: start,
        message: format!("unterminated {} quote", quote),
    })
}

fn parse_number(text: &str, position: usize) -> Result<Token, FilterError> {
    text.parse::<f64>()
        .map(Token::Number)
        .map_err(|_| FilterError::Syntax {
            position,
            message: format!("invalid number '{}'", text),
        })
}

fn keyword_or_ident(word: String) -> Token {
    match word.to_ascii_lowercase().as_str() {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "true" => Token::True,
        "false" => Token::False,
        "null" | "none" => Token::Null,
        _ => Token::Ident(word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(_, t)| t).collect()
    }

    #[test]
    fn test_comparison_with_keywords() {
        assert_eq!(
            kinds("Age > 30 and Gender == 'Male'"),
            vec![
                Token::Ident("Age".into()),
                Token::Cmp(CmpOp::Gt),
                Token::Number(30.0),
                Token::And,
                Token::Ident("Gender".into()),
                Token::Cmp(CmpOp::Eq),
                Token::Str("Male".into()),
            ]
        );
    }

    #[test]
    fn test_symbols_and_quoted_columns() {
        assert_eq!(
            kinds("!(`Full Name` != \"x\") || a<=-1.5e2 & b>=.5"),
            vec![
                Token::Not,
                Token::LParen,
                Token::Ident("Full Name".into()),
                Token::Cmp(CmpOp::Ne),
                Token::Str("x".into()),
                Token::RParen,
                Token::Or,
                Token::Ident("a".into()),
                Token::Cmp(CmpOp::Le),
                Token::Number(-150.0),
                Token::And,
                Token::Ident("b".into()),
                Token::Cmp(CmpOp::Ge),
                Token::Number(0.5),
            ]
        );
    }

    #[test]
    fn test_errors_carry_position() {
        assert!(matches!(
            tokenize("a = 1"),
            Err(FilterError::Syntax { position: 2, .. })
        ));
        assert!(matches!(
            tokenize("name == 'open"),
            Err(FilterError::Syntax { position: 8, .. })
        ));
        assert!(matches!(tokenize("a # b"), Err(FilterError::Syntax { .. })));
    }
}
