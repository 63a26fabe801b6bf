//! Recursive-descent parser producing the filter AST

use super::lexer::{tokenize, CmpOp, Spanned, Token};
use super::FilterError;

/// Deepest allowed nesting of parentheses and `not`
pub const MAX_DEPTH: usize = 64;

/// A literal value written in the expression
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(String),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Any clause holds; always two or more clauses
    Or(Vec<Expr>),
    /// Every clause holds; always two or more clauses
    And(Vec<Expr>),
    Not(Box<Expr>),
    Compare {
        left: Operand,
        op: CmpOp,
        right: Operand,
    },
    /// A bare operand used as a condition, e.g. a boolean column
    Truthy(Operand),
}

impl Expr {
    /// Column names referenced anywhere in the expression
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Or(clauses) | Expr::And(clauses) => {
                for clause in clauses {
                    clause.collect_columns(out);
                }
            }
            Expr::Not(inner) => inner.collect_columns(out),
            Expr::Compare { left, right, .. } => {
                out.extend(left.column());
                out.extend(right.column());
            }
            Expr::Truthy(operand) => out.extend(operand.column()),
        }
    }
}

impl Operand {
    fn column(&self) -> Option<&str> {
        match self {
            Operand::Column(name) => Some(name.as_str()),
            Operand::Literal(_) => None,
        }
    }
}

/// Parse a filter expression
pub fn parse(source: &str) -> Result<Expr, FilterError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(FilterError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        depth: 0,
    };
    let expr = parser.parse_or()?;

    match parser.peek() {
        None => Ok(expr),
        Some((position, token)) => Err(FilterError::Syntax {
            position,
            message: format!("unexpected {}", token),
        }),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<(usize, &Token)> {
        self.tokens.get(self.pos).map(|(p, t)| (*p, t))
    }

    fn next(&mut self) -> Result<(usize, Token), FilterError> {
        let item = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| FilterError::Syntax {
                position: self.end,
                message: "unexpected end of expression".to_string(),
            })?;
        self.pos += 1;
        Ok(item)
    }

    fn eat(&mut self, wanted: &Token) -> bool {
        if matches!(self.peek(), Some((_, t)) if t == wanted) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, FilterError> {
        let mut clauses = vec![self.parse_and()?];
        while self.eat(&Token::Or) {
            clauses.push(self.parse_and()?);
        }
        Ok(join(clauses, Expr::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, FilterError> {
        let mut clauses = vec![self.parse_unary()?];
        while self.eat(&Token::And) {
            clauses.push(self.parse_unary()?);
        }
        Ok(join(clauses, Expr::And))
    }

    fn parse_unary(&mut self) -> Result<Expr, FilterError> {
        if self.eat(&Token::Not) {
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, FilterError> {
        if self.eat(&Token::LParen) {
            self.descend()?;
            let inner = self.parse_or()?;
            self.depth -= 1;
            let (position, token) = self.next()?;
            if token != Token::RParen {
                return Err(FilterError::Syntax {
                    position,
                    message: format!("expected ')' but found {}", token),
                });
            }
            return Ok(inner);
        }

        let left = self.parse_operand()?;
        match self.peek() {
            Some((_, Token::Cmp(op))) => {
                let op = *op;
                self.pos += 1;
                let right = self.parse_operand()?;
                Ok(Expr::Compare { left, op, right })
            }
            _ => Ok(Expr::Truthy(left)),
        }
    }

    fn descend(&mut self) -> Result<(), FilterError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let position = self
                .pos
                .checked_sub(1)
                .and_then(|i| self.tokens.get(i))
                .map_or(self.end, |(p, _)| *p);
            return Err(FilterError::Syntax {
                position,
                message: "expression nested too deeply".to_string(),
            });
        }
        Ok(())
    }

    fn parse_operand(&mut self) -> Result<Operand, FilterError> {
        let (position, token) = self.next()?;
        Ok(match token {
            Token::Ident(name) => Operand::Column(name),
            Token::Number(n) => Operand::Literal(Literal::Number(n)),
            Token::Str(s) => Operand::Literal(Literal::Text(s)),
            Token::True => Operand::Literal(Literal::Bool(true)),
            Token::False => Operand::Literal(Literal::Bool(false)),
            Token::Null => Operand::Literal(Literal::Null),
            other => {
                return Err(FilterError::Syntax {
                    position,
                    message: format!("expected a column or value but found {}", other),
                })
            }
        })
    }
}

fn join(mut clauses: Vec<Expr>, wrap: fn(Vec<Expr>) -> Expr) -> Expr {
    if clauses.len() == 1 {
        clauses.remove(0)
    } else {
        wrap(clauses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Operand {
        Operand::Column(name.to_string())
    }

    #[test]
    fn test_precedence_and_binds_tighter_than_or() {
        let expr = parse("a == 1 or b == 2 and not c").unwrap();
        let expected = Expr::Or(vec![
            Expr::Compare {
                left: col("a"),
                op: CmpOp::Eq,
                right: Operand::Literal(Literal::Number(1.0)),
            },
            Expr::And(vec![
                Expr::Compare {
                    left: col("b"),
                    op: CmpOp::Eq,
                    right: Operand::Literal(Literal::Number(2.0)),
                },
                Expr::Not(Box::new(Expr::Truthy(col("c")))),
            ]),
        ]);
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parentheses_and_columns() {
        let expr = parse("(age >= 18 or guardian != null) and `Full Name` == 'x'").unwrap();
        assert_eq!(expr.columns(), vec!["age", "guardian", "Full Name"]);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(parse(""), Err(FilterError::Empty)));
        assert!(matches!(parse("   "), Err(FilterError::Empty)));
        assert!(matches!(parse("(a > 1"), Err(FilterError::Syntax { .. })));
        assert!(matches!(parse("a >"), Err(FilterError::Syntax { position: 3, .. })));
        assert!(matches!(parse("a > 1 b"), Err(FilterError::Syntax { position: 6, .. })));
        assert!(matches!(parse("and a"), Err(FilterError::Syntax { position: 0, .. })));
    }

    #[test]
    fn test_chains_are_flat() {
        let source = (0..50_000)
            .map(|i| format!("id == {}", i))
            .collect::<Vec<_>>()
            .join(" or ");
        match parse(&source).unwrap() {
            Expr::Or(clauses) => assert_eq!(clauses.len(), 50_000),
            other => panic!("expected a flat or-chain, got {:?}", other),
        }

        let expr = parse("a and b and c or d").unwrap();
        assert!(matches!(expr, Expr::Or(ref c) if c.len() == 2 && matches!(c[0], Expr::And(ref a) if a.len() == 3)));
    }

    #[test]
    fn test_nesting_limit() {
        let ok = format!("{}id == 1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(parse(&ok).is_ok());

        let deep = format!("{}id == 1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(
            parse(&deep),
            Err(FilterError::Syntax { position: 64, ref message }) if message == "expression nested too deeply"
        ));

        let nots = format!("{}id", "not ".repeat(MAX_DEPTH + 1));
        assert!(matches!(parse(&nots), Err(FilterError::Syntax { .. })));
    }
}
