use thiserror::Error;

use crate::{
    ast::{CompareOp, Expr, Literal, Operand, Token, TokenKind},
    diagnostic::{self, Diagnostic, DiagnosticCode},
    lexer::tokenize,
};

/// Maximum nesting of parentheses and `NOT` before parsing gives up.
pub const MAX_DEPTH: usize = 64;

/// Grammar violation, anchored at the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position} near '{near}'")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
    pub near: String,
}

impl From<ParseError> for Diagnostic {
    fn from(e: ParseError) -> Self {
        Diagnostic {
            code: DiagnosticCode::ParseError,
            message: e.message,
            position: e.position,
            near: e.near,
        }
    }
}

/// Recursive-descent parser for REL.
///
/// ```text
/// expr       := orExpr
/// orExpr     := andExpr (OR andExpr)*
/// andExpr    := unary (AND unary)*
/// unary      := NOT unary | primary
/// primary    := '(' expr ')' | comparison
/// comparison := operand OP operand
/// operand    := IDENT | NUMBER | STRING
/// ```
pub struct Parser<'a> {
    tokens: Vec<Token>,
    source: &'a str,
    index: usize,
    depth: usize,
    eof: Token,
}

impl<'a> Parser<'a> {
    /// `source` is the text the tokens were produced from; it is only used
    /// for `near` excerpts in errors.
    pub fn new(tokens: Vec<Token>, source: &'a str) -> Self {
        let eof = Token::new(TokenKind::Eof, "", source.chars().count());
        Parser {
            tokens,
            source,
            index: 0,
            depth: 0,
            eof,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.index).unwrap_or(&self.eof)
    }

    fn advance(&mut self) {
        if self.index < self.tokens.len() {
            self.index += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    fn error(&self, message: impl Into<String>, position: usize) -> ParseError {
        ParseError {
            message: message.into(),
            position,
            near: diagnostic::near(self.source, position),
        }
    }

    fn descend(&mut self, position: usize) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("Expression nested too deeply", position));
        }
        Ok(())
    }

    /// Parses the whole token stream; leftover tokens are an error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        if !self.check(TokenKind::Eof) {
            let token = self.current();
            return Err(self.error(
                format!("Unexpected token '{}'", token.text),
                token.position,
            ));
        }
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;

        while self.check(TokenKind::Or) {
            let position = self.current().position;
            self.advance();
            let right = self.parse_and()?;

            left = Expr::Or {
                left: Box::new(left),
                right: Box::new(right),
                position,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        while self.check(TokenKind::And) {
            let position = self.current().position;
            self.advance();
            let right = self.parse_unary()?;

            left = Expr::And {
                left: Box::new(left),
                right: Box::new(right),
                position,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::Not) {
            let position = self.current().position;
            self.advance();
            self.descend(position)?;
            let expr = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not {
                expr: Box::new(expr),
                position,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::LParen) {
            let open = self.current().position;
            self.advance();
            self.descend(open)?;
            let expr = self.parse_expression()?;
            self.depth -= 1;
            if !self.check(TokenKind::RParen) {
                return Err(self.error("Missing ')'", open));
            }
            self.advance();
            return Ok(expr);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_operand()?;

        let token = self.current();
        let op = match token.kind {
            TokenKind::Op => CompareOp::from_symbol(&token.text),
            _ => None,
        };
        let Some(op) = op else {
            return Err(self.error("Expected comparison operator", token.position));
        };
        let position = token.position;
        self.advance();

        let right = self.parse_operand()?;
        Ok(Expr::Compare {
            op,
            left,
            right,
            position,
        })
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        let token = self.current();
        let position = token.position;

        let operand = match token.kind {
            TokenKind::Ident => Operand::Field {
                name: token.text.clone(),
                position,
            },
            TokenKind::Number => match token.text.parse::<f64>() {
                Ok(n) if n.is_finite() => Operand::Literal {
                    value: Literal::Number(n),
                    position,
                },
                _ => {
                    return Err(self.error(format!("Invalid number '{}'", token.text), position));
                }
            },
            TokenKind::String => Operand::Literal {
                value: Literal::Text(token.text.clone()),
                position,
            },
            TokenKind::UnterminatedString => {
                return Err(self.error("Unterminated string literal", position));
            }
            TokenKind::Unknown => {
                return Err(self.error(format!("Unexpected character '{}'", token.text), position));
            }
            TokenKind::Eof => {
                return Err(self.error("Unexpected end of expression, expected operand", position));
            }
            kind => {
                return Err(self.error(format!("Expected operand, got {}", kind), position));
            }
        };

        self.advance();
        Ok(operand)
    }
}

/// Tokenizes and parses `source` in one call.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    Parser::new(tokenize(source), source).parse()
}
