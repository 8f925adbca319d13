use crate::ast::{Token, TokenKind};

const KEYWORDS: [(&str, TokenKind); 3] = [
    ("AND", TokenKind::And),
    ("OR", TokenKind::Or),
    ("NOT", TokenKind::Not),
];

/// Converts REL source text into positioned tokens.
///
/// Lexing never fails: characters the language does not know become
/// `UNKNOWN` tokens and a string with no closing quote becomes an
/// `UNTERMINATED_STRING` token, leaving the parser to report them.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    finished: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            finished: false,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.input[start..end].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.slice(start, self.position);
        let upper = text.to_uppercase();
        match KEYWORDS.iter().find(|(keyword, _)| *keyword == upper) {
            Some((keyword, kind)) => Token::new(*kind, *keyword, start),
            None => Token::new(TokenKind::Ident, text, start),
        }
    }

    fn read_string(&mut self) -> Token {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '\'' => {
                    self.advance();
                    return Token::new(TokenKind::String, result, start);
                }
                '\\' => match self.peek_char(1) {
                    Some(escaped @ ('\'' | '\\')) => {
                        result.push(escaped);
                        self.advance();
                        self.advance();
                    }
                    // Not an escape: keep the backslash as written
                    _ => {
                        result.push('\\');
                        self.advance();
                    }
                },
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Token::new(
            TokenKind::UnterminatedString,
            self.slice(start, self.input.len()),
            start,
        )
    }

    fn read_number(&mut self) -> Token {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() || ch == '.' {
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number, self.slice(start, self.position), start)
    }

    fn single(&mut self, kind: TokenKind, ch: char) -> Token {
        let token = Token::new(kind, ch.to_string(), self.position);
        self.advance();
        token
    }

    fn operator(&mut self) -> Option<Token> {
        let start = self.position;
        let first = self.current_char()?;
        let second = self.peek_char(1);

        let text = match (first, second) {
            ('>' | '<' | '!', Some('=')) => {
                self.advance();
                self.advance();
                format!("{}=", first)
            }
            ('>' | '<' | '=', _) => {
                self.advance();
                first.to_string()
            }
            _ => return None,
        };
        Some(Token::new(TokenKind::Op, text, start))
    }

    /// Returns the next token. After the single `EOF` token has been produced,
    /// further calls keep returning `EOF`.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let ch = match self.current_char() {
            None => {
                self.finished = true;
                return Token::new(TokenKind::Eof, "", self.input.len());
            }
            Some(ch) => ch,
        };

        if let Some(token) = self.operator() {
            return token;
        }

        match ch {
            '(' => self.single(TokenKind::LParen, ch),
            ')' => self.single(TokenKind::RParen, ch),
            '\'' => self.read_string(),
            c if c.is_ascii_digit() => self.read_number(),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c => self.single(TokenKind::Unknown, c),
        }
    }

    /// Consumes the whole input. The result always ends with exactly one `EOF`
    /// token positioned at the input length.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while !self.finished {
            tokens.push(self.next_token());
        }
        tokens
    }
}

/// Tokenizes `source` in one call.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and Or NOT");
    assert_eq!(lexer.next_token(), Token::new(TokenKind::And, "AND", 0));
    assert_eq!(lexer.next_token(), Token::new(TokenKind::Or, "OR", 4));
    assert_eq!(lexer.next_token(), Token::new(TokenKind::Not, "NOT", 7));
    assert_eq!(lexer.next_token(), Token::new(TokenKind::Eof, "", 10));
}

#[test]
fn test_comparison() {
    let mut lexer = Lexer::new("amount >= 5");
    assert_eq!(lexer.next_token(), Token::new(TokenKind::Ident, "amount", 0));
    assert_eq!(lexer.next_token(), Token::new(TokenKind::Op, ">=", 7));
    assert_eq!(lexer.next_token(), Token::new(TokenKind::Number, "5", 10));
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}
