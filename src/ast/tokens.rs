use std::fmt;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Field name, possibly dotted
    ///
    /// # Examples
    /// ```text
    /// amount
    /// location.country
    /// user.age
    /// ```
    Ident,

    /// Run of digits and dots
    ///
    /// # Examples
    /// ```text
    /// 10000
    /// 0.5
    /// ```
    Number,

    /// Single-quoted string literal; the token text holds the unescaped contents
    ///
    /// # Examples
    /// ```text
    /// 'RUB'
    /// 'O\'Hara'
    /// ```
    String,

    /// Comparison operator: `>`, `>=`, `<`, `<=`, `=`, `!=`
    Op,

    /// Logical AND (any case in source, uppercased in the token text)
    And,

    /// Logical OR
    Or,

    /// Logical NOT
    Not,

    /// Left parenthesis
    LParen,

    /// Right parenthesis
    RParen,

    /// End of input
    Eof,

    /// Character the language does not know about
    Unknown,

    /// String literal with no closing quote; the token text runs to end of input
    UnterminatedString,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Ident => "IDENT",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Op => "OP",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::Eof => "EOF",
            TokenKind::Unknown => "UNKNOWN",
            TokenKind::UnterminatedString => "UNTERMINATED_STRING",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A token together with its text and the character offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} {:?}", self.kind, self.position, self.text)
    }
}
