use std::fmt;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal (`=`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,
}

impl CompareOp {
    /// Maps operator text from an `OP` token.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(CompareOp::Equal),
            "!=" => Some(CompareOp::NotEqual),
            "<" => Some(CompareOp::LessThan),
            ">" => Some(CompareOp::GreaterThan),
            "<=" => Some(CompareOp::LessEqual),
            ">=" => Some(CompareOp::GreaterEqual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "!=",
            CompareOp::LessThan => "<",
            CompareOp::GreaterThan => ">",
            CompareOp::LessEqual => "<=",
            CompareOp::GreaterEqual => ">=",
        }
    }

    /// True for `<`, `>`, `<=`, `>=`; these are only legal on numeric fields.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, CompareOp::Equal | CompareOp::NotEqual)
    }

    /// Applies the operator to two floats. Equality is exact.
    pub fn apply_f64(&self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Equal => left == right,
            CompareOp::NotEqual => left != right,
            CompareOp::LessThan => left < right,
            CompareOp::GreaterThan => left > right,
            CompareOp::LessEqual => left <= right,
            CompareOp::GreaterEqual => left >= right,
        }
    }

    /// Applies an equality operator to two strings; ordering operators yield `None`.
    pub fn apply_str(&self, left: &str, right: &str) -> Option<bool> {
        match self {
            CompareOp::Equal => Some(left == right),
            CompareOp::NotEqual => Some(left != right),
            _ => None,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
