use std::fmt;

use crate::ast::CompareOp;

/// Literal value on one side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Numeric literal, held as a 64-bit float
    ///
    /// # Example
    /// ```text
    /// 10000
    /// 0.25
    /// ```
    Number(f64),

    /// Single-quoted text literal
    ///
    /// # Example
    /// ```text
    /// 'RUB'
    /// ```
    Text(String),
}

/// One side of a comparison.
///
/// The grammar accepts a field or a literal on either side. Rules that pass
/// validation always have a field on the left and a literal on the right.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Reference to a catalog field, dotted names allowed
    ///
    /// # Examples
    /// ```text
    /// amount
    /// location.country
    /// user.age
    /// ```
    Field { name: String, position: usize },

    Literal { value: Literal, position: usize },
}

impl Operand {
    pub fn position(&self) -> usize {
        match self {
            Operand::Field { position, .. } | Operand::Literal { position, .. } => *position,
        }
    }

    pub fn field_name(&self) -> Option<&str> {
        match self {
            Operand::Field { name, .. } => Some(name),
            Operand::Literal { .. } => None,
        }
    }

    pub fn literal(&self) -> Option<&Literal> {
        match self {
            Operand::Literal { value, .. } => Some(value),
            Operand::Field { .. } => None,
        }
    }

    fn structurally_eq(&self, other: &Operand) -> bool {
        match (self, other) {
            (Operand::Field { name: a, .. }, Operand::Field { name: b, .. }) => a == b,
            (Operand::Literal { value: a, .. }, Operand::Literal { value: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// Abstract Syntax Tree node of a REL expression.
///
/// Built once by the parser and never mutated afterwards, so a tree can be
/// shared read-only between any number of evaluations.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Atomic comparison
    ///
    /// # Example
    /// ```text
    /// amount > 10000
    /// ```
    Compare {
        op: CompareOp,
        left: Operand,
        right: Operand,
        position: usize,
    },

    /// Logical negation (`NOT`)
    Not { expr: Box<Expr>, position: usize },

    /// Logical conjunction (`AND`)
    And {
        left: Box<Expr>,
        right: Box<Expr>,
        position: usize,
    },

    /// Logical disjunction (`OR`)
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
        position: usize,
    },
}

impl Expr {
    /// Offset of the token that defined this node: the operator of a
    /// comparison, or the keyword of a logical node.
    pub fn position(&self) -> usize {
        match self {
            Expr::Compare { position, .. }
            | Expr::Not { position, .. }
            | Expr::And { position, .. }
            | Expr::Or { position, .. } => *position,
        }
    }

    /// Compares two trees while ignoring source positions.
    pub fn structurally_eq(&self, other: &Expr) -> bool {
        match (self, other) {
            (
                Expr::Compare {
                    op: op_a,
                    left: left_a,
                    right: right_a,
                    ..
                },
                Expr::Compare {
                    op: op_b,
                    left: left_b,
                    right: right_b,
                    ..
                },
            ) => op_a == op_b && left_a.structurally_eq(left_b) && right_a.structurally_eq(right_b),
            (Expr::Not { expr: a, .. }, Expr::Not { expr: b, .. }) => a.structurally_eq(b),
            (
                Expr::And {
                    left: left_a,
                    right: right_a,
                    ..
                },
                Expr::And {
                    left: left_b,
                    right: right_b,
                    ..
                },
            )
            | (
                Expr::Or {
                    left: left_a,
                    right: right_a,
                    ..
                },
                Expr::Or {
                    left: left_b,
                    right: right_b,
                    ..
                },
            ) => left_a.structurally_eq(left_b) && right_a.structurally_eq(right_b),
            _ => false,
        }
    }

    /// Every comparison in the tree, in source order.
    pub fn comparisons(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        self.collect_comparisons(&mut out);
        out
    }

    fn collect_comparisons<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Expr::Compare { .. } => out.push(self),
            Expr::Not { expr, .. } => expr.collect_comparisons(out),
            Expr::And { left, right, .. } | Expr::Or { left, right, .. } => {
                left.collect_comparisons(out);
                right.collect_comparisons(out);
            }
        }
    }

    /// Binding strength used by the printer: OR < AND < NOT < comparison.
    fn precedence(&self) -> u8 {
        match self {
            Expr::Or { .. } => 1,
            Expr::And { .. } => 2,
            Expr::Not { .. } => 3,
            Expr::Compare { .. } => 4,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Text(s) => {
                f.write_str("'")?;
                for ch in s.chars() {
                    match ch {
                        '\\' => f.write_str("\\\\")?,
                        '\'' => f.write_str("\\'")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("'")
            }
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field { name, .. } => f.write_str(name),
            Operand::Literal { value, .. } => write!(f, "{}", value),
        }
    }
}

/// Canonical rendering: uppercase keywords, single spaces, and parentheses
/// only where precedence or left-associativity would otherwise change the tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare {
                op, left, right, ..
            } => write!(f, "{} {} {}", left, op, right),
            Expr::Not { expr, .. } => {
                f.write_str("NOT ")?;
                expr.fmt_child(f, expr.precedence() < self.precedence())
            }
            Expr::And { left, right, .. } | Expr::Or { left, right, .. } => {
                let keyword = if matches!(self, Expr::And { .. }) {
                    "AND"
                } else {
                    "OR"
                };
                left.fmt_child(f, left.precedence() < self.precedence())?;
                write!(f, " {} ", keyword)?;
                right.fmt_child(f, right.precedence() <= self.precedence())
            }
        }
    }
}
