//! Documentation content for the rel CLI

use std::fmt::Write;

use super::CliError;
use crate::FieldCatalog;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Syntax,
    Operators,
    Fields,
    Errors,
}

impl DocCategory {
    /// Parse category name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "syntax" | "grammar" => Some(Self::Syntax),
            "operators" | "ops" => Some(Self::Operators),
            "fields" | "field" => Some(Self::Fields),
            "errors" | "error" | "codes" => Some(Self::Errors),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"REL DOCUMENTATION

REL is the rule expression language used by fraud rules. An expression is a
boolean condition over transaction and user attributes, for example:

  amount > 10000 AND user.age < 21

DOCUMENTATION CATEGORIES

  syntax            Grammar, literals, keywords and precedence
  operators         Comparison and logical operators
  fields            Fields an expression may reference
  errors            Diagnostic codes reported by validation

Run 'rel docs <category>' for detailed documentation.
Run 'rel fields' to list the fields of the active catalog.
"#
}

/// Get documentation for a specific category.
///
/// The fields page is rendered from `catalog`, so a custom catalog
/// documents itself.
pub fn get_doc_category(name: &str, catalog: &FieldCatalog) -> Result<String, CliError> {
    match DocCategory::from_name(name) {
        Some(DocCategory::Syntax) => Ok(get_syntax_reference().to_string()),
        Some(DocCategory::Operators) => Ok(OPERATORS_DOC.to_string()),
        Some(DocCategory::Fields) => Ok(format_fields(catalog)),
        Some(DocCategory::Errors) => Ok(ERRORS_DOC.to_string()),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

/// Grammar reference shown by `rel docs syntax`
pub fn get_syntax_reference() -> &'static str {
    SYNTAX_DOC
}

/// Renders the catalog as an aligned table, one field per line.
pub fn format_fields(catalog: &FieldCatalog) -> String {
    let width = catalog
        .fields()
        .map(|f| f.name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::from("FIELDS\n\n");
    for field in catalog.fields() {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "  {:<width$}  {:<8}  {}",
            field.name,
            field.kind.to_string(),
            field.namespace,
            width = width
        );
    }
    out
}

const SYNTAX_DOC: &str = r#"SYNTAX - Rule Expressions

GRAMMAR
  expr       := or_expr
  or_expr    := and_expr ( OR and_expr )*
  and_expr   := not_expr ( AND not_expr )*
  not_expr   := NOT not_expr | primary
  primary    := '(' expr ')' | comparison
  comparison := field op literal

FIELDS
  Identifiers made of letters, digits, '_' and '.', such as amount,
  location.country or user.age. Names starting with 'user.' read from the
  user; every other name reads from the transaction.

LITERALS
  Numbers      10000, 0.5
  Strings      'RU', 'it\'s', 'C:\\temp'
               Escape a quote as \' and a backslash as \\

KEYWORDS
  AND, OR and NOT are case-insensitive and normalized to upper case.

PRECEDENCE (loosest first)
  OR
  AND
  NOT
  comparison

    amount > 100 OR currency = 'EUR' AND NOT user.age >= 18
  parses as
    amount > 100 OR (currency = 'EUR' AND NOT user.age >= 18)

NOT SUPPORTED
  Arithmetic (+ - * / %), signed literals and function calls are rejected
  with DSL_UNSUPPORTED_TIER.
"#;

const OPERATORS_DOC: &str = r#"OPERATORS

COMPARISON
  =     equal
  !=    not equal
  <     less than
  >     greater than
  <=    less than or equal
  >=    greater than or equal

  Numeric fields accept every comparison. Text fields accept only = and !=.

    amount >= 5000
    currency != 'USD'

LOGICAL
  AND   both sides match
  OR    either side matches
  NOT   negates the following expression

EVALUATION
  A comparison whose field is absent, or whose value cannot be read as the
  field's kind, does not match. NOT of such a comparison does match.
"#;

const ERRORS_DOC: &str = r#"ERRORS

Validation reports at most one diagnostic, with the character position it
refers to and up to 20 characters of source from that position.

  DSL_PARSE_ERROR         Grammar violation, length limits, bad literals
  DSL_INVALID_FIELD       Unknown field, or a comparison not shaped
                          field op literal
  DSL_INVALID_OPERATOR    Ordering comparison on a text field
  DSL_UNSUPPORTED_TIER    Arithmetic, signs or function calls

Example:
  $ rel validate "amount > 100 AND"
  {"isValid":false,"normalizedExpression":null,"errors":[{"code":"DSL_PARSE_ERROR",...}]}
"#;
