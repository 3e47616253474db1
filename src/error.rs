use thiserror::Error;

/// Main error type for Squall compilations
///
/// Compilation errors are fatal: no partial query document is produced.
/// The error text is suitable for surfacing to the user unchanged.
#[derive(Error, Debug, PartialEq)]
pub enum SquallError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Errors raised while tokenizing the query string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unmatched parenthesis in query")]
    UnmatchedParen,

    #[error("malformed escape sequence at end of query")]
    NoTokenMatch,
}

/// Errors raised while folding the token stream into a query tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("operator is missing an operand")]
    MissingOperand,

    #[error("adjacent expressions are missing an operator")]
    MissingOperator,
}

/// Field-value validation failures
///
/// Each variant names the field and the offending value so the message can
/// be shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("field '{field}' expects an integer, got '{value}'")]
    BadInteger { field: String, value: String },

    #[error("field '{field}' expects a number, got '{value}'")]
    BadFloat { field: String, value: String },

    #[error("field '{field}' expects 'true' or 'false', got '{value}'")]
    BadBoolean { field: String, value: String },

    #[error("field '{field}' expects an IP address or CIDR range, got '{value}'")]
    BadIp { field: String, value: String },

    #[error("field '{field}' expects a date, got '{value}'")]
    BadDate { field: String, value: String },
}

impl ValueError {
    /// Field name the failing value was addressed to
    pub fn field(&self) -> &str {
        match self {
            ValueError::BadInteger { field, .. }
            | ValueError::BadFloat { field, .. }
            | ValueError::BadBoolean { field, .. }
            | ValueError::BadIp { field, .. }
            | ValueError::BadDate { field, .. } => field,
        }
    }
}

/// Result type alias for Squall operations
pub type Result<T> = std::result::Result<T, SquallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SquallError::from(ValueError::BadInteger {
            field: "score".to_string(),
            value: "ten".to_string(),
        });
        assert_eq!(err.to_string(), "field 'score' expects an integer, got 'ten'");
    }

    #[test]
    fn test_lex_error_display() {
        assert_eq!(
            LexError::UnmatchedParen.to_string(),
            "unmatched parenthesis in query"
        );
    }

    #[test]
    fn test_value_error_field() {
        let err = ValueError::BadDate {
            field: "created_at".to_string(),
            value: "yesterdayish".to_string(),
        };
        assert_eq!(err.field(), "created_at");
    }
}
