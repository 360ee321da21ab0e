use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RqlError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        clause: Option<usize>,
        text: Option<String>,
        position: Option<usize>,
        line: Option<usize>,
        col: Option<usize>,
    },
    #[error("Unknown property: {path}")]
    UnknownProperty { path: String },
    #[error("Cannot convert '{literal}' to {expected} for field {field}")]
    TypeCoercion {
        field: String,
        expected: String,
        literal: String,
    },
    #[error("Operator {operator} is not supported for field {field} of type {data_type}")]
    UnsupportedOperator {
        field: String,
        operator: String,
        data_type: String,
    },
}

pub type Result<T> = std::result::Result<T, RqlError>;

impl RqlError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            clause: None,
            text: None,
            position: None,
            line: None,
            col: None,
        }
    }
    // attaches the clause index and raw clause text unless already known
    pub(crate) fn in_clause(self, index: usize, raw: &str) -> Self {
        match self {
            Self::Parse { message, clause, text, position, line, col } => Self::Parse {
                message,
                clause: clause.or(Some(index)),
                text: text.or_else(|| Some(raw.to_owned())),
                position,
                line,
                col,
            },
            other => other,
        }
    }
    pub(crate) fn at(self, offset: usize) -> Self {
        match self {
            Self::Parse { message, clause, text, position, line, col } => Self::Parse {
                message,
                clause,
                text,
                position: position.or(Some(offset)),
                line,
                col,
            },
            other => other,
        }
    }
    /// Every error except configuration failures stems from caller input.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
    /// HTTP status a hosting endpoint should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Parse { .. } => 400,
            Self::UnknownProperty { .. }
            | Self::TypeCoercion { .. }
            | Self::UnsupportedOperator { .. } => 422,
            Self::Config(_) => 500,
        }
    }
}

// Helper conversions
impl From<config::ConfigError> for RqlError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
