use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JSONPathErrorType {
    /// The path or a bracketed segment could not be compiled.
    SyntaxError,
    /// An operation inside a filter that must abort the whole query, like
    /// reading `.length` of `null`.
    TypeError,
    /// A configured resource ceiling was exceeded.
    LimitError,
    /// Evaluation was stopped by a timeout or a caller checkpoint.
    Cancelled,
    ConfigError,
    JSONError,
}

#[derive(Debug, Clone)]
pub struct JSONPathError {
    pub kind: JSONPathErrorType,
    pub msg: String,
    pub index: usize,
}

impl JSONPathError {
    pub fn new(kind: JSONPathErrorType, msg: String, index: usize) -> Self {
        Self { kind, msg, index }
    }

    pub fn syntax(msg: String, index: usize) -> Self {
        Self {
            kind: JSONPathErrorType::SyntaxError,
            msg,
            index,
        }
    }

    pub fn typ(msg: String, index: usize) -> Self {
        Self {
            kind: JSONPathErrorType::TypeError,
            msg,
            index,
        }
    }

    pub fn limit(msg: String) -> Self {
        Self {
            kind: JSONPathErrorType::LimitError,
            msg,
            index: 0,
        }
    }

    pub fn cancelled(msg: String) -> Self {
        Self {
            kind: JSONPathErrorType::Cancelled,
            msg,
            index: 0,
        }
    }

    pub fn config(msg: String) -> Self {
        Self {
            kind: JSONPathErrorType::ConfigError,
            msg,
            index: 0,
        }
    }

    pub fn json(msg: String, index: usize) -> Self {
        Self {
            kind: JSONPathErrorType::JSONError,
            msg,
            index,
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        self.kind == JSONPathErrorType::SyntaxError
    }
}

impl std::error::Error for JSONPathError {}

impl fmt::Display for JSONPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            JSONPathErrorType::SyntaxError => {
                write!(f, "syntax error: {} ({})", self.msg, self.index)
            }
            JSONPathErrorType::TypeError => {
                write!(f, "type error: {} ({})", self.msg, self.index)
            }
            JSONPathErrorType::LimitError => write!(f, "limit exceeded: {}", self.msg),
            JSONPathErrorType::Cancelled => write!(f, "cancelled: {}", self.msg),
            JSONPathErrorType::ConfigError => write!(f, "invalid config: {}", self.msg),
            JSONPathErrorType::JSONError => {
                write!(f, "invalid JSON: {} ({})", self.msg, self.index)
            }
        }
    }
}

impl From<serde_json::Error> for JSONPathError {
    fn from(err: serde_json::Error) -> Self {
        JSONPathError::json(err.to_string(), err.column())
    }
}
