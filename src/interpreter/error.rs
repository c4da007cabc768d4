use std::{error::Error, fmt::Display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// An operator applied to values it has no meaning for, a unary
    /// operation on a non-identifier, or an assignment to a non-identifier.
    TypeError { message: String },
    /// Call argument count does not match the callable's signature.
    Arity {
        name: String,
        expected: usize,
        given: usize,
    },
    /// An `exec` target that is not bound, or bound to a non-callable.
    UnknownCallable { name: String },
    /// An `end` or `else` with no matching opener at runtime.
    BlockMismatch { message: String },
    /// Stepped past the last instruction. The expected way for a program to
    /// finish, surfaced as a signal the host can match on.
    Eof,
}

impl RuntimeError {
    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::TypeError {
            message: message.into(),
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::TypeError { message } => f.write_str(message),
            RuntimeError::Arity {
                name,
                expected,
                given,
            } => {
                write!(f, "'{name}' expects {expected} argument(s), given {given}")
            }
            RuntimeError::UnknownCallable { name } => {
                write!(f, "'{name}' is not a callable object")
            }
            RuntimeError::BlockMismatch { message } => f.write_str(message),
            RuntimeError::Eof => f.write_str("end of program"),
        }
    }
}

impl Error for RuntimeError {}
