use std::fmt;

/// Error types raised by derivative structures and their compiler tables
#[derive(Debug, Clone, PartialEq)]
pub enum DerivativeError {
    /// operands (or an input array) do not have the expected dimension
    DimensionMismatch { found: usize, expected: usize },
    /// wrong variable index
    OutOfRange {
        index: usize,
        lower: usize,
        upper: usize,
    },
    /// requested derivation order exceeds the order of the structure
    OrderTooLarge { order: usize, max: usize },
    /// invalid counts or ranges passed by the caller
    PreconditionViolation(String),
}

impl fmt::Display for DerivativeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DerivativeError::DimensionMismatch { found, expected } => {
                write!(f, "dimension mismatch: {} != {}", found, expected)
            }
            DerivativeError::OutOfRange {
                index,
                lower,
                upper,
            } => write!(
                f,
                "wrong variable index: {} out of [{}, {}]",
                index, lower, upper
            ),
            DerivativeError::OrderTooLarge { order, max } => {
                write!(f, "derivation order {} is larger than {}", order, max)
            }
            DerivativeError::PreconditionViolation(msg) => {
                write!(f, "precondition violated: {}", msg)
            }
        }
    }
}

impl std::error::Error for DerivativeError {}

pub type DSResult<T> = std::result::Result<T, DerivativeError>;
