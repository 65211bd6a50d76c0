use std::error::Error;
use std::fmt;

/// Failures raised while parsing or evaluating a line
///
/// These travel inside `anyhow::Error`. Callers that care about the kind can
/// `downcast_ref::<LispError>()`.
#[derive(Debug, PartialEq)]
pub enum LispError {
    /// Operator name in a call is not in the function table
    UndefinedFunction(String),
    /// `defn` on a name that is already registered
    AlreadyDefined(String),
    /// Malformed syntax
    Parse(String),
    DivideByZero,
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    ArityMismatch {
        op: String,
        expected: &'static str,
        found: usize,
    },
    /// Parenthesis nesting exceeded the configured limit
    NestingTooDeep(usize),
}

impl fmt::Display for LispError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LispError::UndefinedFunction(name) => write!(f, "Undefined function: {}", name),
            LispError::AlreadyDefined(name) => write!(f, "Function already defined: {}", name),
            LispError::Parse(msg) => write!(f, "Parse error: {}", msg),
            LispError::DivideByZero => write!(f, "Divide by zero"),
            LispError::TypeMismatch { expected, found } => {
                write!(f, "Expected {}, got '{}'", expected, found)
            }
            LispError::ArityMismatch {
                op,
                expected,
                found,
            } => write!(
                f,
                "'{}' expects {} argument(s), got {}",
                op, expected, found
            ),
            LispError::NestingTooDeep(limit) => {
                write!(f, "Expression nested deeper than {} levels", limit)
            }
        }
    }
}

impl Error for LispError {}

#[test]
fn test_display() {
    let data = vec![
        (
            LispError::UndefinedFunction("zzz".to_string()),
            "Undefined function: zzz",
        ),
        (
            LispError::AlreadyDefined("foo".to_string()),
            "Function already defined: foo",
        ),
        (LispError::DivideByZero, "Divide by zero"),
        (
            LispError::TypeMismatch {
                expected: "number",
                found: "\"y\"".to_string(),
            },
            "Expected number, got '\"y\"'",
        ),
        (
            LispError::ArityMismatch {
                op: "defvar".to_string(),
                expected: "2",
                found: 1,
            },
            "'defvar' expects 2 argument(s), got 1",
        ),
    ];

    for (err, expected) in data {
        assert_eq!(err.to_string(), expected);
    }
}
