use std::fmt;

use anyhow::{bail, Result};

use crate::lang::error::LispError;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// All numbers are 64 bit floats, literals included
    Number(f64),
    String(String),
    /// Result of operations that produce nothing, eg. `defn`
    Nil,
}

impl Value {
    pub fn as_number(&self) -> Result<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            v => bail!(LispError::TypeMismatch {
                expected: "number",
                found: v.to_string(),
            }),
        }
    }

    pub fn as_string(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            v => bail!(LispError::TypeMismatch {
                expected: "string",
                found: v.to_string(),
            }),
        }
    }

    /// Whether the REPL should print nothing for this result
    ///
    /// `Nil`, zero and the empty string all count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Number(n) => *n == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Nil => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `{:?}` keeps the trailing `.0` on whole numbers
            Value::Number(n) => write!(f, "{:?}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Nil => write!(f, "nil"),
        }
    }
}

#[test]
fn test_display() {
    let data = vec![
        (Value::Number(5.0), "5.0"),
        (Value::Number(3.5), "3.5"),
        (Value::Number(-0.25), "-0.25"),
        (Value::String("y".to_string()), "\"y\""),
        (Value::Nil, "nil"),
    ];

    for (value, expected) in data {
        assert_eq!(value.to_string(), expected);
    }
}

#[test]
fn test_is_empty() {
    assert!(Value::Nil.is_empty());
    assert!(Value::Number(0.0).is_empty());
    assert!(Value::String(String::new()).is_empty());
    assert!(!Value::Number(1.0).is_empty());
    assert!(!Value::String("x".to_string()).is_empty());
}

#[test]
fn test_conversions() {
    assert_eq!(Value::Number(2.0).as_number().unwrap(), 2.0);
    assert_eq!(Value::String("a".to_string()).as_string().unwrap(), "a");

    let err = Value::String("a".to_string()).as_number().unwrap_err();
    assert_eq!(
        err.downcast_ref::<LispError>(),
        Some(&LispError::TypeMismatch {
            expected: "number",
            found: "\"a\"".to_string(),
        })
    );
    assert!(Value::Nil.as_string().is_err());
}
