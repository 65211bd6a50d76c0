use std::collections::BTreeMap;
use std::fmt;

use anyhow::{bail, Result};
use lazy_static::lazy_static;

use crate::lang::error::LispError;

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    DefVar,
    Defn,
    Exit,
    /// Registered at runtime through `defn`
    Defined(String),
}

impl Operation {
    /// Whether the first argument names a binding rather than being evaluated
    pub fn binds_name(&self) -> bool {
        matches!(self, Operation::DefVar | Operation::Defn)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => write!(f, "+"),
            Operation::Subtract => write!(f, "-"),
            Operation::Multiply => write!(f, "*"),
            Operation::Divide => write!(f, "/"),
            Operation::Modulo => write!(f, "%"),
            Operation::DefVar => write!(f, "defvar"),
            Operation::Defn => write!(f, "defn"),
            Operation::Exit => write!(f, "exit"),
            Operation::Defined(name) => write!(f, "{}", name),
        }
    }
}

lazy_static! {
    pub static ref BUILTINS: Vec<Operation> = vec![
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Modulo,
        Operation::DefVar,
        Operation::Defn,
        Operation::Exit,
    ];
}

/// Function/operator name -> operation
///
/// Pre-populated with `BUILTINS`. Entries are only ever added, never replaced.
pub struct Functions {
    inner: BTreeMap<String, Operation>,
}

impl Functions {
    pub fn new() -> Self {
        let mut inner = BTreeMap::default();
        for op in &*BUILTINS {
            inner.insert(op.to_string(), op.clone());
        }

        Functions { inner }
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.inner.get(name)
    }

    /// Look up the operation a call refers to
    pub fn resolve(&self, name: &str) -> Result<Operation> {
        match self.get(name) {
            Some(op) => Ok(op.clone()),
            None => bail!(LispError::UndefinedFunction(name.to_string())),
        }
    }

    /// Register `name` as a pass-through operation
    pub fn define(&mut self, name: &str) -> Result<()> {
        if self.inner.contains_key(name) {
            bail!(LispError::AlreadyDefined(name.to_string()));
        }

        self.inner
            .insert(name.to_string(), Operation::Defined(name.to_string()));

        Ok(())
    }
}

#[test]
fn test_builtins() {
    let functions = Functions::new();
    for name in &["+", "-", "*", "/", "%", "defvar", "defn", "exit"] {
        let op = functions.resolve(name).expect("builtin missing");
        assert_eq!(op.to_string(), *name);
    }
}

#[test]
fn test_resolve_unknown() {
    let functions = Functions::new();
    let err = functions.resolve("zzz").unwrap_err();
    assert_eq!(
        err.downcast_ref::<LispError>(),
        Some(&LispError::UndefinedFunction("zzz".to_string()))
    );
}

#[test]
fn test_define() {
    let mut functions = Functions::new();
    functions.define("foo").expect("first define failed");
    assert_eq!(
        functions.get("foo"),
        Some(&Operation::Defined("foo".to_string()))
    );

    for name in &["foo", "+", "defn"] {
        let err = functions.define(name).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LispError>(),
            Some(&LispError::AlreadyDefined(name.to_string()))
        );
    }
}
