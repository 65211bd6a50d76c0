use crate::lang::functions::Functions;
use crate::lang::value::Value;
use crate::lang::variables::Variables;

/// Symbol tables shared by the parser and the evaluator
///
/// Owned by a single `Runtime`, so separate interpreters never see each other's definitions.
pub struct Environment {
    pub variables: Variables<Value>,
    pub functions: Functions,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            variables: Variables::new(),
            functions: Functions::new(),
        }
    }
}
