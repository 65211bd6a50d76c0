use std::collections::BTreeMap;

use crate::lang::ast::Identifier;

/// Variable name -> last bound value
///
/// Starts out empty and is only written through `defvar`.
pub struct Variables<T> {
    inner: BTreeMap<Identifier, T>,
}

impl<T> Variables<T> {
    pub fn new() -> Self {
        Variables {
            inner: BTreeMap::default(),
        }
    }

    pub fn get(&self, ident: &Identifier) -> Option<&T> {
        self.inner.get(ident)
    }

    /// Bind `ident` to `val`, replacing any earlier binding
    pub fn insert(&mut self, ident: Identifier, val: T) {
        self.inner.insert(ident, val);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[test]
fn test_rebind() {
    let mut vars = Variables::new();
    let x = Identifier("x".to_string());

    assert_eq!(vars.get(&x), None);
    vars.insert(x.clone(), 5);
    assert_eq!(vars.get(&x), Some(&5));
    vars.insert(x.clone(), 6);
    assert_eq!(vars.get(&x), Some(&6));
    assert_eq!(vars.len(), 1);
}
