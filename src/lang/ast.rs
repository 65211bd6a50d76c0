use std::fmt;

use crate::lang::functions::Operation;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Identifier(pub String);

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parsed expression
///
/// Each `Function` node owns its arguments, so a parsed line is always a strict tree.
#[derive(Debug, PartialEq)]
pub enum Ast {
    Number(f64),
    Str(String),
    /// Resolved against the variable table at evaluation time
    Variable(Identifier),
    /// (operation, arguments)
    ///
    /// The operation is looked up when the call is parsed.
    Function(Operation, Vec<Ast>),
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Number(n) => write!(f, "{}", n),
            Ast::Str(s) => write!(f, "{:?}", s),
            Ast::Variable(ident) => write!(f, "{}", ident),
            Ast::Function(op, args) => {
                write!(f, "({}", op)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[test]
fn test_display() {
    let data = vec![
        (Ast::Number(42.0), "42"),
        (Ast::Number(3.5), "3.5"),
        (Ast::Str("a \"b\"".to_string()), r#""a \"b\"""#),
        (Ast::Variable(Identifier("x".to_string())), "x"),
        (
            Ast::Function(
                Operation::Add,
                vec![
                    Ast::Function(
                        Operation::Multiply,
                        vec![Ast::Number(2.0), Ast::Number(3.0)],
                    ),
                    Ast::Number(4.0),
                ],
            ),
            "(+ (* 2 3) 4)",
        ),
        (Ast::Function(Operation::Exit, Vec::new()), "(exit)"),
    ];

    for (ast, expected) in data {
        assert_eq!(ast.to_string(), expected);
    }
}
