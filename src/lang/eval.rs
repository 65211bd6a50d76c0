use std::error::Error;
use std::fmt;

use anyhow::{bail, Result};
use log::debug;

use crate::lang::ast::{Ast, Identifier};
use crate::lang::env::Environment;
use crate::lang::error::LispError;
use crate::lang::functions::Operation;
use crate::lang::value::Value;

/// Raised by `exit` to unwind the current evaluation
///
/// Not a failure: `Runtime` turns it into `EvalResult::Quit`.
#[derive(Debug, PartialEq)]
pub struct ExitRequest(pub i32);

impl fmt::Display for ExitRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit requested with status {}", self.0)
    }
}

impl Error for ExitRequest {}

fn check_arity(
    op: &Operation,
    args: &[Value],
    range: (usize, usize),
    expected: &'static str,
) -> Result<()> {
    let (min, max) = range;
    if args.len() < min || args.len() > max {
        bail!(LispError::ArityMismatch {
            op: op.to_string(),
            expected,
            found: args.len(),
        });
    }

    Ok(())
}

/// Floored modulo: the result takes the sign of the divisor
fn floor_mod(lhs: f64, rhs: f64) -> f64 {
    let rem = lhs % rhs;
    if rem != 0.0 && (rem < 0.0) != (rhs < 0.0) {
        rem + rhs
    } else {
        rem
    }
}

/// Left fold an arithmetic operator over its operands
///
/// 1 - 2 - 3 => (1 - 2) - 3
fn fold_arithmetic(op: &Operation, args: &[Value]) -> Result<Value> {
    check_arity(op, args, (1, usize::MAX), "at least 1")?;

    let mut acc = args[0].as_number()?;
    for arg in &args[1..] {
        let rhs = arg.as_number()?;
        acc = match op {
            Operation::Add => acc + rhs,
            Operation::Subtract => acc - rhs,
            Operation::Multiply => acc * rhs,
            Operation::Divide | Operation::Modulo if rhs == 0.0 => bail!(LispError::DivideByZero),
            Operation::Divide => acc / rhs,
            Operation::Modulo => floor_mod(acc, rhs),
            _ => bail!("'{}' is not an arithmetic operator", op),
        };
    }

    Ok(Value::Number(acc))
}

fn apply(op: &Operation, args: Vec<Value>, env: &mut Environment) -> Result<Value> {
    match op {
        Operation::Add
        | Operation::Subtract
        | Operation::Multiply
        | Operation::Divide
        | Operation::Modulo => fold_arithmetic(op, &args),
        Operation::DefVar => {
            check_arity(op, &args, (2, 2), "2")?;
            let name = args[0].as_string()?;
            let val = args[1].clone();

            debug!("defvar {} = {}", name, val);
            env.variables
                .insert(Identifier(name.to_string()), val.clone());

            Ok(val)
        }
        Operation::Defn => {
            check_arity(op, &args, (1, 1), "1")?;
            let name = args[0].as_string()?;

            env.functions.define(name)?;
            debug!("defn {}", name);

            Ok(Value::Nil)
        }
        Operation::Exit => {
            check_arity(op, &args, (0, 1), "0 or 1")?;
            let code = match args.first() {
                Some(v) => v.as_number()? as i32,
                None => 0,
            };

            bail!(ExitRequest(code))
        }
        // Functions registered through `defn` carry no body: they hand back their argument
        Operation::Defined(_) => {
            check_arity(op, &args, (0, 1), "0 or 1")?;
            Ok(args.into_iter().next().unwrap_or(Value::Nil))
        }
    }
}

impl Ast {
    /// Evaluate this tree against `env`
    ///
    /// Arguments are evaluated left to right before the operation runs, so side effects (`defvar`,
    /// `defn`, `exit`) happen in source order.
    pub fn evaluate(&self, env: &mut Environment) -> Result<Value> {
        match self {
            Ast::Number(n) => Ok(Value::Number(*n)),
            Ast::Str(s) => Ok(Value::String(s.clone())),
            // Unbound names evaluate to themselves
            Ast::Variable(ident) => Ok(env
                .variables
                .get(ident)
                .cloned()
                .unwrap_or_else(|| Value::String(ident.0.clone()))),
            Ast::Function(op, args) => {
                let mut vals = Vec::with_capacity(args.len());
                for (i, arg) in args.iter().enumerate() {
                    let val = match arg {
                        Ast::Variable(ident) if i == 0 && op.binds_name() => {
                            Value::String(ident.0.clone())
                        }
                        _ => arg.evaluate(env)?,
                    };
                    vals.push(val);
                }

                apply(op, vals, env)
            }
        }
    }
}

#[cfg(test)]
use crate::lang::parse::parse;

#[cfg(test)]
fn eval_str(input: &str, env: &mut Environment) -> Result<Value> {
    let mut asts = parse(input, &env.functions, 64)?;
    assert_eq!(asts.len(), 1);
    asts.remove(0).evaluate(env)
}

#[cfg(test)]
fn expect_lisp_error(input: &str, env: &mut Environment) -> LispError {
    match eval_str(input, env).unwrap_err().downcast::<LispError>() {
        Ok(e) => e,
        Err(e) => panic!("input {}: unexpected error {}", input, e),
    }
}

#[test]
fn test_arithmetic() {
    let tests = vec![
        ("42", 42.0),
        ("3.5", 3.5),
        ("(+ 2 3)", 5.0),
        ("(- 10 4)", 6.0),
        ("(* 6 7)", 42.0),
        ("(/ 9 3)", 3.0),
        ("(% 10 3)", 1.0),
        ("(+ 1 2 3 4)", 10.0),
        ("(- 1 2 3)", -4.0),
        ("(/ 100 5 2)", 10.0),
        ("(% 100 7 4)", 2.0),
        ("(- 5)", 5.0),
        ("(+ (* 2 3) 4)", 10.0),
        ("(* (+ 1 1) (- 5 (/ 4 2)))", 6.0),
        ("(- 0 7)", -7.0),
        ("(% (- 0 7) 3)", 2.0),
        ("(% 7 (- 0 3))", -2.0),
        ("(/ 1 4)", 0.25),
    ];

    for (input, expected) in tests {
        let mut env = Environment::new();
        assert_eq!(
            eval_str(input, &mut env).unwrap(),
            Value::Number(expected),
            "input: {}",
            input
        );
    }
}

#[test]
fn test_divide_by_zero() {
    for input in &["(/ 5 0)", "(% 5 0)", "(/ 5 1 0)", "(% 1 (- 2 2))"] {
        let mut env = Environment::new();
        assert_eq!(expect_lisp_error(input, &mut env), LispError::DivideByZero);
    }
}

#[test]
fn test_arithmetic_errors() {
    let mut env = Environment::new();

    match expect_lisp_error("(+)", &mut env) {
        LispError::ArityMismatch { op, found, .. } => {
            assert_eq!(op, "+");
            assert_eq!(found, 0);
        }
        e => panic!("unexpected error {:?}", e),
    }

    match expect_lisp_error("(+ y 1)", &mut env) {
        LispError::TypeMismatch { expected, found } => {
            assert_eq!(expected, "number");
            assert_eq!(found, "\"y\"");
        }
        e => panic!("unexpected error {:?}", e),
    }
}

#[test]
fn test_variables() {
    let mut env = Environment::new();

    assert_eq!(eval_str("y", &mut env).unwrap(), Value::String("y".to_string()));
    assert_eq!(eval_str("(defvar x 5)", &mut env).unwrap(), Value::Number(5.0));
    assert_eq!(eval_str("x", &mut env).unwrap(), Value::Number(5.0));
    assert_eq!(eval_str("(+ x 1)", &mut env).unwrap(), Value::Number(6.0));

    // Rebinding overwrites
    assert_eq!(eval_str("(defvar x (* x 2))", &mut env).unwrap(), Value::Number(10.0));
    assert_eq!(eval_str("x", &mut env).unwrap(), Value::Number(10.0));

    // Name may also be given as a string literal
    assert_eq!(
        eval_str(r#"(defvar "s" "text")"#, &mut env).unwrap(),
        Value::String("text".to_string())
    );
    assert_eq!(eval_str("s", &mut env).unwrap(), Value::String("text".to_string()));
    assert_eq!(env.variables.len(), 2);
}

#[test]
fn test_defvar_errors() {
    let mut env = Environment::new();

    match expect_lisp_error("(defvar x)", &mut env) {
        LispError::ArityMismatch { op, found, .. } => {
            assert_eq!(op, "defvar");
            assert_eq!(found, 1);
        }
        e => panic!("unexpected error {:?}", e),
    }

    match expect_lisp_error("(defvar 1 2)", &mut env) {
        LispError::TypeMismatch { expected, .. } => assert_eq!(expected, "string"),
        e => panic!("unexpected error {:?}", e),
    }
}

#[test]
fn test_defn() {
    let mut env = Environment::new();

    assert_eq!(eval_str("(defn foo)", &mut env).unwrap(), Value::Nil);
    assert_eq!(
        expect_lisp_error("(defn foo)", &mut env),
        LispError::AlreadyDefined("foo".to_string())
    );
    assert_eq!(
        expect_lisp_error("(defn defvar)", &mut env),
        LispError::AlreadyDefined("defvar".to_string())
    );

    // Defined functions pass their argument through
    assert_eq!(eval_str("(foo 3)", &mut env).unwrap(), Value::Number(3.0));
    assert_eq!(eval_str("(foo (+ 1 2))", &mut env).unwrap(), Value::Number(3.0));
    assert_eq!(eval_str("(foo)", &mut env).unwrap(), Value::Nil);
    match expect_lisp_error("(foo 1 2)", &mut env) {
        LispError::ArityMismatch { op, .. } => assert_eq!(op, "foo"),
        e => panic!("unexpected error {:?}", e),
    }
}

#[test]
fn test_exit() {
    let data = vec![("(exit)", 0), ("(exit 3)", 3), ("(+ 1 (exit 2))", 2)];

    for (input, code) in data {
        let mut env = Environment::new();
        let err = eval_str(input, &mut env).unwrap_err();
        assert_eq!(err.downcast_ref::<ExitRequest>(), Some(&ExitRequest(code)));
    }
}

#[test]
fn test_left_to_right() {
    let mut env = Environment::new();

    // `exit` stops evaluation before the later `defvar` runs
    let err = eval_str("(+ (defvar a 1) (exit) (defvar b 2))", &mut env).unwrap_err();
    assert!(err.downcast_ref::<ExitRequest>().is_some());
    assert_eq!(eval_str("a", &mut env).unwrap(), Value::Number(1.0));
    assert_eq!(eval_str("b", &mut env).unwrap(), Value::String("b".to_string()));

    // Earlier arguments are visible to later ones
    assert_eq!(
        eval_str("(+ (defvar c 2) c c)", &mut env).unwrap(),
        Value::Number(6.0)
    );
}
