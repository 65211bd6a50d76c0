//! Parser for plisp's s-expression syntax.
//!
//! The grammar is a PEG built from `pom` combinators. Each expression is decided by its leading
//! character:
//!
//! * `(` starts a call. The token right after it is the operator name, followed by the
//!   arguments and a closing `)`
//! * `"` starts a string literal
//! * a digit starts a number literal
//! * anything else is a bare identifier (variable reference)
//!
//! Spaces and commas separate arguments and are otherwise ignored.
//!
//! Parsing happens in two steps. The PEG produces a purely syntactic tree, which is then lowered
//! into `Ast`, resolving every operator name against the function table. Doing the lookup
//! outside of the combinators keeps `LispError::UndefinedFunction` intact instead of flattening
//! it into a pom conversion error.
//!

use std::iter::FromIterator;
use std::str::FromStr;

use anyhow::{bail, Result};
use pom::parser::{call, end, none_of, one_of, sym, Parser};

use crate::lang::ast::{Ast, Identifier};
use crate::lang::error::LispError;
use crate::lang::functions::Functions;

const SEPARATORS: &str = " ,\t\r\n";

/// Characters that end (or may not appear in) a bare token
const NON_TOKEN: &str = " ,\t\r\n()\"";

enum Syntax {
    Number(f64),
    Str(String),
    Symbol(String),
    /// (operator name, arguments)
    Call(String, Vec<Syntax>),
}

fn sep<'a>() -> Parser<'a, char, ()> {
    one_of(SEPARATORS).repeat(0..).discard()
}

fn token<'a>() -> Parser<'a, char, String> {
    none_of(NON_TOKEN)
        .repeat(1..)
        .collect()
        .map(String::from_iter)
}

fn string<'a>() -> Parser<'a, char, Syntax> {
    let special_char = sym('\\')
        | sym('"')
        | sym('n').map(|_| '\n')
        | sym('r').map(|_| '\r')
        | sym('t').map(|_| '\t');
    let escape_sequence = sym('\\') * special_char;
    let chars = (none_of("\\\"") | escape_sequence)
        .repeat(0..)
        .map(String::from_iter);

    (sym('"') * chars - sym('"')).map(Syntax::Str)
}

/// Number literal or identifier
///
/// Both run up to the next delimiter. A token with a leading digit must be a valid number,
/// otherwise the whole parse fails.
fn atom<'a>() -> Parser<'a, char, Syntax> {
    token().convert(|tok| {
        if tok.starts_with(|c: char| c.is_ascii_digit()) {
            f64::from_str(&tok).map(Syntax::Number)
        } else {
            Ok(Syntax::Symbol(tok))
        }
    })
}

fn list<'a>() -> Parser<'a, char, Syntax> {
    let args = (sep() * call(expr)).repeat(0..);
    let list = sym('(') * token() + args - sep() - sym(')');

    list.map(|(name, args)| Syntax::Call(name, args))
}

fn expr<'a>() -> Parser<'a, char, Syntax> {
    list() | string() | atom()
}

fn program<'a>() -> Parser<'a, char, Vec<Syntax>> {
    (sep() * call(expr)).repeat(0..) - sep() - end()
}

/// Reject input that nests parentheses deeper than `max_depth`
///
/// Runs before the PEG so pathological input never recurses in the parser or the evaluator.
fn check_depth(input: &str, max_depth: usize) -> Result<()> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for c in input.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '(' => {
                depth += 1;
                if depth > max_depth {
                    bail!(LispError::NestingTooDeep(max_depth));
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => (),
        }
    }

    Ok(())
}

fn lower(syntax: Syntax, functions: &Functions) -> Result<Ast> {
    let ast = match syntax {
        Syntax::Number(n) => Ast::Number(n),
        Syntax::Str(s) => Ast::Str(s),
        Syntax::Symbol(s) => Ast::Variable(Identifier(s)),
        Syntax::Call(name, args) => {
            // Operator first so `(zzz (yyy))` reports `zzz`
            let op = functions.resolve(&name)?;
            let args = args
                .into_iter()
                .map(|arg| lower(arg, functions))
                .collect::<Result<Vec<Ast>>>()?;

            Ast::Function(op, args)
        }
    };

    Ok(ast)
}

/// Parse `input` into a sequence of top level expressions
///
/// Either the whole input parses or nothing is returned.
pub fn parse(input: &str, functions: &Functions, max_depth: usize) -> Result<Vec<Ast>> {
    check_depth(input, max_depth)?;

    let chars: Vec<char> = input.chars().collect();
    let syntax = match program().parse(&chars) {
        Ok(s) => s,
        Err(e) => bail!(LispError::Parse(e.to_string())),
    };

    syntax
        .into_iter()
        .map(|s| lower(s, functions))
        .collect()
}

#[cfg(test)]
use crate::lang::functions::Operation;

#[cfg(test)]
fn parse_default(input: &str) -> Result<Vec<Ast>> {
    parse(input, &Functions::new(), 64)
}

#[cfg(test)]
fn var(name: &str) -> Ast {
    Ast::Variable(Identifier(name.to_string()))
}

#[test]
fn test_literals() {
    let data = vec![
        ("42", vec![Ast::Number(42.0)]),
        ("3.5", vec![Ast::Number(3.5)]),
        ("  7 ", vec![Ast::Number(7.0)]),
        (r#""abc""#, vec![Ast::Str("abc".to_string())]),
        (r#""""#, vec![Ast::Str(String::new())]),
        (r#""a, (b)""#, vec![Ast::Str("a, (b)".to_string())]),
        (r#""say \"hi\"\n""#, vec![Ast::Str("say \"hi\"\n".to_string())]),
        ("x", vec![var("x")]),
        ("foo-bar?", vec![var("foo-bar?")]),
        ("", vec![]),
    ];

    for (input, expected) in data {
        assert_eq!(parse_default(input).unwrap(), expected, "input: {}", input);
    }
}

#[test]
fn test_calls() {
    let data = vec![
        (
            "(+ 2 3)",
            Ast::Function(Operation::Add, vec![Ast::Number(2.0), Ast::Number(3.0)]),
        ),
        (
            "(+ 2,3)",
            Ast::Function(Operation::Add, vec![Ast::Number(2.0), Ast::Number(3.0)]),
        ),
        (
            "(- 10 4 )",
            Ast::Function(
                Operation::Subtract,
                vec![Ast::Number(10.0), Ast::Number(4.0)],
            ),
        ),
        ("(exit)", Ast::Function(Operation::Exit, vec![])),
        (
            r#"(defvar x "hello")"#,
            Ast::Function(
                Operation::DefVar,
                vec![var("x"), Ast::Str("hello".to_string())],
            ),
        ),
        (
            "(+ (* 2 3) 4)",
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
        ),
        (
            "(/ (% 9 4)(* 1 2))",
            Ast::Function(
                Operation::Divide,
                vec![
                    Ast::Function(Operation::Modulo, vec![Ast::Number(9.0), Ast::Number(4.0)]),
                    Ast::Function(
                        Operation::Multiply,
                        vec![Ast::Number(1.0), Ast::Number(2.0)],
                    ),
                ],
            ),
        ),
    ];

    for (input, expected) in data {
        assert_eq!(parse_default(input).unwrap(), vec![expected], "input: {}", input);
    }
}

#[test]
fn test_sequence() {
    assert_eq!(
        parse_default("1 x (+ 1)").unwrap(),
        vec![
            Ast::Number(1.0),
            var("x"),
            Ast::Function(Operation::Add, vec![Ast::Number(1.0)]),
        ]
    );
}

#[test]
fn test_parse_failures() {
    let data = vec![
        "(+ 1 2",
        "\"abc",
        "(+ 1 \"abc)",
        "+ 1 2)",
        "()",
        "( + 1 2)",
        "1abc",
        "(+ 1.2.3)",
        "(+ 1 2))",
    ];

    for input in data {
        let err = parse_default(input).unwrap_err();
        match err.downcast_ref::<LispError>() {
            Some(LispError::Parse(_)) => (),
            e => panic!("input {}: expected parse error, got {:?}", input, e),
        }
    }
}

#[test]
fn test_undefined_function() {
    let data = vec![
        ("(zzz 1 2)", "zzz"),
        ("(+ 1 (zzz))", "zzz"),
        ("(zzz (yyy))", "zzz"),
    ];

    for (input, name) in data {
        let err = parse_default(input).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LispError>(),
            Some(&LispError::UndefinedFunction(name.to_string()))
        );
    }
}

#[test]
fn test_defined_function_resolves() {
    let mut functions = Functions::new();
    functions.define("foo").unwrap();

    assert_eq!(
        parse("(foo 1)", &functions, 64).unwrap(),
        vec![Ast::Function(
            Operation::Defined("foo".to_string()),
            vec![Ast::Number(1.0)]
        )]
    );
}

#[test]
fn test_nesting_limit() {
    let functions = Functions::new();
    let nested = |depth: usize| format!("{}1{}", "(+ ".repeat(depth), ")".repeat(depth));

    assert!(parse(&nested(4), &functions, 4).is_ok());

    let err = parse(&nested(5), &functions, 4).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LispError>(),
        Some(&LispError::NestingTooDeep(4))
    );

    // Parens inside strings don't count
    assert!(parse(r#"(+ "((((((")"#, &functions, 1).is_ok());
}
