use std::io::Write;

use anyhow::{bail, Result};
use log::info;

use crate::lang::ast::Ast;
use crate::lang::env::Environment;
use crate::lang::error::LispError;
use crate::lang::eval::ExitRequest;
use crate::lang::parse::parse;
use crate::lang::value::Value;

pub const DEFAULT_MAX_DEPTH: usize = 128;

pub struct Config {
    /// Deepest parenthesis nesting accepted on a single line
    pub max_depth: usize,
    /// Whether each line's AST and result are written to the sink
    pub interactive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            interactive: true,
        }
    }
}

pub enum EvalResult {
    Ok,
    /// `exit` was evaluated, carrying the requested status code
    Quit(i32),
    Err(String),
}

pub struct Runtime<'a> {
    sink: &'a mut dyn Write,
    config: Config,
    env: Environment,
}

impl<'a> Runtime<'a> {
    /// Create a new `Runtime` instance
    ///
    /// `sink` is where output should be written. Nothing is written unless `config.interactive`
    /// is set.
    pub fn new(sink: &'a mut dyn Write, config: Config) -> Self {
        Self {
            sink,
            config,
            env: Environment::new(),
        }
    }

    /// Parse a line that must hold exactly one expression
    pub fn parse_line(&self, line: &str) -> Result<Ast> {
        let mut asts = parse(line, &self.env.functions, self.config.max_depth)?;
        match asts.len() {
            1 => Ok(asts.remove(0)),
            0 => bail!(LispError::Parse("expected an expression".to_string())),
            n => bail!(LispError::Parse(format!(
                "expected a single expression, found {}",
                n
            ))),
        }
    }

    /// Parse then evaluate `line` without producing any output
    pub fn run(&mut self, line: &str) -> Result<Value> {
        let ast = self.parse_line(line)?;
        ast.evaluate(&mut self.env)
    }

    fn write_result(&mut self, ast: &Ast, val: &Value) -> std::io::Result<()> {
        writeln!(self.sink, "ast: {}", ast)?;
        if val.is_empty() {
            writeln!(self.sink)
        } else {
            writeln!(self.sink, "{}", val)
        }
    }

    pub fn eval(&mut self, line: &str) -> EvalResult {
        // Parse input into AST
        let ast = match self.parse_line(line) {
            Ok(a) => a,
            Err(e) => return EvalResult::Err(e.to_string()),
        };
        info!("parsed: {}", ast);

        // Evaluate AST
        let val = match ast.evaluate(&mut self.env) {
            Ok(v) => v,
            Err(e) => {
                return match e.downcast_ref::<ExitRequest>() {
                    Some(ExitRequest(code)) => EvalResult::Quit(*code),
                    None => EvalResult::Err(e.to_string()),
                }
            }
        };
        info!("result: {}", val);

        if self.config.interactive {
            if let Err(e) = self.write_result(&ast, &val) {
                return EvalResult::Err(e.to_string());
            }
        }

        EvalResult::Ok
    }
}

#[cfg(test)]
fn quiet() -> Config {
    Config {
        interactive: false,
        ..Config::default()
    }
}

#[test]
fn test_interactive() {
    let tests = vec![
        ("(+ 2 3)", "ast: (+ 2 3)\n5.0\n"),
        ("42", "ast: 42\n42.0\n"),
        ("y", "ast: y\n\"y\"\n"),
        ("(defn foo)", "ast: (defn foo)\n\n"),
        ("(- 2 2)", "ast: (- 2 2)\n\n"),
    ];

    for (input, expected) in tests {
        let mut output = Vec::new();
        let mut runtime = Runtime::new(&mut output, Config::default());
        match runtime.eval(input) {
            EvalResult::Ok => (),
            _ => panic!("input {} failed", input),
        };
        assert_eq!(
            String::from_utf8(output).expect("Output not utf-8"),
            expected
        );
    }
}

#[test]
fn test_not_interactive() {
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output, quiet());
    match runtime.eval("(* 6 7)") {
        EvalResult::Ok => (),
        _ => panic!("eval failed"),
    };
    assert!(output.is_empty());
}

#[test]
fn test_state_persists_across_lines() {
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output, quiet());

    assert_eq!(runtime.run("(defvar x 5)").unwrap(), Value::Number(5.0));
    assert_eq!(runtime.run("x").unwrap(), Value::Number(5.0));
    assert_eq!(runtime.run("(defn foo)").unwrap(), Value::Nil);
    assert_eq!(runtime.run("(foo x)").unwrap(), Value::Number(5.0));

    let err = runtime.run("(defn foo)").unwrap_err();
    assert_eq!(
        err.downcast_ref::<LispError>(),
        Some(&LispError::AlreadyDefined("foo".to_string()))
    );
}

#[test]
fn test_runtimes_are_isolated() {
    let mut out_a = Vec::new();
    let mut out_b = Vec::new();
    let mut a = Runtime::new(&mut out_a, quiet());
    let mut b = Runtime::new(&mut out_b, quiet());

    a.run("(defvar x 1)").unwrap();
    a.run("(defn foo)").unwrap();

    assert_eq!(b.run("x").unwrap(), Value::String("x".to_string()));
    assert!(b.run("(defn foo)").is_ok());
}

#[test]
fn test_errors() {
    let tests = vec![
        ("(/ 5 0)", "Divide by zero"),
        ("(zzz 1 2)", "Undefined function: zzz"),
        ("1 2", "Parse error: expected a single expression, found 2"),
        ("", "Parse error: expected an expression"),
    ];

    for (input, expected) in tests {
        let mut output = Vec::new();
        let mut runtime = Runtime::new(&mut output, Config::default());
        match runtime.eval(input) {
            EvalResult::Err(e) => assert_eq!(e, expected),
            _ => panic!("input {} should fail", input),
        };
        // Failed lines produce no partial output
        assert!(output.is_empty());
    }
}

#[test]
fn test_parse_failures() {
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output, quiet());

    for input in &["(+ 1 2", "\"abc"] {
        let err = runtime.run(input).unwrap_err();
        match err.downcast_ref::<LispError>() {
            Some(LispError::Parse(_)) => (),
            e => panic!("input {}: expected parse error, got {:?}", input, e),
        }
    }
}

#[test]
fn test_max_depth() {
    let mut output = Vec::new();
    let mut runtime = Runtime::new(
        &mut output,
        Config {
            max_depth: 2,
            interactive: false,
        },
    );

    assert!(runtime.run("(+ (+ 1))").is_ok());
    let err = runtime.run("(+ (+ (+ 1)))").unwrap_err();
    assert_eq!(
        err.downcast_ref::<LispError>(),
        Some(&LispError::NestingTooDeep(2))
    );
}

#[test]
fn test_quit() {
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output, Config::default());
    match runtime.eval("(exit 4)") {
        EvalResult::Quit(4) => (),
        _ => panic!("expected quit"),
    };
    assert!(output.is_empty());
}
