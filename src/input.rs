use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Completer, Helper, Highlighter, Hinter, Result};

/// Helper that extends editor
///
/// Currently only implements `Validator` trait to trigger multiline editing when a `\` is seen at
/// the end of a line.
#[derive(Completer, Helper, Highlighter, Hinter)]
pub struct ReplHelper {}

impl ReplHelper {
    pub fn new() -> Self {
        ReplHelper {}
    }
}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> Result<ValidationResult> {
        if ctx.input().ends_with('\\') {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

/// Fixup input so the parser is happy
///
/// Joins lines continued with `\` into a single line.
pub fn fixup_input(input: &str) -> String {
    input.replace("\\\n", " ")
}

#[test]
fn test_fixup_input() {
    assert_eq!(fixup_input("(+ 1 \\\n2)"), "(+ 1  2)");
    assert_eq!(fixup_input("(+ 1 \\ \n2)"), "(+ 1 \\ \n2)");
    assert_eq!(fixup_input("(+ 1 2)"), "(+ 1 2)");
    assert_eq!(fixup_input(r#""a\\b""#), r#""a\\b""#);
}
