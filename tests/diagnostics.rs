//! Failure-path checks: each diagnostic category, its message shape, and
//! the position it points at. The pipeline is fail-fast, so every case
//! asserts on the first error only.

use pascpp::translate;

fn err(src: &str) -> String {
  match translate(src) {
    Ok(_) => panic!("translation unexpectedly succeeded"),
    Err(err) => err.to_string(),
  }
}

#[test]
fn unterminated_brace_comment() {
  let msg = err("program P; { never closed");
  assert!(msg.contains("lexer error: unterminated comment"), "{msg}");
}

#[test]
fn unterminated_paren_comment() {
  let msg = err("program P; (* never closed");
  assert!(msg.contains("lexer error: unterminated comment"), "{msg}");
}

#[test]
fn string_literal_must_close_on_the_same_line() {
  let msg = err("program P;\nbegin\n  writeln('oops\nend.");
  assert!(msg.contains("lexer error: unterminated string literal"), "{msg}");
  assert!(msg.contains("at 3:"), "{msg}");
}

#[test]
fn exponent_needs_at_least_one_digit() {
  let msg = err("program P;\nvar r: real;\nbegin\n  r := 1.5e\nend.");
  assert!(msg.contains("lexer error: malformed real exponent"), "{msg}");
}

#[test]
fn character_outside_the_alphabet() {
  let msg = err("program P; ? begin end.");
  assert!(msg.contains("lexer error: invalid character '?'"), "{msg}");
  assert!(msg.contains("at 1:12"), "{msg}");
}

#[test]
fn oversized_integer_literal() {
  let msg = err("program P;\nbegin\n  writeln(99999999999999999999)\nend.");
  assert!(msg.contains("lexer error: invalid integer literal"), "{msg}");
}

#[test]
fn missing_semicolon_names_both_tokens() {
  let msg = err("program P begin end.");
  assert!(msg.contains("parser error: expected ';', got 'begin'"), "{msg}");
  assert!(msg.contains("at 1:11"), "{msg}");
}

#[test]
fn assignment_without_a_right_hand_side() {
  let msg = err("program P;\nvar x: integer;\nbegin\n  x :=\nend.");
  assert!(msg.contains("parser error: expected an expression"), "{msg}");
}

#[test]
fn declaration_without_a_type() {
  let msg = err("program P;\nvar x: ;\nbegin\nend.");
  assert!(msg.contains("parser error: expected a type"), "{msg}");
}

#[test]
fn indexed_target_requires_an_assignment() {
  let msg = err("program P;\nvar a: array[1..3] of integer;\nbegin\n  a[1]\nend.");
  assert!(msg.contains("parser error: expected ':='"), "{msg}");
}

#[test]
fn tokens_after_the_final_dot_are_rejected() {
  let msg = err("program P;\nbegin\nend.\nwriteln");
  assert!(
    msg.contains("parser error: expected end of input, got identifier 'writeln'"),
    "{msg}"
  );
}

#[test]
fn array_bounds_must_be_integer_literals() {
  let msg = err("program P;\nvar n: integer; a: array[1..n] of integer;\nbegin\nend.");
  assert!(
    msg.contains("codegen error: array 'a' has non-constant bounds"),
    "{msg}"
  );
}

#[test]
fn non_literal_parameter_bounds_are_rejected_too() {
  let msg = err(
    "program P;\nvar n: integer;\nprocedure f(a: array[1..n] of integer);\nbegin\nend;\nbegin\nend.",
  );
  assert!(
    msg.contains("codegen error: array 'a' has non-constant bounds"),
    "{msg}"
  );
}

#[test]
fn sqr_needs_an_argument() {
  let msg = err("program P;\nvar x: integer;\nbegin\n  x := sqr()\nend.");
  assert!(msg.contains("codegen error: sqr expects an argument"), "{msg}");
}

#[test]
fn length_needs_an_argument() {
  let msg = err("program P;\nvar x: integer;\nbegin\n  x := length()\nend.");
  assert!(msg.contains("codegen error: length expects an argument"), "{msg}");
}
