//! Crate root: wires together the translation pipeline.
//!
//! The stages are intentionally small and composable so they can be
//! evolved independently:
//! - `lexer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns the program AST.
//! - `codegen` lowers the tree into a C++ translation unit.
//! - `error` centralises the diagnostics shared by the other modules.
//!
//! Data flows one way: characters, tokens, tree, text. No stage mutates
//! the output of an earlier one, and the first error aborts the run.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;

pub use error::{TranslateError, TranslateResult};

/// Translate Pascal source into a C++ translation unit.
pub fn translate(source: &str) -> TranslateResult<String> {
  let tokens = lexer::tokenize(source)?;
  let program = parser::parse(tokens)?;
  codegen::generate(&program)
}
