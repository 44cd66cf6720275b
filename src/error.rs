//! Shared error type for the translation pipeline.
//!
//! Every stage reports through `TranslateError` so the CLI can print a
//! single diagnostic line and exit. Lexer and parser errors carry the
//! 1-based source position they were raised at; I/O errors carry the
//! offending path instead.

use crate::lexer::Token;
use snafu::Snafu;
use std::path::{Path, PathBuf};

pub type TranslateResult<T> = Result<T, TranslateError>;

#[derive(Debug, Snafu)]
pub enum TranslateError {
  #[snafu(display("lexer error: {message} at {line}:{column}"))]
  Lexer {
    message: String,
    line: usize,
    column: usize,
  },

  /// The parser keeps the first offending token; its position anchors the
  /// diagnostic.
  #[snafu(display("parser error: {message} at {}:{}", token.line, token.column))]
  Parser { message: String, token: Token },

  #[snafu(display("codegen error: {message}"))]
  Codegen { message: String },

  #[snafu(display("i/o error: cannot read '{}': {source}", path.display()))]
  ReadInput {
    path: PathBuf,
    source: std::io::Error,
  },

  #[snafu(display("i/o error: cannot write '{}': {source}", path.display()))]
  WriteOutput {
    path: PathBuf,
    source: std::io::Error,
  },
}

impl TranslateError {
  pub fn lexer(message: impl Into<String>, line: usize, column: usize) -> Self {
    Self::Lexer {
      message: message.into(),
      line,
      column,
    }
  }

  pub fn parser(message: impl Into<String>, token: &Token) -> Self {
    Self::Parser {
      message: message.into(),
      token: token.clone(),
    }
  }

  pub fn codegen(message: impl Into<String>) -> Self {
    Self::Codegen {
      message: message.into(),
    }
  }

  pub fn read_input(path: &Path, source: std::io::Error) -> Self {
    Self::ReadInput {
      path: path.to_path_buf(),
      source,
    }
  }

  pub fn write_output(path: &Path, source: std::io::Error) -> Self {
    Self::WriteOutput {
      path: path.to_path_buf(),
      source,
    }
  }
}
