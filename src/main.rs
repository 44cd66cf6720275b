//! Command-line front end: argument parsing, file I/O and per-phase
//! reporting. All translation work lives in the library; this layer only
//! moves bytes and formats diagnostics.

use clap::Parser;
use pascpp::error::TranslateError;
use pascpp::{codegen, lexer, parser};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(version, about = "Translate a Pascal program into C++")]
struct Args {
  /// Input Pascal source file
  input: PathBuf,

  /// Output C++ file; defaults to the input path with a .cpp extension
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Print per-phase details while translating
  #[arg(short, long)]
  verbose: bool,
}

fn main() {
  let args = Args::parse();
  if let Err(err) = run(&args) {
    eprintln!("{err}");
    process::exit(1);
  }
}

fn run(args: &Args) -> Result<(), TranslateError> {
  let source =
    fs::read_to_string(&args.input).map_err(|err| TranslateError::read_input(&args.input, err))?;

  if args.verbose {
    banner("phase 1: lexical analysis");
    println!(
      "input: {} ({} characters)",
      args.input.display(),
      source.chars().count()
    );
  }
  let tokens = lexer::tokenize(&source)?;
  if args.verbose {
    println!("tokens: {}", tokens.len());
    for token in tokens.iter().take(20) {
      println!("  {token:?}");
    }
    banner("phase 2: parsing");
  }

  let program = parser::parse(tokens)?;
  if args.verbose {
    println!("program: {}", program.name);
    println!("variable declarations: {}", program.vars.len());
    println!("subprograms: {}", program.subprograms.len());
    banner("phase 3: code generation");
  }

  let cpp = codegen::generate(&program)?;
  if args.verbose {
    println!("emitted lines: {}", cpp.lines().count());
  }

  // The output file is written in one shot, and only once the whole
  // pipeline has succeeded: a failed run leaves no partial output behind.
  let output = args
    .output
    .clone()
    .unwrap_or_else(|| args.input.with_extension("cpp"));
  fs::write(&output, &cpp).map_err(|err| TranslateError::write_output(&output, err))?;

  println!(
    "translated {} -> {}",
    args.input.display(),
    output.display()
  );
  if args.verbose {
    println!();
    print!("{cpp}");
  }
  Ok(())
}

fn banner(title: &str) {
  println!("{}", "=".repeat(60));
  println!("{title}");
  println!("{}", "=".repeat(60));
}
