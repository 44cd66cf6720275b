//! Drives the compiled binary end to end through the filesystem.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn temp_path(name: &str) -> PathBuf {
  std::env::temp_dir().join(format!("pascpp-{}-{name}", std::process::id()))
}

fn run(args: &[&std::ffi::OsStr]) -> Output {
  Command::new(env!("CARGO_BIN_EXE_pascpp"))
    .args(args)
    .output()
    .expect("failed to run pascpp")
}

#[test]
fn writes_output_next_to_the_input_by_default() {
  let input = temp_path("hello.pas");
  let expected = input.with_extension("cpp");
  fs::write(&input, "program H;\nbegin\n  writeln('hi')\nend.\n").expect("write input");

  let out = run(&[input.as_os_str()]);
  assert!(
    out.status.success(),
    "stderr: {}",
    String::from_utf8_lossy(&out.stderr)
  );
  let cpp = fs::read_to_string(&expected).expect("output file missing");
  assert!(cpp.contains("cout << \"hi\" << endl;"));
  assert!(cpp.ends_with('\n'));

  fs::remove_file(&input).ok();
  fs::remove_file(&expected).ok();
}

#[test]
fn honours_an_explicit_output_path() {
  let input = temp_path("explicit.pas");
  let output = temp_path("explicit-out.cc");
  fs::write(&input, "program E;\nbegin\n  writeln(42)\nend.\n").expect("write input");

  let out = run(&[input.as_os_str(), "-o".as_ref(), output.as_os_str()]);
  assert!(
    out.status.success(),
    "stderr: {}",
    String::from_utf8_lossy(&out.stderr)
  );
  let cpp = fs::read_to_string(&output).expect("output file missing");
  assert!(cpp.contains("cout << 42 << endl;"));

  fs::remove_file(&input).ok();
  fs::remove_file(&output).ok();
}

#[test]
fn missing_input_exits_nonzero_with_io_error() {
  let input = temp_path("does-not-exist.pas");
  let out = run(&[input.as_os_str()]);
  assert!(!out.status.success());
  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("i/o error"), "stderr: {stderr}");
}

#[test]
fn parse_failure_leaves_no_output_behind() {
  let input = temp_path("broken.pas");
  let expected = input.with_extension("cpp");
  fs::write(&input, "program B\nbegin end.\n").expect("write input");

  let out = run(&[input.as_os_str()]);
  assert!(!out.status.success());
  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("parser error"), "stderr: {stderr}");
  assert!(!expected.exists(), "failed run must not write output");

  fs::remove_file(&input).ok();
}

#[test]
fn verbose_mode_reports_the_phases() {
  let input = temp_path("verbose.pas");
  let expected = input.with_extension("cpp");
  fs::write(&input, "program V;\nbegin\n  writeln('v')\nend.\n").expect("write input");

  let out = run(&[input.as_os_str(), "--verbose".as_ref()]);
  assert!(
    out.status.success(),
    "stderr: {}",
    String::from_utf8_lossy(&out.stderr)
  );
  let stdout = String::from_utf8_lossy(&out.stdout);
  assert!(stdout.contains("phase 1: lexical analysis"), "{stdout}");
  assert!(stdout.contains("phase 2: parsing"), "{stdout}");
  assert!(stdout.contains("phase 3: code generation"), "{stdout}");
  assert!(stdout.contains("program: V"), "{stdout}");
  assert!(stdout.contains("tokens:"), "{stdout}");
  assert!(stdout.contains("int main() {"), "{stdout}");

  fs::remove_file(&input).ok();
  fs::remove_file(&expected).ok();
}
