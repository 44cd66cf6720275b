//! Code generation: lower the parsed AST into a single C++ translation
//! unit.
//!
//! The emitter walks the tree depth-first and appends indented lines to a
//! buffer. Array bounds live in a stack of frames: the root frame holds
//! the program-level arrays, one frame is pushed per subprogram and popped
//! on exit, and lookups walk the frames innermost-out so a subprogram
//! array shadows a program-level one of the same name. Emission is
//! deterministic: identical input yields byte-identical output.

use crate::ast::*;
use crate::error::{TranslateError, TranslateResult};
use std::collections::{HashMap, HashSet};

const INDENT: &str = "    ";

/// Emit C++ for a program. Fails on array declarations whose bounds are
/// not integer literals and on malformed built-in calls.
pub fn generate(program: &Program) -> TranslateResult<String> {
  CppGen::new(program).run(program)
}

struct CppGen {
  lines: Vec<String>,
  indent: usize,
  /// Innermost frame last; values are flattened `(low, high)` bound pairs.
  frames: Vec<HashMap<String, Vec<(i64, i64)>>>,
  /// Lowercased names of user subprograms; these take precedence over the
  /// built-in routines of the same name.
  user_routines: HashSet<String>,
}

impl CppGen {
  fn new(program: &Program) -> Self {
    let user_routines = program
      .subprograms
      .iter()
      .map(|sub| {
        match sub {
          Subprogram::Procedure(p) => &p.name,
          Subprogram::Function(f) => &f.name,
        }
        .to_ascii_lowercase()
      })
      .collect();
    Self {
      lines: Vec::new(),
      indent: 0,
      frames: vec![HashMap::new()],
      user_routines,
    }
  }

  fn wln(&mut self, line: &str) {
    self.lines.push(format!("{}{line}", INDENT.repeat(self.indent)));
  }

  fn blank(&mut self) {
    self.lines.push(String::new());
  }

  fn run(mut self, program: &Program) -> TranslateResult<String> {
    self.wln("#include <iostream>");
    self.wln("#include <string>");
    self.wln("#include <cmath>");
    self.blank();
    self.wln("using namespace std;");
    self.blank();

    if self.needs_sqr_helper(program) {
      self.wln("template <class T> inline T pas_sqr(T v) { return v * v; }");
      self.blank();
    }

    for sub in &program.subprograms {
      self.gen_subprogram_decl(sub);
      self.blank();
    }

    self.wln("int main() {");
    self.indent += 1;
    for decl in &program.vars {
      self.gen_var_decl(decl)?;
    }
    if !program.vars.is_empty() {
      self.blank();
    }
    self.gen_stmt_list(&program.body, None)?;
    self.wln("return 0;");
    self.indent -= 1;
    self.wln("}");
    self.blank();

    for sub in &program.subprograms {
      self.gen_subprogram_impl(sub)?;
      self.blank();
    }

    Ok(self.lines.join("\n"))
  }

  // ----- Declarations -----

  fn gen_subprogram_decl(&mut self, sub: &Subprogram) {
    match sub {
      Subprogram::Procedure(p) => {
        let params = format_params(&p.params);
        self.wln(&format!("void {}({});", p.name, params));
      }
      Subprogram::Function(f) => {
        let ret = cpp_type(&f.return_type);
        let params = format_params(&f.params);
        self.wln(&format!("{ret} {}({});", f.name, params));
      }
    }
  }

  fn gen_subprogram_impl(&mut self, sub: &Subprogram) -> TranslateResult<()> {
    match sub {
      Subprogram::Procedure(p) => {
        let params = format_params(&p.params);
        self.wln(&format!("void {}({}) {{", p.name, params));
        self.indent += 1;
        self.frames.push(HashMap::new());

        self.register_param_arrays(&p.params)?;
        for decl in &p.locals {
          self.gen_var_decl(decl)?;
        }
        if !p.locals.is_empty() {
          self.blank();
        }
        self.gen_stmt_list(&p.body, None)?;

        self.frames.pop();
        self.indent -= 1;
        self.wln("}");
      }
      Subprogram::Function(f) => {
        let ret = cpp_type(&f.return_type);
        let params = format_params(&f.params);
        self.wln(&format!("{ret} {}({}) {{", f.name, params));
        self.indent += 1;
        self.frames.push(HashMap::new());

        self.register_param_arrays(&f.params)?;
        // The synthetic result variable precedes the user's locals; every
        // assignment to the function's own name is redirected to it.
        self.wln(&format!("{ret} {}_result;", f.name));
        for decl in &f.locals {
          self.gen_var_decl(decl)?;
        }
        self.blank();
        self.gen_stmt_list(&f.body, result_rewrite_name(f))?;
        self.wln(&format!("return {}_result;", f.name));

        self.frames.pop();
        self.indent -= 1;
        self.wln("}");
      }
    }
    Ok(())
  }

  fn gen_var_decl(&mut self, decl: &VarDecl) -> TranslateResult<()> {
    match &decl.ty {
      Type::Array { .. } => {
        for name in &decl.names {
          let dims = literal_dims(name, &decl.ty)?;
          let elem = cpp_type(&decl.ty);
          let sizes: String = dims
            .iter()
            .map(|(low, high)| format!("[{}]", high - low + 1))
            .collect();
          self.wln(&format!("{elem} {name}{sizes};"));
          self.register_array(name, dims);
        }
      }
      _ => {
        let ty = cpp_type(&decl.ty);
        for name in &decl.names {
          self.wln(&format!("{ty} {name};"));
        }
      }
    }
    Ok(())
  }

  fn register_param_arrays(&mut self, params: &[Param]) -> TranslateResult<()> {
    for param in params {
      if matches!(param.ty, Type::Array { .. }) {
        for name in &param.names {
          let dims = literal_dims(name, &param.ty)?;
          self.register_array(name, dims);
        }
      }
    }
    Ok(())
  }

  fn register_array(&mut self, name: &str, dims: Vec<(i64, i64)>) {
    if let Some(frame) = self.frames.last_mut() {
      frame.insert(name.to_string(), dims);
    }
  }

  fn lookup_array(&self, name: &str) -> Option<&Vec<(i64, i64)>> {
    self.frames.iter().rev().find_map(|frame| frame.get(name))
  }

  // ----- Statements -----

  fn gen_stmt_list(&mut self, stmts: &[Stmt], func: Option<&str>) -> TranslateResult<()> {
    for stmt in stmts {
      self.gen_stmt(stmt, func)?;
    }
    Ok(())
  }

  /// `func` names the enclosing function whose assignments are redirected
  /// to the result variable; `None` everywhere else.
  fn gen_stmt(&mut self, stmt: &Stmt, func: Option<&str>) -> TranslateResult<()> {
    match stmt {
      Stmt::Compound(stmts) => {
        self.wln("{");
        self.indent += 1;
        self.gen_stmt_list(stmts, func)?;
        self.indent -= 1;
        self.wln("}");
      }
      Stmt::Assign { target, value } => {
        let value_code = self.gen_expr(value)?;
        if let Some(fname) = func
          && target.name == fname
          && target.indices.is_empty()
        {
          self.wln(&format!("{fname}_result = {value_code};"));
        } else {
          let target_code = self.gen_variable(target)?;
          self.wln(&format!("{target_code} = {value_code};"));
        }
      }
      Stmt::If {
        cond,
        then_branch,
        else_branch,
      } => {
        let cond_code = self.gen_expr(cond)?;
        self.wln(&format!("if ({cond_code}) {{"));
        self.indent += 1;
        self.gen_stmt(then_branch, func)?;
        self.indent -= 1;
        if let Some(else_branch) = else_branch {
          self.wln("} else {");
          self.indent += 1;
          self.gen_stmt(else_branch, func)?;
          self.indent -= 1;
        }
        self.wln("}");
      }
      Stmt::While { cond, body } => {
        let cond_code = self.gen_expr(cond)?;
        self.wln(&format!("while ({cond_code}) {{"));
        self.indent += 1;
        self.gen_stmt(body, func)?;
        self.indent -= 1;
        self.wln("}");
      }
      Stmt::Repeat { body, until } => {
        // The until condition is inverted: Pascal repeats until it holds,
        // C++ repeats while it does not.
        let cond_code = self.gen_expr(until)?;
        self.wln("do {");
        self.indent += 1;
        self.gen_stmt_list(body, func)?;
        self.indent -= 1;
        self.wln(&format!("}} while (!({cond_code}));"));
      }
      Stmt::For {
        var,
        start,
        end,
        downto,
        body,
      } => {
        let start_code = self.gen_expr(start)?;
        let end_code = self.gen_expr(end)?;
        if *downto {
          self.wln(&format!(
            "for (int {var} = {start_code}; {var} >= {end_code}; {var}--) {{"
          ));
        } else {
          self.wln(&format!(
            "for (int {var} = {start_code}; {var} <= {end_code}; {var}++) {{"
          ));
        }
        self.indent += 1;
        self.gen_stmt(body, func)?;
        self.indent -= 1;
        self.wln("}");
      }
      Stmt::Case {
        scrutinee,
        branches,
        else_branch,
      } => {
        let scrutinee_code = self.gen_expr(scrutinee)?;
        self.wln(&format!("switch ({scrutinee_code}) {{"));
        self.indent += 1;
        for branch in branches {
          for value in &branch.values {
            let value_code = self.gen_expr(value)?;
            self.wln(&format!("case {value_code}:"));
          }
          self.indent += 1;
          self.gen_stmt(&branch.body, func)?;
          self.wln("break;");
          self.indent -= 1;
        }
        if let Some(else_branch) = else_branch {
          self.wln("default:");
          self.indent += 1;
          self.gen_stmt(else_branch, func)?;
          self.indent -= 1;
        }
        self.indent -= 1;
        self.wln("}");
      }
      Stmt::ProcCall { name, args } => self.gen_proc_call(name, args)?,
      Stmt::Empty => {}
    }
    Ok(())
  }

  fn gen_proc_call(&mut self, name: &str, args: &[Expr]) -> TranslateResult<()> {
    let lower = name.to_ascii_lowercase();
    if !self.user_routines.contains(&lower) {
      match lower.as_str() {
        "write" | "writeln" => {
          let parts = self.gen_expr_list(args)?;
          let joined = parts.join(" << ");
          if lower == "writeln" {
            if joined.is_empty() {
              self.wln("cout << endl;");
            } else {
              self.wln(&format!("cout << {joined} << endl;"));
            }
          } else if !joined.is_empty() {
            self.wln(&format!("cout << {joined};"));
          }
          return Ok(());
        }
        "read" | "readln" => {
          if !args.is_empty() {
            let parts = self.gen_expr_list(args)?;
            self.wln(&format!("cin >> {};", parts.join(" >> ")));
          }
          return Ok(());
        }
        "break" => {
          self.wln("break;");
          return Ok(());
        }
        "continue" => {
          self.wln("continue;");
          return Ok(());
        }
        _ => {}
      }
    }

    let parts = self.gen_expr_list(args)?;
    self.wln(&format!("{name}({});", parts.join(", ")));
    Ok(())
  }

  // ----- Expressions -----

  fn gen_expr_list(&mut self, exprs: &[Expr]) -> TranslateResult<Vec<String>> {
    exprs.iter().map(|e| self.gen_expr(e)).collect()
  }

  /// Every binary operation is fully parenthesised, so precedence in the
  /// output cannot differ from the tree.
  fn gen_expr(&mut self, expr: &Expr) -> TranslateResult<String> {
    let code = match expr {
      Expr::Binary { op, left, right } => {
        let l = self.gen_expr(left)?;
        let r = self.gen_expr(right)?;
        match op {
          // Pascal `/` always yields a real; the cast forces C++ to agree
          // even when both operands are integers.
          BinOp::Divide => format!("((double){l} / {r})"),
          _ => format!("({l} {} {r})", cpp_op(*op)),
        }
      }
      Expr::Unary { op, operand } => {
        let inner = self.gen_expr(operand)?;
        let op = match op {
          UnOp::Plus => "+",
          UnOp::Neg => "-",
          UnOp::Not => "!",
        };
        format!("{op}({inner})")
      }
      Expr::Variable(var) => self.gen_variable(var)?,
      Expr::Int(value) => value.to_string(),
      Expr::Real(value) => format_real(*value),
      Expr::Str(value) => format!("\"{value}\""),
      Expr::Char(value) => format!("'{value}'"),
      Expr::Bool(value) => value.to_string(),
      Expr::Call { name, args } => self.gen_call(name, args)?,
    };
    Ok(code)
  }

  /// Emit a variable reference, rebasing each index by its declared lower
  /// bound when that bound is a non-zero literal.
  fn gen_variable(&mut self, var: &Variable) -> TranslateResult<String> {
    if var.indices.is_empty() {
      return Ok(var.name.clone());
    }

    let dims = self.lookup_array(&var.name).cloned();
    let mut parts = Vec::new();
    for (i, index) in var.indices.iter().enumerate() {
      let code = self.gen_expr(index)?;
      let rebased = match dims.as_ref().and_then(|d| d.get(i)) {
        Some((low, _)) if *low != 0 => format!("({code} - {low})"),
        _ => code,
      };
      parts.push(rebased);
    }
    Ok(format!("{}[{}]", var.name, parts.join("][")))
  }

  fn gen_call(&mut self, name: &str, args: &[Expr]) -> TranslateResult<String> {
    let lower = name.to_ascii_lowercase();
    if !self.user_routines.contains(&lower) {
      match lower.as_str() {
        "sqr" => {
          let arg = args
            .first()
            .ok_or_else(|| TranslateError::codegen("sqr expects an argument"))?;
          let code = self.gen_expr(arg)?;
          return Ok(if is_trivial(arg) {
            format!("({code} * {code})")
          } else {
            format!("pas_sqr({code})")
          });
        }
        "length" => {
          let arg = args
            .first()
            .ok_or_else(|| TranslateError::codegen("length expects an argument"))?;
          let code = self.gen_expr(arg)?;
          return Ok(format!("{code}.length()"));
        }
        "abs" | "sqrt" | "sin" | "cos" | "exp" | "ln" => {
          let target = if lower == "ln" { "log" } else { lower.as_str() };
          let parts = self.gen_expr_list(args)?;
          return Ok(format!("{target}({})", parts.join(", ")));
        }
        _ => {}
      }
    }

    let parts = self.gen_expr_list(args)?;
    Ok(format!("{name}({})", parts.join(", ")))
  }

  /// Pre-scan for a `sqr` call whose argument is not trivially
  /// re-evaluable; only then does the preamble carry the helper.
  fn needs_sqr_helper(&self, program: &Program) -> bool {
    let in_body = |stmts: &[Stmt]| stmts.iter().any(|s| self.stmt_has_sqr(s));
    in_body(&program.body)
      || program.subprograms.iter().any(|sub| match sub {
        Subprogram::Procedure(p) => in_body(&p.body),
        Subprogram::Function(f) => in_body(&f.body),
      })
  }

  fn stmt_has_sqr(&self, stmt: &Stmt) -> bool {
    match stmt {
      Stmt::Compound(stmts) => stmts.iter().any(|s| self.stmt_has_sqr(s)),
      Stmt::Assign { target, value } => {
        target.indices.iter().any(|e| self.expr_has_sqr(e)) || self.expr_has_sqr(value)
      }
      Stmt::If {
        cond,
        then_branch,
        else_branch,
      } => {
        self.expr_has_sqr(cond)
          || self.stmt_has_sqr(then_branch)
          || else_branch.as_deref().is_some_and(|s| self.stmt_has_sqr(s))
      }
      Stmt::While { cond, body } => self.expr_has_sqr(cond) || self.stmt_has_sqr(body),
      Stmt::Repeat { body, until } => {
        body.iter().any(|s| self.stmt_has_sqr(s)) || self.expr_has_sqr(until)
      }
      Stmt::For {
        start, end, body, ..
      } => self.expr_has_sqr(start) || self.expr_has_sqr(end) || self.stmt_has_sqr(body),
      Stmt::Case {
        scrutinee,
        branches,
        else_branch,
      } => {
        self.expr_has_sqr(scrutinee)
          || branches.iter().any(|b| {
            b.values.iter().any(|e| self.expr_has_sqr(e)) || self.stmt_has_sqr(&b.body)
          })
          || else_branch.as_deref().is_some_and(|s| self.stmt_has_sqr(s))
      }
      Stmt::ProcCall { args, .. } => args.iter().any(|e| self.expr_has_sqr(e)),
      Stmt::Empty => false,
    }
  }

  fn expr_has_sqr(&self, expr: &Expr) -> bool {
    match expr {
      Expr::Binary { left, right, .. } => self.expr_has_sqr(left) || self.expr_has_sqr(right),
      Expr::Unary { operand, .. } => self.expr_has_sqr(operand),
      Expr::Variable(var) => var.indices.iter().any(|e| self.expr_has_sqr(e)),
      Expr::Call { name, args } => {
        let is_builtin_sqr =
          name.eq_ignore_ascii_case("sqr") && !self.user_routines.contains("sqr");
        (is_builtin_sqr && args.first().is_some_and(|a| !is_trivial(a)))
          || args.iter().any(|e| self.expr_has_sqr(e))
      }
      _ => false,
    }
  }
}

/// Assignments to the function's own name are redirected to the result
/// variable unless a parameter or local shadows that name.
fn result_rewrite_name(f: &FuncDecl) -> Option<&str> {
  let shadowed = f
    .params
    .iter()
    .flat_map(|p| &p.names)
    .chain(f.locals.iter().flat_map(|d| &d.names))
    .any(|n| *n == f.name);
  if shadowed { None } else { Some(&f.name) }
}

fn cpp_type(ty: &Type) -> &'static str {
  match ty {
    Type::Primitive(p) => match p {
      Primitive::Integer => "int",
      Primitive::Real => "double",
      Primitive::Boolean => "bool",
      Primitive::Char => "char",
      Primitive::Str => "string",
    },
    Type::Array { element, .. } => cpp_type(element),
  }
}

fn cpp_op(op: BinOp) -> &'static str {
  match op {
    BinOp::Add => "+",
    BinOp::Sub => "-",
    BinOp::Mul => "*",
    BinOp::Divide => "/",
    BinOp::Div => "/",
    BinOp::Mod => "%",
    BinOp::And => "&&",
    BinOp::Or => "||",
    BinOp::Xor => "^",
    BinOp::Eq => "==",
    BinOp::Ne => "!=",
    BinOp::Lt => "<",
    BinOp::Le => "<=",
    BinOp::Gt => ">",
    BinOp::Ge => ">=",
  }
}

/// Array parameters decay to pointers, so `by_ref` is meaningless for
/// them and the element type carries an empty bracket pair instead.
fn format_params(params: &[Param]) -> String {
  let mut parts = Vec::new();
  for param in params {
    let ty = cpp_type(&param.ty);
    for name in &param.names {
      if matches!(param.ty, Type::Array { .. }) {
        parts.push(format!("{ty} {name}[]"));
      } else if param.by_ref {
        parts.push(format!("{ty}& {name}"));
      } else {
        parts.push(format!("{ty} {name}"));
      }
    }
  }
  parts.join(", ")
}

/// Collect the flattened `(low, high)` bounds of an array type. Bounds
/// that are not integer literals are rejected: a guessed size would emit a
/// program that compiles but is wrong.
fn literal_dims(name: &str, ty: &Type) -> TranslateResult<Vec<(i64, i64)>> {
  let mut dims = Vec::new();
  let mut current = ty;
  while let Type::Array {
    element,
    dimensions,
  } = current
  {
    for (low, high) in dimensions {
      match (low, high) {
        (Expr::Int(l), Expr::Int(h)) => dims.push((*l, *h)),
        _ => {
          return Err(TranslateError::codegen(format!(
            "array '{name}' has non-constant bounds"
          )));
        }
      }
    }
    current = element.as_ref();
  }
  Ok(dims)
}

/// Literals and scalar variables may be re-evaluated freely; anything
/// else could carry side effects.
fn is_trivial(expr: &Expr) -> bool {
  match expr {
    Expr::Int(_) | Expr::Real(_) | Expr::Char(_) | Expr::Bool(_) => true,
    Expr::Variable(var) => var.indices.is_empty(),
    _ => false,
  }
}

/// Render an f64 so C++ still reads it as a floating literal: whole
/// values get a forced `.0` suffix.
fn format_real(value: f64) -> String {
  let text = value.to_string();
  if text.contains('.') || text.contains('e') || text.contains('E') {
    text
  } else {
    format!("{text}.0")
  }
}
