use crate::ast::{Expr, ExternFunctionDef, FunctionDef, Literal, ParamList, Program, Stmt};

/// Canonical AST-to-text renderer.
///
/// Printing is deterministic and whitespace-normalizing; re-parsing the
/// output yields a structurally equal tree. Two known lossy edges: strings
/// are re-wrapped in double quotes without re-escaping (a value containing a
/// quote will not survive a round trip), and `^` re-prints as the canonical
/// `**`.
#[derive(Default)]
pub struct AstPrinter {
    pretty: bool,
}

impl AstPrinter {
    pub fn new() -> AstPrinter {
        AstPrinter { pretty: false }
    }

    /// A printer that breaks function call arguments one per line, indented
    /// by call depth.
    pub fn pretty() -> AstPrinter {
        AstPrinter { pretty: true }
    }

    pub fn print_program(&self, program: &Program) -> String {
        program
            .0
            .iter()
            .map(|stmt| self.print_stmt(stmt))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            // All declaration keywords canonicalize to `var`
            Stmt::VarDecl { name, value } => {
                format!("var {} = {}", name, self.expr(value, 0))
            }
            Stmt::Fn(def) => self.function_def(def),
            Stmt::Extern(def) => self.extern_function_def(def),
            Stmt::Expr(expr) => self.expr(expr, 0),
        }
    }

    pub fn print_expr(&self, expr: &Expr) -> String {
        self.expr(expr, 0)
    }

    fn expr(&self, expr: &Expr, call_depth: usize) -> String {
        match expr {
            Expr::Literal(literal) => literal_text(literal),
            Expr::Grouping(inner) => format!("({})", self.expr(inner, call_depth)),
            Expr::Unary { op, right } => format!("{}{}", op, self.expr(right, call_depth)),
            Expr::Binary { left, op, right } => format!(
                "{} {} {}",
                self.expr(left, call_depth),
                op,
                self.expr(right, call_depth)
            ),
            Expr::Assign { name, value } => {
                format!("{} = {}", name, self.expr(value, call_depth))
            }
            Expr::Variable(name) => name.clone(),
            Expr::List(elements) => {
                let elements = elements
                    .iter()
                    .map(|element| self.expr(element, call_depth))
                    .collect::<Vec<_>>();
                format!("[{}]", elements.join(", "))
            }
            Expr::FunctionCall { name, args } => self.function_call(name, args, call_depth),
        }
    }

    fn function_call(&self, name: &str, args: &[Expr], call_depth: usize) -> String {
        let call_depth = call_depth + 1;
        if self.pretty {
            let indent = "    ".repeat(call_depth);
            let args = args
                .iter()
                .map(|arg| format!("{}{}", indent, self.expr(arg, call_depth)))
                .collect::<Vec<_>>();
            format!(
                "{}(\n{}\n{})",
                name,
                args.join(",\n"),
                "    ".repeat(call_depth - 1)
            )
        } else {
            let args = args
                .iter()
                .map(|arg| self.expr(arg, call_depth))
                .collect::<Vec<_>>();
            format!("{}({})", name, args.join(", "))
        }
    }

    fn function_def(&self, def: &FunctionDef) -> String {
        let mut code = format!(
            "fn {}({}) -> {} {{",
            def.name,
            self.param_list(&def.params),
            def.return_type
        );
        for stmt in &def.body {
            code.push('\n');
            code.push_str(&self.print_stmt(stmt));
        }
        code.push_str("\n}");
        code
    }

    fn extern_function_def(&self, def: &ExternFunctionDef) -> String {
        let mut code = format!(
            "extern fn {}({}) -> {}",
            def.name,
            self.param_list(&def.params),
            def.return_type
        );
        if !def.doc.is_empty() {
            // Only the first line of the doc string fits on a signature
            let first_line = def.doc.trim().lines().next().unwrap_or("");
            code.push_str(&format!(" // {}", first_line));
        }
        code
    }

    fn param_list(&self, params: &ParamList) -> String {
        params
            .0
            .iter()
            .map(|param| format!("{}: {}", param.name, param.type_annotation))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn literal_text(literal: &Literal) -> String {
    match literal {
        Literal::Int(value) => value.to_string(),
        // Debug formatting keeps a fractional part (`5.0`, not `5`) so the
        // text re-parses as a float
        Literal::Float(value) => format!("{:?}", value.into_inner()),
        Literal::Bool(value) => value.to_string(),
        // Not re-escaped; a quote inside the value will not round-trip
        Literal::Str(value) => format!("\"{}\"", value),
        Literal::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn reprint(code: &str) -> String {
        AstPrinter::new().print_program(&parse(code).unwrap())
    }

    #[test]
    fn test_parsing_and_printing() {
        let cases = [
            ("var x = 5", "var x = 5"),
            ("var x = 5\t\t\t\nadd(2,3  )", "var x = 5\nadd(2, 3)"),
            // Whitespace insensitivity
            (
                "extern fn add(x : int, y:int)->int",
                "extern fn add(x: int, y: int) -> int",
            ),
            (
                "extern fn add  (x : int, y:int) -> int",
                "extern fn add(x: int, y: int) -> int",
            ),
            (
                "fn add(x : int, y:int) -> int {}",
                "fn add(x: int, y: int) -> int {\n}",
            ),
            (
                "var x = [\"a\", [], 1, 2.0, null]",
                "var x = [\"a\", [], 1, 2.0, null]",
            ),
            ("var x = []; var z = 1;", "var x = []\nvar z = 1"),
            ("let x = true; const y = false", "var x = true\nvar y = false"),
            ("var x = -(1 + 2) * 3", "var x = -(1 + 2) * 3"),
            ("var x = 1 + 3 * 3", "var x = 1 + 3 * 3"),
            // The caret alias canonicalizes to `**`
            ("var x = 2 ^ 4", "var x = 2 ** 4"),
            ("var x = 2 ** -1", "var x = 2 ** -1"),
            // Scientific literals print as their computed value
            ("var x = 1e2", "var x = 100"),
            ("var x = 1E-2", "var x = 0.01"),
            ("x = y = 2", "x = y = 2"),
        ];
        for (code, expected) in cases {
            assert_eq!(expected, reprint(code), "for source {:?}", code);
        }
    }

    #[test]
    fn test_fn_body_prints_one_statement_per_line() {
        assert_eq!(
            "fn add(a: int, b: int) -> int {\nvar c = a + b\nc\n}",
            reprint("fn add(a: int, b: int) -> int { var c = a + b\nc }")
        );
    }

    #[test]
    fn test_extern_doc_renders_first_line() {
        use crate::ast::{ExternFunctionDef, Param, ParamList};
        let def = ExternFunctionDef::new(
            "meow",
            ParamList(vec![Param {
                name: "x".to_string(),
                type_annotation: "int".to_string(),
            }]),
            "int",
        )
        .with_doc("Feline greeting.\nSecond line is dropped.");
        assert_eq!(
            "extern fn meow(x: int) -> int // Feline greeting.",
            AstPrinter::new().print_stmt(&Stmt::Extern(def))
        );
    }

    #[test]
    fn test_pretty_printed_calls_indent_by_depth() {
        let program = parse("add(1, mul(2, 3))").unwrap();
        assert_eq!(
            "add(\n    1,\n    mul(\n        2,\n        3\n    )\n)",
            AstPrinter::pretty().print_program(&program)
        );
    }

    #[test]
    fn test_round_trip_is_structural_identity() {
        let sources = [
            "var x = 1 + 3 * 3",
            "var x = (1 + 1) * 3",
            "var x = [1.0, 2, \"3\"]",
            "extern fn add(x: int, y: int) -> int\nvar x = add(1, 2)",
            "var x = 2 ** -add(2, 2)",
            "x = --3",
        ];
        let printer = AstPrinter::new();
        for source in sources {
            let first = parse(source).unwrap();
            let reparsed = parse(&printer.print_program(&first)).unwrap();
            assert_eq!(first, reparsed, "for source {:?}", source);
        }
    }

    #[test]
    fn test_printing_is_idempotent() {
        let sources = [
            "var x = 5\t\t\t\nadd(2,3  )",
            "extern fn add(x : int, y:int)->int",
            "var x = 2 ^ 4",
            "fn add(x : int, y:int) -> int {}",
        ];
        for source in sources {
            let once = reprint(source);
            assert_eq!(once, reprint(&once), "for source {:?}", source);
        }
    }
}
