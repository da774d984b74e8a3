//! Recursive-descent parser for the language.
//!
//! Grammar, lowest to highest precedence:
//!
//! ```text
//! program    := statement+
//! statement  := var_decl | fn_decl | extern_decl | expr   (optional ';')
//! var_decl   := ("var" | "let" | "const") NAME "=" expr
//! fn_decl    := "fn" NAME "(" [params] ")" "->" TYPE "{" statement* "}"
//! extern_decl:= "extern" "fn" NAME "(" [params] ")" "->" TYPE
//! params     := param ("," param)* ; param := NAME ":" TYPE
//! expr       := assignment
//! assignment := NAME "=" assignment | term
//! term       := factor (("+" | "-") factor)*
//! factor     := unary (("*" | "/" | "%") unary)*
//! unary      := ("+" | "-") unary | power
//! power      := call (("**" | "^") unary)?
//! call       := NAME "(" [args] ")" | NAME | primary
//! primary    := number | string | list | "true" | "false" | "null" | "(" expr ")"
//! ```
//!
//! There is no error recovery: the first mismatch fails the whole parse.

use thiserror::Error;

use crate::ast::*;
use crate::scanner::{Data, Keyword, Pos, ScanError, Scanner, Symbol, Token};

#[derive(Error, Debug)]
pub enum SyntaxError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("{pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: Pos,
        expected: &'static str,
        found: String,
    },
    #[error("{pos}: invalid assignment target")]
    InvalidAssignment { pos: Pos },
    #[error("{pos}: `{symbol}` is not a valid operator")]
    UnknownOperator { pos: Pos, symbol: Symbol },
    #[error("expected at least one statement")]
    EmptyProgram,
}

/// Parse source text into a program. Stateless and reentrant; construct
/// nothing, share nothing.
pub fn parse(source: &str) -> Result<Program, SyntaxError> {
    let mut tokens = Tokens::new(Scanner::new(source));
    let mut stmts = Vec::new();
    while !tokens.at_eof()? {
        stmts.push(statement(&mut tokens)?);
    }
    if stmts.is_empty() {
        return Err(SyntaxError::EmptyProgram);
    }
    Ok(Program(stmts))
}

// The grammar admits only the operator symbol sets below; node construction
// re-checks membership so a stray symbol can never reach the AST.
const TERM_SYMBOLS: [Symbol; 2] = [Symbol::Plus, Symbol::Minus];

const FACTOR_SYMBOLS: [Symbol; 3] = [Symbol::Star, Symbol::Slash, Symbol::Percent];

const UNARY_SYMBOLS: [Symbol; 2] = [Symbol::Plus, Symbol::Minus];

const POWER_SYMBOLS: [Symbol; 2] = [Symbol::StarStar, Symbol::Caret];

fn binary_op_from_symbol(symbol: Symbol, pos: Pos) -> Result<BinaryOp, SyntaxError> {
    match symbol {
        Symbol::Plus => Ok(BinaryOp::Add),
        Symbol::Minus => Ok(BinaryOp::Sub),
        Symbol::Star => Ok(BinaryOp::Mul),
        Symbol::Slash => Ok(BinaryOp::Div),
        Symbol::Percent => Ok(BinaryOp::Mod),
        // Both spellings construct the same power operation
        Symbol::StarStar | Symbol::Caret => Ok(BinaryOp::Pow),
        symbol => Err(SyntaxError::UnknownOperator { pos, symbol }),
    }
}

fn unary_op_from_symbol(symbol: Symbol, pos: Pos) -> Result<UnaryOp, SyntaxError> {
    match symbol {
        Symbol::Plus => Ok(UnaryOp::Plus),
        Symbol::Minus => Ok(UnaryOp::Minus),
        symbol => Err(SyntaxError::UnknownOperator { pos, symbol }),
    }
}

fn statement(tokens: &mut Tokens<'_>) -> Result<Stmt, SyntaxError> {
    let stmt = if tokens.next_if_any_keyword(&[Keyword::Var, Keyword::Let, Keyword::Const]) {
        finish_var_decl(tokens)?
    } else if tokens.next_if_keyword(Keyword::Extern) {
        tokens.expect_keyword(Keyword::Fn, "`fn` after `extern`")?;
        Stmt::Extern(finish_extern_decl(tokens)?)
    } else if tokens.next_if_keyword(Keyword::Fn) {
        finish_fn_decl(tokens)?
    } else {
        Stmt::Expr(expr(tokens)?)
    };
    // Statements may optionally be terminated by a semicolon
    tokens.next_if_symbol(Symbol::Semicolon);
    Ok(stmt)
}

fn finish_var_decl(tokens: &mut Tokens<'_>) -> Result<Stmt, SyntaxError> {
    // Copy the identifier out of the source into the AST
    let name = tokens.expect_identifier("a variable name")?.to_string();
    tokens.expect_symbol(Symbol::Equal, "`=` after a variable name")?;
    let value = expr(tokens)?;
    Ok(Stmt::VarDecl { name, value })
}

fn finish_extern_decl(tokens: &mut Tokens<'_>) -> Result<ExternFunctionDef, SyntaxError> {
    let name = tokens.expect_identifier("a function name")?.to_string();
    let params = parenthesized_params(tokens)?;
    tokens.expect_symbol(Symbol::Arrow, "`->` before the return type")?;
    let return_type = tokens.expect_identifier("a return type")?.to_string();
    Ok(ExternFunctionDef::new(&name, params, &return_type))
}

fn finish_fn_decl(tokens: &mut Tokens<'_>) -> Result<Stmt, SyntaxError> {
    let name = tokens.expect_identifier("a function name")?.to_string();
    let params = parenthesized_params(tokens)?;
    tokens.expect_symbol(Symbol::Arrow, "`->` before the return type")?;
    let return_type = tokens.expect_identifier("a return type")?.to_string();
    tokens.expect_symbol(Symbol::LeftBrace, "`{` to open the function body")?;
    let mut body = Vec::new();
    while !tokens.peek_is_symbol(Symbol::RightBrace)? {
        body.push(statement(tokens)?);
    }
    tokens.expect_symbol(Symbol::RightBrace, "`}` after the function body")?;
    Ok(Stmt::Fn(FunctionDef {
        name,
        params,
        body,
        return_type,
    }))
}

fn parenthesized_params(tokens: &mut Tokens<'_>) -> Result<ParamList, SyntaxError> {
    tokens.expect_symbol(Symbol::LeftParen, "`(` after the function name")?;
    let mut params = Vec::new();
    if !tokens.next_if_symbol(Symbol::RightParen) {
        loop {
            let name = tokens.expect_identifier("a parameter name")?.to_string();
            tokens.expect_symbol(Symbol::Colon, "`:` after a parameter name")?;
            let type_annotation = tokens.expect_identifier("a parameter type")?.to_string();
            params.push(Param {
                name,
                type_annotation,
            });
            if !tokens.next_if_symbol(Symbol::Comma) {
                break;
            }
        }
        tokens.expect_symbol(Symbol::RightParen, "`)` after the parameter list")?;
    }
    Ok(ParamList(params))
}

fn expr(tokens: &mut Tokens<'_>) -> Result<Expr, SyntaxError> {
    assignment(tokens)
}

fn assignment(tokens: &mut Tokens<'_>) -> Result<Expr, SyntaxError> {
    let lhs = term(tokens)?;
    if let Some(pos) = tokens.next_if_symbol_pos(Symbol::Equal) {
        let value = Box::new(assignment(tokens)?);
        return match lhs {
            Expr::Variable(name) => Ok(Expr::Assign { name, value }),
            _ => Err(SyntaxError::InvalidAssignment { pos }),
        };
    }
    Ok(lhs)
}

fn term(tokens: &mut Tokens<'_>) -> Result<Expr, SyntaxError> {
    left_recursive_binary_op(tokens, &TERM_SYMBOLS, factor)
}

fn factor(tokens: &mut Tokens<'_>) -> Result<Expr, SyntaxError> {
    left_recursive_binary_op(tokens, &FACTOR_SYMBOLS, unary)
}

fn unary(tokens: &mut Tokens<'_>) -> Result<Expr, SyntaxError> {
    if let Some((symbol, pos)) = tokens.next_if_any_symbol(&UNARY_SYMBOLS) {
        let op = unary_op_from_symbol(symbol, pos)?;
        let right = Box::new(unary(tokens)?);
        Ok(Expr::Unary { op, right })
    } else {
        power(tokens)
    }
}

// The right operand recurses into unary, which makes the operator
// right-associative and lets exponents carry a sign: 2 ** -1.
fn power(tokens: &mut Tokens<'_>) -> Result<Expr, SyntaxError> {
    let lhs = call(tokens)?;
    if let Some((symbol, pos)) = tokens.next_if_any_symbol(&POWER_SYMBOLS) {
        let op = binary_op_from_symbol(symbol, pos)?;
        let right = Box::new(unary(tokens)?);
        return Ok(Expr::Binary {
            left: Box::new(lhs),
            op,
            right,
        });
    }
    Ok(lhs)
}

fn call(tokens: &mut Tokens<'_>) -> Result<Expr, SyntaxError> {
    if let Some(name) = tokens.next_if_identifier() {
        let name = name.to_string();
        if tokens.next_if_symbol(Symbol::LeftParen) {
            let args = finish_args(tokens, Symbol::RightParen, "`)` after the arguments")?;
            return Ok(Expr::FunctionCall { name, args });
        }
        return Ok(Expr::Variable(name));
    }
    primary(tokens)
}

fn finish_args(
    tokens: &mut Tokens<'_>,
    closing: Symbol,
    expected: &'static str,
) -> Result<Vec<Expr>, SyntaxError> {
    let mut args = Vec::new();
    if tokens.next_if_symbol(closing) {
        return Ok(args);
    }
    loop {
        args.push(expr(tokens)?);
        if !tokens.next_if_symbol(Symbol::Comma) {
            break;
        }
    }
    tokens.expect_symbol(closing, expected)?;
    Ok(args)
}

fn primary(tokens: &mut Tokens<'_>) -> Result<Expr, SyntaxError> {
    let token = tokens.next()?;
    match token.data {
        Data::Keyword(Keyword::True) => Ok(Expr::Literal(Literal::Bool(true))),
        Data::Keyword(Keyword::False) => Ok(Expr::Literal(Literal::Bool(false))),
        Data::Keyword(Keyword::Null) => Ok(Expr::Literal(Literal::Null)),
        Data::Int(value) => Ok(Expr::Literal(Literal::Int(value))),
        Data::Float(value) => Ok(Expr::Literal(Literal::Float(value.into()))),
        Data::Str(string) => Ok(Expr::Literal(Literal::Str(string.to_string()))),
        Data::Symbol(Symbol::LeftParen) => {
            let inner = expr(tokens)?;
            tokens.expect_symbol(Symbol::RightParen, "`)` to close the group")?;
            Ok(Expr::Grouping(Box::new(inner)))
        }
        Data::Symbol(Symbol::LeftBracket) => {
            let elements = finish_args(tokens, Symbol::RightBracket, "`]` after the list")?;
            Ok(Expr::List(elements))
        }
        data => Err(SyntaxError::UnexpectedToken {
            pos: token.pos,
            expected: "a number, string, list, `true`, `false`, `null` or `(`",
            found: data.to_string(),
        }),
    }
}

// This encapsulates the recursive parsing of levels of left-associative
// binary operators: a set of matching symbols plus a higher precedence parser.
fn left_recursive_binary_op<F>(
    tokens: &mut Tokens<'_>,
    symbols: &[Symbol],
    higher_precedence: F,
) -> Result<Expr, SyntaxError>
where
    F: Fn(&mut Tokens<'_>) -> Result<Expr, SyntaxError>,
{
    let mut expr = higher_precedence(tokens)?;
    while let Some((symbol, pos)) = tokens.next_if_any_symbol(symbols) {
        let op = binary_op_from_symbol(symbol, pos)?;
        let right = Box::new(higher_precedence(tokens)?);
        expr = Expr::Binary {
            left: Box::new(expr),
            op,
            right,
        };
    }
    Ok(expr)
}

/// Peekable token stream over the scanner with the expect/next_if helpers
/// the grammar functions lean on.
struct Tokens<'src> {
    iter: std::iter::Peekable<Scanner<'src>>,
}

impl<'src> Tokens<'src> {
    fn new(scanner: Scanner<'src>) -> Tokens<'src> {
        Tokens {
            iter: scanner.peekable(),
        }
    }

    fn next(&mut self) -> Result<Token<'src>, SyntaxError> {
        match self.iter.next() {
            Some(Ok(token)) => Ok(token),
            Some(Err(err)) => Err(err.into()),
            // The scanner always yields Eof before running dry, and Eof
            // itself fails every expectation, so this is unreachable in
            // practice; report it as an unexpected end anyway.
            None => Err(SyntaxError::UnexpectedToken {
                pos: Pos {
                    line: 0,
                    offset_in_line: 0,
                },
                expected: "a token",
                found: "end of input".to_string(),
            }),
        }
    }

    fn peek(&mut self) -> Result<&Token<'src>, SyntaxError> {
        match self.iter.peek() {
            Some(Ok(token)) => Ok(token),
            Some(Err(err)) => Err(err.clone().into()),
            None => Err(SyntaxError::UnexpectedToken {
                pos: Pos {
                    line: 0,
                    offset_in_line: 0,
                },
                expected: "a token",
                found: "end of input".to_string(),
            }),
        }
    }

    fn at_eof(&mut self) -> Result<bool, SyntaxError> {
        Ok(self.peek()?.data == Data::Eof)
    }

    fn peek_is_symbol(&mut self, symbol: Symbol) -> Result<bool, SyntaxError> {
        Ok(self.peek()?.data == symbol)
    }

    fn next_if_symbol(&mut self, symbol: Symbol) -> bool {
        self.next_if_symbol_pos(symbol).is_some()
    }

    fn next_if_symbol_pos(&mut self, symbol: Symbol) -> Option<Pos> {
        self.iter
            .next_if(|next| matches!(next, Ok(token) if token.data == symbol))
            .map(|next| next.expect("checked by next_if").pos)
    }

    fn next_if_any_symbol(&mut self, symbols: &[Symbol]) -> Option<(Symbol, Pos)> {
        let found = match self.iter.peek() {
            Some(Ok(Token {
                data: Data::Symbol(symbol),
                ..
            })) if symbols.contains(symbol) => *symbol,
            _ => return None,
        };
        let token = self.iter.next().expect("peeked").expect("peeked");
        Some((found, token.pos))
    }

    fn next_if_keyword(&mut self, keyword: Keyword) -> bool {
        self.iter
            .next_if(|next| matches!(next, Ok(token) if token.data == keyword))
            .is_some()
    }

    fn next_if_any_keyword(&mut self, keywords: &[Keyword]) -> bool {
        keywords.iter().any(|keyword| self.next_if_keyword(*keyword))
    }

    fn next_if_identifier(&mut self) -> Option<&'src str> {
        match self.iter.peek() {
            Some(Ok(Token {
                data: Data::Identifier(identifier),
                ..
            })) => {
                let identifier = *identifier;
                let _ = self.iter.next();
                Some(identifier)
            }
            _ => None,
        }
    }

    fn expect_symbol(&mut self, symbol: Symbol, expected: &'static str) -> Result<Pos, SyntaxError> {
        let token = self.next()?;
        if token.data == symbol {
            Ok(token.pos)
        } else {
            Err(SyntaxError::UnexpectedToken {
                pos: token.pos,
                expected,
                found: token.data.to_string(),
            })
        }
    }

    fn expect_keyword(
        &mut self,
        keyword: Keyword,
        expected: &'static str,
    ) -> Result<Pos, SyntaxError> {
        let token = self.next()?;
        if token.data == keyword {
            Ok(token.pos)
        } else {
            Err(SyntaxError::UnexpectedToken {
                pos: token.pos,
                expected,
                found: token.data.to_string(),
            })
        }
    }

    fn expect_identifier(&mut self, expected: &'static str) -> Result<&'src str, SyntaxError> {
        let token = self.next()?;
        match token.data {
            Data::Identifier(identifier) => Ok(identifier),
            data => Err(SyntaxError::UnexpectedToken {
                pos: token.pos,
                expected,
                found: data.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int(value: i64) -> Expr {
        Expr::Literal(Literal::Int(value))
    }

    #[test]
    fn test_precedence_tree() {
        // 1 + 3 * 3 parses as 1 + (3 * 3)
        let program = parse("1 + 3 * 3").unwrap();
        assert_eq!(
            Program(vec![Stmt::Expr(Expr::Binary {
                left: Box::new(int(1)),
                op: BinaryOp::Add,
                right: Box::new(Expr::Binary {
                    left: Box::new(int(3)),
                    op: BinaryOp::Mul,
                    right: Box::new(int(3)),
                }),
            })]),
            program
        );
    }

    #[test]
    fn test_power_binds_tighter_than_factor() {
        // 2 ** 3 * 4 parses as (2 ** 3) * 4
        let program = parse("2 ** 3 * 4").unwrap();
        assert_eq!(
            Program(vec![Stmt::Expr(Expr::Binary {
                left: Box::new(Expr::Binary {
                    left: Box::new(int(2)),
                    op: BinaryOp::Pow,
                    right: Box::new(int(3)),
                }),
                op: BinaryOp::Mul,
                right: Box::new(int(4)),
            })]),
            program
        );
    }

    #[test]
    fn test_power_alias_and_signed_exponent() {
        let starred = parse("2 ** -1").unwrap();
        let caret = parse("2 ^ -1").unwrap();
        assert_eq!(starred, caret);
        assert_eq!(
            Program(vec![Stmt::Expr(Expr::Binary {
                left: Box::new(int(2)),
                op: BinaryOp::Pow,
                right: Box::new(Expr::Unary {
                    op: UnaryOp::Minus,
                    right: Box::new(int(1)),
                }),
            })]),
            starred
        );
    }

    #[test]
    fn test_stacked_unary() {
        let program = parse("--3").unwrap();
        assert_eq!(
            Program(vec![Stmt::Expr(Expr::Unary {
                op: UnaryOp::Minus,
                right: Box::new(Expr::Unary {
                    op: UnaryOp::Minus,
                    right: Box::new(int(3)),
                }),
            })]),
            program
        );
    }

    #[test]
    fn test_var_keywords_are_equivalent() {
        let expected = Program(vec![Stmt::VarDecl {
            name: "x".to_string(),
            value: int(1),
        }]);
        assert_eq!(expected, parse("var x = 1").unwrap());
        assert_eq!(expected, parse("let x = 1").unwrap());
        assert_eq!(expected, parse("const x = 1;").unwrap());
    }

    #[test]
    fn test_assignment_chain() {
        let program = parse("x = y = 2").unwrap();
        assert_eq!(
            Program(vec![Stmt::Expr(Expr::Assign {
                name: "x".to_string(),
                value: Box::new(Expr::Assign {
                    name: "y".to_string(),
                    value: Box::new(int(2)),
                }),
            })]),
            program
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert!(matches!(
            parse("add(1) = 2").unwrap_err(),
            SyntaxError::InvalidAssignment { .. }
        ));
    }

    #[test]
    fn test_parse_call_args() {
        let program = parse("print_num(\"12.3\", x)").unwrap();
        assert_eq!(
            Program(vec![Stmt::Expr(Expr::FunctionCall {
                name: "print_num".to_string(),
                args: vec![
                    Expr::Literal(Literal::Str("12.3".to_string())),
                    Expr::Variable("x".to_string()),
                ],
            })]),
            program
        );
    }

    #[test]
    fn test_list_literal() {
        let program = parse("[1, [], \"a\"]").unwrap();
        assert_eq!(
            Program(vec![Stmt::Expr(Expr::List(vec![
                int(1),
                Expr::List(vec![]),
                Expr::Literal(Literal::Str("a".to_string())),
            ]))]),
            program
        );
    }

    #[test]
    fn test_extern_fn_decl() {
        let program = parse("extern fn meow(x: int, y: int) -> int").unwrap();
        let expected = ExternFunctionDef::new(
            "meow",
            ParamList(vec![
                Param {
                    name: "x".to_string(),
                    type_annotation: "int".to_string(),
                },
                Param {
                    name: "y".to_string(),
                    type_annotation: "int".to_string(),
                },
            ]),
            "int",
        );
        assert_eq!(Program(vec![Stmt::Extern(expected)]), program);
    }

    #[test]
    fn test_fn_decl_with_body() {
        let program = parse("fn add(a: int, b: int) -> int { var c = a + b\nc }").unwrap();
        match &program.0[0] {
            Stmt::Fn(def) => {
                assert_eq!("add", def.name);
                assert_eq!("int", def.return_type);
                assert_eq!(2, def.params.0.len());
                assert_eq!(2, def.body.len());
            }
            stmt => panic!("expected a function definition, got {:?}", stmt),
        }
    }

    #[test]
    fn test_statement_separators() {
        let with_semicolons = parse("var x = 1; x = 2;").unwrap();
        let with_newlines = parse("var x = 1\nx = 2").unwrap();
        assert_eq!(with_semicolons, with_newlines);
    }

    #[test]
    fn test_empty_source_is_an_error() {
        assert!(matches!(parse("").unwrap_err(), SyntaxError::EmptyProgram));
        assert!(matches!(
            parse("  \n\t").unwrap_err(),
            SyntaxError::EmptyProgram
        ));
        assert!(matches!(
            parse("# only a comment").unwrap_err(),
            SyntaxError::EmptyProgram
        ));
    }

    #[test]
    fn test_unterminated_group() {
        assert!(matches!(
            parse("var x = (1 + 2").unwrap_err(),
            SyntaxError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn test_scan_error_propagates() {
        assert!(matches!(
            parse("var x = $").unwrap_err(),
            SyntaxError::Scan(_)
        ));
    }

    #[test]
    fn test_binary_operator_without_lhs() {
        assert!(parse("* 2").is_err());
    }
}
