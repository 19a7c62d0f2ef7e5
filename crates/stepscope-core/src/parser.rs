//! Hand-written recursive descent parser for stepper scripts.
//!
//! Statements are parsed from logical lines (see [`crate::lexer`]); block
//! structure comes from line indentation, so no indent/dedent tokens exist.
//! Expressions use precedence climbing. `return` outside a function and
//! `break`/`continue` outside a loop are rejected here, not at runtime.

use crate::ast::{BinOp, BoolOp, CmpOp, Expr, IfBranch, Program, Stmt, StmtKind, Target, UnaryOp};
use crate::error::SyntaxError;
use crate::lexer::{lex, LogicalLine, Token};

/// Parses a whole script.
pub fn parse(script: &str) -> Result<Program, SyntaxError> {
    let lines = lex(script)?;
    let mut stream = LineStream::new(&lines);
    let body = parse_block(&mut stream, 0, Ctx::default())?;
    Ok(Program { body })
}

/// Statement context: which enclosing constructs are open.
#[derive(Debug, Clone, Copy, Default)]
struct Ctx {
    in_loop: bool,
    in_func: bool,
}

/// Sequential reader over logical lines.
struct LineStream<'a> {
    lines: &'a [LogicalLine],
    pos: usize,
}

impl<'a> LineStream<'a> {
    fn new(lines: &'a [LogicalLine]) -> Self {
        LineStream { lines, pos: 0 }
    }

    fn peek(&self) -> Option<&'a LogicalLine> {
        self.lines.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a LogicalLine> {
        let line = self.lines.get(self.pos);
        if line.is_some() {
            self.pos += 1;
        }
        line
    }
}

/// Parses statements at exactly `indent` until a dedent or end of input.
fn parse_block(
    stream: &mut LineStream<'_>,
    indent: usize,
    ctx: Ctx,
) -> Result<Vec<Stmt>, SyntaxError> {
    let mut stmts = Vec::new();
    while let Some(line) = stream.peek() {
        if line.indent < indent {
            break;
        }
        if line.indent > indent {
            return Err(SyntaxError::UnexpectedIndent { line: line.line });
        }
        stmts.push(parse_stmt(stream, ctx)?);
    }
    Ok(stmts)
}

/// Parses the indented body that must follow a compound statement header.
fn parse_body(
    stream: &mut LineStream<'_>,
    header_indent: usize,
    header_line: usize,
    ctx: Ctx,
) -> Result<Vec<Stmt>, SyntaxError> {
    match stream.peek() {
        Some(first) if first.indent > header_indent => {
            let body_indent = first.indent;
            parse_block(stream, body_indent, ctx)
        }
        _ => Err(SyntaxError::ExpectedBlock { line: header_line }),
    }
}

fn parse_stmt(stream: &mut LineStream<'_>, ctx: Ctx) -> Result<Stmt, SyntaxError> {
    let header = stream.next().ok_or(SyntaxError::UnexpectedEof)?;
    let mut cur = Cursor::new(&header.tokens, header.line);
    let line = header.line;

    match cur.peek() {
        Some(Token::If) => parse_if(stream, header, ctx),
        Some(Token::While) => {
            cur.advance();
            let cond = parse_expr(&mut cur)?;
            cur.expect(Token::Colon)?;
            cur.expect_end()?;
            let body = parse_body(stream, header.indent, line, Ctx { in_loop: true, ..ctx })?;
            Ok(Stmt { line, kind: StmtKind::While { cond, body } })
        }
        Some(Token::For) => {
            cur.advance();
            let target_expr = parse_expr_list(&mut cur)?;
            let target = expr_to_target(target_expr, line)?;
            cur.expect(Token::In)?;
            let iter = parse_expr_list(&mut cur)?;
            cur.expect(Token::Colon)?;
            cur.expect_end()?;
            let body = parse_body(stream, header.indent, line, Ctx { in_loop: true, ..ctx })?;
            Ok(Stmt { line, kind: StmtKind::For { target, iter, body } })
        }
        Some(Token::Def) => {
            cur.advance();
            let name = cur.expect_name()?;
            cur.expect(Token::LParen)?;
            let mut params = Vec::new();
            if !cur.check(&Token::RParen) {
                loop {
                    params.push(cur.expect_name()?);
                    if cur.check(&Token::Comma) {
                        cur.advance();
                        if cur.check(&Token::RParen) {
                            break;
                        }
                    } else {
                        break;
                    }
                }
            }
            cur.expect(Token::RParen)?;
            cur.expect(Token::Colon)?;
            cur.expect_end()?;
            let body = parse_body(
                stream,
                header.indent,
                line,
                Ctx { in_func: true, in_loop: false },
            )?;
            Ok(Stmt { line, kind: StmtKind::FuncDef { name, params, body } })
        }
        Some(Token::Return) => {
            if !ctx.in_func {
                return Err(SyntaxError::Invalid {
                    line,
                    message: "'return' outside function".into(),
                });
            }
            cur.advance();
            let value = if cur.at_end() {
                None
            } else {
                Some(parse_expr_list(&mut cur)?)
            };
            cur.expect_end()?;
            Ok(Stmt { line, kind: StmtKind::Return { value } })
        }
        Some(Token::Pass) => {
            cur.advance();
            cur.expect_end()?;
            Ok(Stmt { line, kind: StmtKind::Pass })
        }
        Some(Token::Break) => {
            if !ctx.in_loop {
                return Err(SyntaxError::Invalid {
                    line,
                    message: "'break' outside loop".into(),
                });
            }
            cur.advance();
            cur.expect_end()?;
            Ok(Stmt { line, kind: StmtKind::Break })
        }
        Some(Token::Continue) => {
            if !ctx.in_loop {
                return Err(SyntaxError::Invalid {
                    line,
                    message: "'continue' outside loop".into(),
                });
            }
            cur.advance();
            cur.expect_end()?;
            Ok(Stmt { line, kind: StmtKind::Continue })
        }
        Some(Token::Elif) => Err(SyntaxError::Invalid {
            line,
            message: "'elif' without matching 'if'".into(),
        }),
        Some(Token::Else) => Err(SyntaxError::Invalid {
            line,
            message: "'else' without matching 'if'".into(),
        }),
        _ => parse_simple(&mut cur, line),
    }
}

/// Parses an `if` header plus any `elif`/`else` arms at the same indent.
fn parse_if(
    stream: &mut LineStream<'_>,
    header: &LogicalLine,
    ctx: Ctx,
) -> Result<Stmt, SyntaxError> {
    let mut cur = Cursor::new(&header.tokens, header.line);
    cur.expect(Token::If)?;
    let cond = parse_expr(&mut cur)?;
    cur.expect(Token::Colon)?;
    cur.expect_end()?;
    let body = parse_body(stream, header.indent, header.line, ctx)?;

    let mut branches = vec![IfBranch { line: header.line, cond, body }];
    let mut orelse = Vec::new();

    while let Some(next) = stream.peek() {
        if next.indent != header.indent {
            break;
        }
        match next.tokens.first() {
            Some(Token::Elif) => {
                let arm = stream.next().ok_or(SyntaxError::UnexpectedEof)?;
                let mut cur = Cursor::new(&arm.tokens, arm.line);
                cur.expect(Token::Elif)?;
                let cond = parse_expr(&mut cur)?;
                cur.expect(Token::Colon)?;
                cur.expect_end()?;
                let body = parse_body(stream, arm.indent, arm.line, ctx)?;
                branches.push(IfBranch { line: arm.line, cond, body });
            }
            Some(Token::Else) => {
                let arm = stream.next().ok_or(SyntaxError::UnexpectedEof)?;
                let mut cur = Cursor::new(&arm.tokens, arm.line);
                cur.expect(Token::Else)?;
                cur.expect(Token::Colon)?;
                cur.expect_end()?;
                orelse = parse_body(stream, arm.indent, arm.line, ctx)?;
                break;
            }
            _ => break,
        }
    }

    Ok(Stmt {
        line: header.line,
        kind: StmtKind::If { branches, orelse },
    })
}

/// Parses a simple (one-line) statement: assignment, augmented assignment,
/// or a bare expression.
fn parse_simple(cur: &mut Cursor<'_>, line: usize) -> Result<Stmt, SyntaxError> {
    let first = parse_expr_list(cur)?;
    match cur.peek() {
        Some(Token::Eq) => {
            cur.advance();
            let value = parse_expr_list(cur)?;
            cur.expect_end()?;
            let target = expr_to_target(first, line)?;
            Ok(Stmt { line, kind: StmtKind::Assign { target, value } })
        }
        Some(aug) if aug_op(aug).is_some() => {
            let op = aug_op(aug).unwrap_or(BinOp::Add);
            cur.advance();
            let value = parse_expr_list(cur)?;
            cur.expect_end()?;
            match first {
                Expr::Name(name) => Ok(Stmt { line, kind: StmtKind::AugAssign { name, op, value } }),
                other => Err(SyntaxError::Invalid {
                    line,
                    message: format!(
                        "augmented assignment target must be a name, not {}",
                        other.describe()
                    ),
                }),
            }
        }
        None => Ok(Stmt { line, kind: StmtKind::Expr { value: first } }),
        Some(other) => Err(SyntaxError::Expected {
            line,
            expected: "end of line".into(),
            found: format!("{other:?}"),
        }),
    }
}

fn aug_op(token: &Token) -> Option<BinOp> {
    match token {
        Token::PlusEq => Some(BinOp::Add),
        Token::MinusEq => Some(BinOp::Sub),
        Token::StarEq => Some(BinOp::Mul),
        Token::SlashEq => Some(BinOp::Div),
        Token::SlashSlashEq => Some(BinOp::FloorDiv),
        Token::PercentEq => Some(BinOp::Mod),
        _ => None,
    }
}

/// Reinterprets an expression as an assignment target.
fn expr_to_target(expr: Expr, line: usize) -> Result<Target, SyntaxError> {
    match expr {
        Expr::Name(name) => Ok(Target::Name(name)),
        Expr::Tuple(items) => {
            let targets = items
                .into_iter()
                .map(|item| expr_to_target(item, line))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Target::Tuple(targets))
        }
        Expr::Subscript { value, index } => Ok(Target::Subscript {
            value: *value,
            index: *index,
        }),
        other => Err(SyntaxError::Invalid {
            line,
            message: format!("cannot assign to {}", other.describe()),
        }),
    }
}

// ---------------------------------------------------------------------------
// Expression parsing
// ---------------------------------------------------------------------------

/// Token reader over one logical line.
struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    line: usize,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [Token], line: usize) -> Self {
        Cursor { tokens, pos: 0, line }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    fn expect(&mut self, expected: Token) -> Result<(), SyntaxError> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.expected(&format!("{expected:?}")))
        }
    }

    fn expect_name(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(Token::Name(n)) => {
                let name = n.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.expected("a name")),
        }
    }

    fn expect_end(&mut self) -> Result<(), SyntaxError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.expected("end of line"))
        }
    }

    fn expected(&self, what: &str) -> SyntaxError {
        let found = match self.peek() {
            Some(t) => format!("{t:?}"),
            None => "end of line".into(),
        };
        SyntaxError::Expected {
            line: self.line,
            expected: what.into(),
            found,
        }
    }
}

/// Parses `expr {, expr} [,]`, producing a tuple when a comma appears.
fn parse_expr_list(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    let first = parse_expr(cur)?;
    if !cur.check(&Token::Comma) {
        return Ok(first);
    }
    let mut items = vec![first];
    while cur.check(&Token::Comma) {
        cur.advance();
        match cur.peek() {
            None | Some(Token::Colon) | Some(Token::In) | Some(Token::Eq) => break,
            _ => items.push(parse_expr(cur)?),
        }
    }
    Ok(Expr::Tuple(items))
}

fn parse_expr(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    parse_or(cur)
}

fn parse_or(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    let mut lhs = parse_and(cur)?;
    while cur.check(&Token::Or) {
        cur.advance();
        let rhs = parse_and(cur)?;
        lhs = Expr::BoolOp { op: BoolOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs) };
    }
    Ok(lhs)
}

fn parse_and(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    let mut lhs = parse_not(cur)?;
    while cur.check(&Token::And) {
        cur.advance();
        let rhs = parse_not(cur)?;
        lhs = Expr::BoolOp { op: BoolOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs) };
    }
    Ok(lhs)
}

fn parse_not(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    if cur.check(&Token::Not) {
        cur.advance();
        let operand = parse_not(cur)?;
        return Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) });
    }
    parse_comparison(cur)
}

fn parse_comparison(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    let mut lhs = parse_additive(cur)?;
    while let Some(op) = cur.peek().and_then(cmp_op) {
        cur.advance();
        let rhs = parse_additive(cur)?;
        lhs = Expr::Compare { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
    }
    Ok(lhs)
}

fn cmp_op(token: &Token) -> Option<CmpOp> {
    match token {
        Token::EqEq => Some(CmpOp::Eq),
        Token::NotEq => Some(CmpOp::Ne),
        Token::Lt => Some(CmpOp::Lt),
        Token::Le => Some(CmpOp::Le),
        Token::Gt => Some(CmpOp::Gt),
        Token::Ge => Some(CmpOp::Ge),
        _ => None,
    }
}

fn parse_additive(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    let mut lhs = parse_multiplicative(cur)?;
    loop {
        let op = match cur.peek() {
            Some(Token::Plus) => BinOp::Add,
            Some(Token::Minus) => BinOp::Sub,
            _ => break,
        };
        cur.advance();
        let rhs = parse_multiplicative(cur)?;
        lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
    }
    Ok(lhs)
}

fn parse_multiplicative(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    let mut lhs = parse_unary(cur)?;
    loop {
        let op = match cur.peek() {
            Some(Token::Star) => BinOp::Mul,
            Some(Token::Slash) => BinOp::Div,
            Some(Token::SlashSlash) => BinOp::FloorDiv,
            Some(Token::Percent) => BinOp::Mod,
            _ => break,
        };
        cur.advance();
        let rhs = parse_unary(cur)?;
        lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
    }
    Ok(lhs)
}

fn parse_unary(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    if cur.check(&Token::Minus) {
        cur.advance();
        let operand = parse_unary(cur)?;
        return Ok(Expr::Unary { op: UnaryOp::Neg, operand: Box::new(operand) });
    }
    parse_postfix(cur)
}

fn parse_postfix(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    let mut expr = parse_atom(cur)?;
    loop {
        match cur.peek() {
            Some(Token::LParen) => {
                cur.advance();
                let mut args = Vec::new();
                if !cur.check(&Token::RParen) {
                    loop {
                        args.push(parse_expr(cur)?);
                        if cur.check(&Token::Comma) {
                            cur.advance();
                            if cur.check(&Token::RParen) {
                                break;
                            }
                        } else {
                            break;
                        }
                    }
                }
                cur.expect(Token::RParen)?;
                expr = Expr::Call { func: Box::new(expr), args };
            }
            Some(Token::LBracket) => {
                cur.advance();
                let index = parse_expr(cur)?;
                cur.expect(Token::RBracket)?;
                expr = Expr::Subscript { value: Box::new(expr), index: Box::new(index) };
            }
            _ => break,
        }
    }
    Ok(expr)
}

fn parse_atom(cur: &mut Cursor<'_>) -> Result<Expr, SyntaxError> {
    let token = match cur.peek() {
        Some(t) => t.clone(),
        None => return Err(cur.expected("an expression")),
    };
    match token {
        Token::Int(v) => {
            cur.advance();
            Ok(Expr::Int(v))
        }
        Token::Float(v) => {
            cur.advance();
            Ok(Expr::Float(v))
        }
        Token::Str(s) => {
            cur.advance();
            Ok(Expr::Str(s))
        }
        Token::True => {
            cur.advance();
            Ok(Expr::Bool(true))
        }
        Token::False => {
            cur.advance();
            Ok(Expr::Bool(false))
        }
        Token::None => {
            cur.advance();
            Ok(Expr::None)
        }
        Token::Name(n) => {
            cur.advance();
            Ok(Expr::Name(n))
        }
        Token::LParen => {
            cur.advance();
            if cur.check(&Token::RParen) {
                cur.advance();
                return Ok(Expr::Tuple(Vec::new()));
            }
            let first = parse_expr(cur)?;
            if !cur.check(&Token::Comma) {
                cur.expect(Token::RParen)?;
                return Ok(first);
            }
            let mut items = vec![first];
            while cur.check(&Token::Comma) {
                cur.advance();
                if cur.check(&Token::RParen) {
                    break;
                }
                items.push(parse_expr(cur)?);
            }
            cur.expect(Token::RParen)?;
            Ok(Expr::Tuple(items))
        }
        Token::LBracket => {
            cur.advance();
            let mut items = Vec::new();
            if !cur.check(&Token::RBracket) {
                loop {
                    items.push(parse_expr(cur)?);
                    if cur.check(&Token::Comma) {
                        cur.advance();
                        if cur.check(&Token::RBracket) {
                            break;
                        }
                    } else {
                        break;
                    }
                }
            }
            cur.expect(Token::RBracket)?;
            Ok(Expr::List(items))
        }
        Token::LBrace => {
            cur.advance();
            let mut pairs = Vec::new();
            if !cur.check(&Token::RBrace) {
                loop {
                    let key = parse_expr(cur)?;
                    cur.expect(Token::Colon)?;
                    let value = parse_expr(cur)?;
                    pairs.push((key, value));
                    if cur.check(&Token::Comma) {
                        cur.advance();
                        if cur.check(&Token::RBrace) {
                            break;
                        }
                    } else {
                        break;
                    }
                }
            }
            cur.expect(Token::RBrace)?;
            Ok(Expr::Dict(pairs))
        }
        _ => Err(cur.expected("an expression")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse_one(script: &str) -> Stmt {
        let mut program = parse(script).unwrap();
        assert_eq!(program.body.len(), 1);
        program.body.remove(0)
    }

    #[test]
    fn parses_assignment() {
        let stmt = parse_one("x = 1 + 2");
        match stmt.kind {
            StmtKind::Assign { target: Target::Name(n), value } => {
                assert_eq!(n, "x");
                assert!(matches!(value, Expr::Binary { op: BinOp::Add, .. }));
            }
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn precedence_mul_over_add() {
        let stmt = parse_one("x = 1 + 2 * 3");
        match stmt.kind {
            StmtKind::Assign { value: Expr::Binary { op: BinOp::Add, rhs, .. }, .. } => {
                assert!(matches!(*rhs, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("expected Add at the top, got {other:?}"),
        }
    }

    #[test]
    fn comparison_binds_looser_than_arithmetic() {
        let stmt = parse_one("ok = 1 + 1 == 2");
        match stmt.kind {
            StmtKind::Assign { value, .. } => {
                assert!(matches!(value, Expr::Compare { op: CmpOp::Eq, .. }));
            }
            other => panic!("expected Compare, got {other:?}"),
        }
    }

    #[test]
    fn tuple_assignment_targets() {
        let stmt = parse_one("a, b = 1, 2");
        match stmt.kind {
            StmtKind::Assign { target: Target::Tuple(ts), value: Expr::Tuple(vs) } => {
                assert_eq!(ts.len(), 2);
                assert_eq!(vs.len(), 2);
            }
            other => panic!("expected tuple assign, got {other:?}"),
        }
    }

    #[test]
    fn subscript_assignment_target() {
        let stmt = parse_one("xs[0] = 9");
        assert!(matches!(
            stmt.kind,
            StmtKind::Assign { target: Target::Subscript { .. }, .. }
        ));
    }

    #[test]
    fn augmented_assignment() {
        let stmt = parse_one("x += 2");
        match stmt.kind {
            StmtKind::AugAssign { name, op, .. } => {
                assert_eq!(name, "x");
                assert_eq!(op, BinOp::Add);
            }
            other => panic!("expected AugAssign, got {other:?}"),
        }
    }

    #[test]
    fn augmented_target_must_be_name() {
        assert!(matches!(
            parse("xs[0] += 1"),
            Err(SyntaxError::Invalid { line: 0, .. })
        ));
    }

    #[test]
    fn for_loop_with_body() {
        let stmt = parse_one("for y in range(3):\n    z = y");
        match stmt.kind {
            StmtKind::For { target: Target::Name(n), body, .. } => {
                assert_eq!(n, "y");
                assert_eq!(body.len(), 1);
                assert_eq!(body[0].line, 1);
            }
            other => panic!("expected For, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_tuple_target() {
        let stmt = parse_one("for k, v in pairs:\n    pass");
        assert!(matches!(
            stmt.kind,
            StmtKind::For { target: Target::Tuple(_), .. }
        ));
    }

    #[test]
    fn if_elif_else_chain() {
        let stmt = parse_one("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3");
        match stmt.kind {
            StmtKind::If { branches, orelse } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[0].line, 0);
                assert_eq!(branches[1].line, 2);
                assert_eq!(orelse.len(), 1);
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn def_with_params_and_return() {
        let stmt = parse_one("def add(a, b):\n    return a + b");
        match stmt.kind {
            StmtKind::FuncDef { name, params, body } => {
                assert_eq!(name, "add");
                assert_eq!(params, vec!["a".to_string(), "b".to_string()]);
                assert!(matches!(body[0].kind, StmtKind::Return { value: Some(_) }));
            }
            other => panic!("expected FuncDef, got {other:?}"),
        }
    }

    #[test]
    fn nested_blocks_keep_lines() {
        let program = parse("def f(x):\n    if x:\n        return 1\n    return 0\ny = 1").unwrap();
        assert_eq!(program.body.len(), 2);
        assert_eq!(program.body[1].line, 4);
    }

    #[test]
    fn return_outside_function_is_rejected() {
        assert!(matches!(
            parse("return 1"),
            Err(SyntaxError::Invalid { line: 0, .. })
        ));
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        assert!(matches!(
            parse("break"),
            Err(SyntaxError::Invalid { line: 0, .. })
        ));
    }

    #[test]
    fn break_allowed_inside_loop_in_function() {
        assert!(parse("def f(xs):\n    for x in xs:\n        break\n    return 1").is_ok());
    }

    #[test]
    fn stray_elif_is_rejected() {
        assert!(matches!(
            parse("elif x:\n    pass"),
            Err(SyntaxError::Invalid { line: 0, .. })
        ));
    }

    #[test]
    fn missing_body_is_rejected() {
        assert!(matches!(
            parse("if x:"),
            Err(SyntaxError::ExpectedBlock { line: 0 })
        ));
    }

    #[test]
    fn over_indented_line_is_rejected() {
        assert!(matches!(
            parse("x = 1\n    y = 2"),
            Err(SyntaxError::UnexpectedIndent { line: 1 })
        ));
    }

    #[test]
    fn cannot_assign_to_literal() {
        assert!(matches!(
            parse("1 = x"),
            Err(SyntaxError::Invalid { line: 0, .. })
        ));
    }

    #[test]
    fn dict_and_list_literals() {
        let stmt = parse_one("d = {'a': 1, 'b': [2, 3]}");
        match stmt.kind {
            StmtKind::Assign { value: Expr::Dict(pairs), .. } => assert_eq!(pairs.len(), 2),
            other => panic!("expected Dict, got {other:?}"),
        }
    }

    #[test]
    fn call_and_subscript_postfix() {
        let stmt = parse_one("x = f(1, 2)[0]");
        match stmt.kind {
            StmtKind::Assign { value: Expr::Subscript { value, .. }, .. } => {
                assert!(matches!(*value, Expr::Call { .. }));
            }
            other => panic!("expected Subscript over Call, got {other:?}"),
        }
    }

    #[test]
    fn boolean_operators_short_circuit_shape() {
        let stmt = parse_one("x = a or b and not c");
        match stmt.kind {
            StmtKind::Assign { value: Expr::BoolOp { op: BoolOp::Or, rhs, .. }, .. } => {
                assert!(matches!(*rhs, Expr::BoolOp { op: BoolOp::And, .. }));
            }
            other => panic!("expected Or at the top, got {other:?}"),
        }
    }

    proptest! {
        /// The parser returns a value for any printable input, it never panics.
        #[test]
        fn parser_never_panics(script in "[ -~\n]{0,200}") {
            let _ = parse(&script);
        }
    }
}
