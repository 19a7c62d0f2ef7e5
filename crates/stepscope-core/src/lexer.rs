//! Lexical analysis for stepper scripts.
//!
//! Within-line tokens are produced by logos; block structure is recovered by
//! a layout pass that groups tokens into [`LogicalLine`]s carrying their
//! indentation. The grammar is line- and indentation-structured, so the
//! parser consumes logical lines rather than a flat token stream.
//!
//! Layout rules:
//! - indentation is spaces only; a tab in leading whitespace is an error
//! - blank and comment-only lines produce no logical line
//! - an open `(`, `[` or `{` continues the logical line across physical
//!   lines; the continuation's indentation is insignificant

use logos::Logos;

use crate::error::SyntaxError;

/// One token of a stepper script.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Keywords
    #[token("def")]
    Def,
    #[token("return")]
    Return,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("in")]
    In,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("pass")]
    Pass,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    None,

    // Literals and names
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, |lex| unescape(lex.slice()))]
    Str(String),
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),

    // Operators and delimiters
    #[token("//=")]
    SlashSlashEq,
    #[token("//")]
    SlashSlash,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
}

/// Strips the surrounding quotes and resolves escape sequences.
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                // Unknown escape: keep both characters, like the scripts expect.
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// One logical source line: indentation, 0-based first physical line index,
/// and its tokens. Bracket continuations are folded into the starting line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    pub line: usize,
    pub indent: usize,
    pub tokens: Vec<Token>,
}

/// Lexes a whole script into logical lines.
pub fn lex(script: &str) -> Result<Vec<LogicalLine>, SyntaxError> {
    let mut lines: Vec<LogicalLine> = Vec::new();
    let mut open: Option<LogicalLine> = None;
    let mut depth: usize = 0;

    for (idx, raw) in script.lines().enumerate() {
        match open.as_mut() {
            None => {
                let indent = raw.chars().take_while(|&c| c == ' ').count();
                let rest = &raw[indent..];
                if rest.trim().is_empty() || rest.trim_start().starts_with('#') {
                    continue;
                }
                if rest.starts_with('\t') {
                    return Err(SyntaxError::TabIndent { line: idx });
                }
                let mut logical = LogicalLine {
                    line: idx,
                    indent,
                    tokens: Vec::new(),
                };
                lex_into(rest, idx, &mut logical.tokens, &mut depth)?;
                open = Some(logical);
            }
            Some(logical) => {
                lex_into(raw, idx, &mut logical.tokens, &mut depth)?;
            }
        }
        if depth == 0 {
            if let Some(done) = open.take() {
                lines.push(done);
            }
        }
    }

    if let Some(unfinished) = open {
        return Err(SyntaxError::UnclosedBracket {
            line: unfinished.line,
        });
    }
    Ok(lines)
}

/// Lexes one physical line's text, updating the bracket depth.
fn lex_into(
    text: &str,
    line: usize,
    out: &mut Vec<Token>,
    depth: &mut usize,
) -> Result<(), SyntaxError> {
    let mut lexer = Token::lexer(text);
    while let Some(result) = lexer.next() {
        let token = result.map_err(|_| SyntaxError::InvalidToken {
            line,
            text: lexer.slice().to_string(),
        })?;
        match token {
            Token::LParen | Token::LBracket | Token::LBrace => *depth += 1,
            Token::RParen | Token::RBracket | Token::RBrace => {
                *depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        out.push(token);
    }
    Ok(())
}
