//! Go tokenizer.
//!
//! Produces the token stream of a Go source file, including comments, with
//! automatic semicolon insertion applied the way the Go scanner does it.

use genstrument_ir::Position;

use crate::error::{Result, SourceContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident,
    Int,
    Float,
    Imag,
    Char,
    /// Interpreted or raw string literal, quotes included.
    String,
    /// Operator or delimiter.
    Op,
    /// Explicit `;` or an inserted one (`text` is `"\n"` then).
    Semicolon,
    /// `// ...` or `/* ... */`, delimiters included.
    Comment,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
    /// Comment that shares its line with a preceding token.
    pub trailing: bool,
}

impl Token {
    /// Returns true if the token is the operator or keyword `text`.
    pub fn is(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Op | TokenKind::Ident) && self.text == text
    }

    /// Last line covered by the token.
    pub fn end_line(&self) -> usize {
        self.position.line + self.text.matches('\n').count()
    }

    /// Value of a string literal with the quotes removed.
    pub fn string_value(&self) -> String {
        if let Some(raw) = self
            .text
            .strip_prefix('`')
            .and_then(|s| s.strip_suffix('`'))
        {
            return raw.replace('\r', "");
        }
        let inner = self
            .text
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(&self.text);
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
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    }
}

pub const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Operators, longest first so that matching is greedy.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-", "*", "/", "%", "&",
    "|", "^", "<", ">", "=", "!", "(", ")", "[", "]", "{", "}", ",", ".", ":", "~",
];

/// Returns true if `name` is a Go keyword.
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Tokenize a whole source file. The last token is always [`TokenKind::Eof`].
pub fn tokenize(ctx: &SourceContext) -> Result<Vec<Token>> {
    Lexer::new(ctx).run()
}

struct Lexer<'a> {
    ctx: &'a SourceContext,
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    insert_semi: bool,
    last_token_line: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(ctx: &'a SourceContext) -> Self {
        Self {
            ctx,
            src: ctx.src(),
            offset: 0,
            line: 1,
            column: 1,
            insert_semi: false,
            last_token_line: 0,
            tokens: Vec::new(),
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += c.len_utf8();
        }
        Some(c)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn push(&mut self, kind: TokenKind, start: Position) {
        let text = self.src[start.offset..self.offset].to_string();
        self.tokens.push(Token {
            kind,
            text,
            position: start,
            trailing: false,
        });
        self.last_token_line = start.line;
    }

    fn push_semicolon(&mut self, position: Position) {
        self.tokens.push(Token {
            kind: TokenKind::Semicolon,
            text: "\n".to_string(),
            position,
            trailing: false,
        });
        self.insert_semi = false;
    }

    fn run(mut self) -> Result<Vec<Token>> {
        while let Some(c) = self.peek() {
            let start = self.position();
            match c {
                '\n' => {
                    if self.insert_semi {
                        self.push_semicolon(start);
                    }
                    self.bump();
                }
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('/') => self.line_comment(start),
                '/' if self.peek_at(1) == Some('*') => self.block_comment(start)?,
                c if c.is_alphabetic() || c == '_' => {
                    self.bump_while(|c| c.is_alphanumeric() || c == '_');
                    let word = &self.src[start.offset..self.offset];
                    self.insert_semi = !is_keyword(word)
                        || matches!(word, "break" | "continue" | "fallthrough" | "return");
                    self.push(TokenKind::Ident, start);
                }
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) =>
                {
                    let kind = self.number();
                    self.insert_semi = true;
                    self.push(kind, start);
                }
                '"' => {
                    self.quoted('"', start)?;
                    self.insert_semi = true;
                    self.push(TokenKind::String, start);
                }
                '\'' => {
                    self.quoted('\'', start)?;
                    self.insert_semi = true;
                    self.push(TokenKind::Char, start);
                }
                '`' => {
                    self.bump();
                    self.bump_while(|c| c != '`');
                    if self.bump().is_none() {
                        return Err(self.ctx.syntax_error("raw string literal not terminated", start, 1));
                    }
                    self.insert_semi = true;
                    self.push(TokenKind::String, start);
                }
                ';' => {
                    self.bump();
                    self.insert_semi = false;
                    self.push(TokenKind::Semicolon, start);
                }
                _ => self.operator(start)?,
            }
        }
        let end = self.position();
        if self.insert_semi {
            self.push_semicolon(end);
        }
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            position: end,
            trailing: false,
        });
        Ok(self.tokens)
    }

    fn line_comment(&mut self, start: Position) {
        if self.insert_semi {
            self.push_semicolon(start);
        }
        let trailing = self.last_token_line == start.line;
        self.bump_while(|c| c != '\n');
        let text = self.src[start.offset..self.offset].trim_end_matches('\r');
        self.tokens.push(Token {
            kind: TokenKind::Comment,
            text: text.to_string(),
            position: start,
            trailing,
        });
    }

    fn block_comment(&mut self, start: Position) -> Result<()> {
        let Some(len) = self.rest()[2..].find("*/") else {
            return Err(self.ctx.syntax_error("comment not terminated", start, 2));
        };
        let text = &self.src[start.offset..start.offset + len + 4];
        if self.insert_semi && text.contains('\n') {
            self.push_semicolon(start);
        }
        let trailing = self.last_token_line == start.line;
        for _ in 0..text.chars().count() {
            self.bump();
        }
        self.tokens.push(Token {
            kind: TokenKind::Comment,
            text: text.to_string(),
            position: start,
            trailing,
        });
        Ok(())
    }

    fn number(&mut self) -> TokenKind {
        let mut kind = TokenKind::Int;
        let prefix = self.rest().get(..2).map(str::to_ascii_lowercase);
        match prefix.as_deref() {
            Some("0x") => {
                self.bump();
                self.bump();
                self.bump_while(|c| c.is_ascii_hexdigit() || c == '_' || c == '.');
                if matches!(self.peek(), Some('p' | 'P')) {
                    kind = TokenKind::Float;
                    self.exponent();
                }
            }
            Some("0b") | Some("0o") => {
                self.bump();
                self.bump();
                self.bump_while(|c| c.is_ascii_hexdigit() || c == '_');
            }
            _ => {
                self.bump_while(|c| c.is_ascii_digit() || c == '_');
                if self.peek() == Some('.') {
                    kind = TokenKind::Float;
                    self.bump();
                    self.bump_while(|c| c.is_ascii_digit() || c == '_');
                }
                if matches!(self.peek(), Some('e' | 'E')) {
                    kind = TokenKind::Float;
                    self.exponent();
                }
            }
        }
        if self.peek() == Some('i') {
            self.bump();
            kind = TokenKind::Imag;
        }
        kind
    }

    fn exponent(&mut self) {
        self.bump();
        if matches!(self.peek(), Some('+' | '-')) {
            self.bump();
        }
        self.bump_while(|c| c.is_ascii_digit() || c == '_');
    }

    fn quoted(&mut self, quote: char, start: Position) -> Result<()> {
        self.bump();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(()),
                Some('\\') => {
                    self.bump();
                }
                Some('\n') | None => {
                    let what = if quote == '"' {
                        "string literal not terminated"
                    } else {
                        "rune literal not terminated"
                    };
                    return Err(self.ctx.syntax_error(what, start, 1));
                }
                Some(_) => {}
            }
        }
    }

    fn operator(&mut self, start: Position) -> Result<()> {
        let rest = self.rest();
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            let c = self.peek().unwrap_or_default();
            return Err(self
                .ctx
                .syntax_error(format!("invalid character {:?}", c), start, c.len_utf8()));
        };
        for _ in 0..op.len() {
            self.bump();
        }
        self.insert_semi = matches!(*op, ")" | "]" | "}" | "++" | "--");
        self.push(TokenKind::Op, start);
        Ok(())
    }
}
