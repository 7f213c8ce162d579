//! Recursive-descent parser for Go declarations.

use genstrument_ir::{ChanDir, FuncSignature, InterfaceElem, Position, TypeExpr, TypeParam};

use crate::{
    ast::{
        Comment, CommentGroup, Decl, FuncDecl, ImportName, ImportSpec, InterfaceType, MethodSpec,
        Param, Signature, SourceFile, TypeSpec, TypeSpecKind,
    },
    error::{Error, Result, SourceContext},
    lexer::{Token, TokenKind, is_keyword, tokenize},
};

/// Parse the declarations of a Go source file.
pub fn parse(ctx: &SourceContext) -> Result<SourceFile> {
    let tokens = tokenize(ctx)?;
    Parser::new(ctx, tokens).parse_file()
}

/// A parameter-list entry before names and types are paired up.
enum ParamItem {
    /// A lone identifier: a name in a grouped list, or a type.
    Ident(Token),
    Named(Token, TypeExpr),
    Type(TypeExpr, Position),
}

struct Parser<'a> {
    ctx: &'a SourceContext,
    tokens: Vec<Token>,
    comments: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(ctx: &'a SourceContext, all: Vec<Token>) -> Self {
        let (comments, tokens): (Vec<Token>, Vec<Token>) =
            all.into_iter().partition(|t| t.kind == TokenKind::Comment);
        Self {
            ctx,
            tokens,
            comments,
            pos: 0,
        }
    }

    // ---- token access ------------------------------------------------------

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.peek().is(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> Box<Error> {
        self.ctx
            .syntax_error(message, token.position, token.text.len().max(1))
    }

    fn unexpected(&self, expected: &str) -> Box<Error> {
        let token = self.peek();
        self.error_at(token, format!("expected {}, found {}", expected, describe(token)))
    }

    fn expect(&mut self, text: &str) -> Result<Token> {
        if self.peek().is(text) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", text)))
        }
    }

    fn expect_ident(&mut self) -> Result<Token> {
        if is_name(self.peek()) {
            Ok(self.advance())
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    /// Statement terminator, optional before a closing `)` or `}`.
    fn expect_semi(&mut self) -> Result<()> {
        match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ if self.peek().is(")") || self.peek().is("}") => Ok(()),
            _ => Err(self.unexpected("';'")),
        }
    }

    /// Doc comment group ending on the line right above the current token.
    fn doc(&self) -> Option<CommentGroup> {
        let token = self.peek();
        let lower = match self.pos {
            0 => 0,
            n => self.tokens[n - 1].position.offset,
        };
        let end = self
            .comments
            .partition_point(|c| c.position.offset < token.position.offset);
        let mut expected = token.position.line.checked_sub(1)?;
        let mut group = Vec::new();
        for comment in self.comments[..end].iter().rev() {
            if comment.position.offset < lower || comment.trailing || comment.end_line() != expected
            {
                break;
            }
            group.push(Comment {
                text: comment.text.clone(),
                position: comment.position,
            });
            expected = comment.position.line.saturating_sub(1);
        }
        if group.is_empty() {
            return None;
        }
        group.reverse();
        Some(CommentGroup { comments: group })
    }

    // ---- declarations ------------------------------------------------------

    fn parse_file(mut self) -> Result<SourceFile> {
        self.expect("package")?;
        let package = self.expect_ident()?.text;
        self.expect_semi()?;

        let mut file = SourceFile {
            package,
            ..Default::default()
        };
        while self.peek().is("import") {
            self.advance();
            self.group(|p| {
                let spec = p.parse_import_spec()?;
                file.imports.push(spec);
                Ok(())
            })?;
            self.expect_semi()?;
        }

        while self.peek().kind != TokenKind::Eof {
            let token = self.peek().clone();
            match token.text.as_str() {
                "type" if token.kind == TokenKind::Ident => self.parse_type_decl(&mut file.decls)?,
                "func" if token.kind == TokenKind::Ident => {
                    let decl = self.parse_func_decl()?;
                    file.decls.push(Decl::Func(decl));
                }
                "var" | "const" if token.kind == TokenKind::Ident => {
                    self.advance();
                    self.skip_statement();
                }
                "import" => {
                    return Err(self.error_at(&token, "imports must appear before other declarations"));
                }
                _ if token.kind == TokenKind::Semicolon => {
                    self.advance();
                    continue;
                }
                _ => {
                    return Err(self.error_at(
                        &token,
                        format!("non-declaration statement outside function body: {}", describe(&token)),
                    ));
                }
            }
            self.expect_semi()?;
        }
        Ok(file)
    }

    /// Parse either `( item; item; ... )` or a single item.
    fn group(&mut self, mut item: impl FnMut(&mut Self) -> Result<()>) -> Result<()> {
        if !self.eat("(") {
            return item(self);
        }
        while !self.peek().is(")") {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.unexpected("')'"));
            }
            item(self)?;
            self.expect_semi()?;
        }
        self.advance();
        Ok(())
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec> {
        let position = self.peek().position;
        let name = if self.eat(".") {
            ImportName::Dot
        } else if self.peek().kind == TokenKind::Ident {
            match self.expect_ident()?.text.as_str() {
                "_" => ImportName::Blank,
                alias => ImportName::Alias(alias.to_string()),
            }
        } else {
            ImportName::Default
        };
        if self.peek().kind != TokenKind::String {
            return Err(self.unexpected("import path"));
        }
        let path = self.advance().string_value();
        Ok(ImportSpec {
            name,
            path,
            position,
        })
    }

    fn parse_type_decl(&mut self, decls: &mut Vec<Decl>) -> Result<()> {
        let group_doc = self.doc();
        self.advance();
        self.group(|p| {
            let doc = p.doc().or_else(|| group_doc.clone());
            let spec = p.parse_type_spec(doc)?;
            decls.push(Decl::Type(spec));
            Ok(())
        })
    }

    fn parse_type_spec(&mut self, doc: Option<CommentGroup>) -> Result<TypeSpec> {
        let name = self.expect_ident()?;
        let mut type_params = Vec::new();
        if self.peek().is("[") && is_name(self.peek_at(1)) && !self.peek_at(2).is("]") {
            self.advance();
            type_params = self.parse_type_params()?;
        }
        let alias = self.eat("=");
        let kind = if self.peek().is("interface") {
            self.advance();
            TypeSpecKind::Interface(self.parse_interface_decl()?)
        } else {
            TypeSpecKind::Other(self.parse_type()?)
        };
        Ok(TypeSpec {
            doc,
            name: name.text,
            type_params,
            alias,
            kind,
            position: name.position,
        })
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl> {
        let doc = self.doc();
        let func = self.advance();
        let mut receiver = None;
        if self.eat("(") {
            let mut params = self.parse_params(")", false)?;
            if params.len() != 1 {
                return Err(self.error_at(&func, "method has multiple receivers"));
            }
            receiver = params.pop();
        }
        let name = self.expect_ident()?;
        let mut type_params = Vec::new();
        if self.eat("[") {
            type_params = self.parse_type_params()?;
        }
        let signature = self.parse_signature()?;
        if self.peek().is("{") {
            self.skip_block()?;
        }
        Ok(FuncDecl {
            doc,
            receiver,
            name: name.text,
            type_params,
            signature,
            position: func.position,
        })
    }

    /// Interface body of a type declaration, keeping method doc comments.
    fn parse_interface_decl(&mut self) -> Result<InterfaceType> {
        self.expect("{")?;
        let mut interface = InterfaceType::default();
        while !self.peek().is("}") {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.unexpected("'}'"));
            }
            if is_name(self.peek()) && self.peek_at(1).is("(") {
                let doc = self.doc();
                let name = self.advance();
                let signature = self.parse_signature()?;
                interface.methods.push(MethodSpec {
                    doc,
                    name: name.text,
                    signature,
                    position: name.position,
                });
            } else {
                interface.embeds.push(self.parse_constraint()?);
            }
            self.expect_semi()?;
        }
        self.advance();
        Ok(interface)
    }

    fn skip_block(&mut self) -> Result<()> {
        let open = self.expect("{")?;
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.advance();
            match token.kind {
                TokenKind::Eof => return Err(self.error_at(&open, "unclosed block")),
                TokenKind::Op if token.text == "{" => depth += 1,
                TokenKind::Op if token.text == "}" => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Skip to the end of a `var`/`const` declaration.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => return,
                TokenKind::Semicolon if depth == 0 => return,
                TokenKind::Op if matches!(token.text.as_str(), "(" | "[" | "{") => depth += 1,
                TokenKind::Op if matches!(token.text.as_str(), ")" | "]" | "}") => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ---- signatures --------------------------------------------------------

    fn parse_signature(&mut self) -> Result<Signature> {
        self.expect("(")?;
        let params = self.parse_params(")", false)?;
        let results = if self.eat("(") {
            self.parse_params(")", false)?
        } else if starts_type(self.peek()) {
            let position = self.peek().position;
            vec![Param {
                name: None,
                ty: self.parse_type()?,
                position,
            }]
        } else {
            Vec::new()
        };
        Ok(Signature { params, results })
    }

    fn parse_type_params(&mut self) -> Result<Vec<TypeParam>> {
        let params = self.parse_params("]", true)?;
        params
            .into_iter()
            .map(|param| match param.name {
                Some(name) => Ok(TypeParam::new(name, param.ty)),
                None => Err(self.ctx.syntax_error(
                    "type parameter is missing a constraint",
                    param.position,
                    1,
                )),
            })
            .collect()
    }

    /// Parse a parameter list up to and including `close`.
    ///
    /// Entries are either all named or all unnamed; names without a type
    /// take the type of the next named entry (`a, b string`).
    fn parse_params(&mut self, close: &str, constraints: bool) -> Result<Vec<Param>> {
        let mut items = Vec::new();
        while !self.peek().is(close) {
            items.push(self.parse_param_item(close, constraints)?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(close)?;

        if !items.iter().any(|item| matches!(item, ParamItem::Named(..))) {
            return Ok(items
                .into_iter()
                .map(|item| match item {
                    ParamItem::Ident(token) => Param {
                        name: None,
                        ty: TypeExpr::Ident(token.text),
                        position: token.position,
                    },
                    ParamItem::Type(ty, position) => Param {
                        name: None,
                        ty,
                        position,
                    },
                    ParamItem::Named(token, ty) => Param {
                        name: Some(token.text),
                        ty,
                        position: token.position,
                    },
                })
                .collect());
        }

        let mut params = Vec::new();
        let mut pending: Vec<Token> = Vec::new();
        for item in items {
            match item {
                ParamItem::Ident(token) => pending.push(token),
                ParamItem::Named(token, ty) => {
                    for name in pending.drain(..) {
                        params.push(Param {
                            name: Some(name.text),
                            ty: ty.clone(),
                            position: name.position,
                        });
                    }
                    params.push(Param {
                        name: Some(token.text),
                        ty,
                        position: token.position,
                    });
                }
                ParamItem::Type(_, position) => {
                    return Err(self.ctx.syntax_error(
                        "mixed named and unnamed parameters",
                        position,
                        1,
                    ));
                }
            }
        }
        if let Some(token) = pending.first() {
            return Err(self.error_at(token, "mixed named and unnamed parameters"));
        }
        Ok(params)
    }

    fn parse_param_item(&mut self, close: &str, constraints: bool) -> Result<ParamItem> {
        let token = self.peek().clone();
        if !is_name(&token) {
            let ty = self.parse_param_type(constraints)?;
            return Ok(ParamItem::Type(ty, token.position));
        }
        let next = self.peek_at(1);
        if next.is(",") || next.is(close) {
            self.advance();
            return Ok(ParamItem::Ident(token));
        }
        let named = if next.is(".") {
            false
        } else if next.is("[") {
            self.bracket_starts_type()
        } else {
            true
        };
        if !named {
            let ty = self.parse_param_type(constraints)?;
            return Ok(ParamItem::Type(ty, token.position));
        }
        self.advance();
        let ty = self.parse_param_type(constraints)?;
        Ok(ParamItem::Named(token, ty))
    }

    fn parse_param_type(&mut self, constraints: bool) -> Result<TypeExpr> {
        if constraints {
            self.parse_constraint()
        } else {
            self.parse_type()
        }
    }

    /// Decide whether `ident [ ... ]` is a name followed by a slice or array
    /// type (`a []int`, `a [4]int`) rather than a generic instantiation
    /// (`List[T]`).
    fn bracket_starts_type(&self) -> bool {
        if self.peek_at(2).is("]") {
            return true;
        }
        let mut depth = 0usize;
        let mut n = 1;
        loop {
            let token = self.peek_at(n);
            match token.kind {
                TokenKind::Eof => return false,
                TokenKind::Op if matches!(token.text.as_str(), "[" | "(" | "{") => depth += 1,
                TokenKind::Op if matches!(token.text.as_str(), "]" | ")" | "}") => {
                    depth -= 1;
                    if depth == 0 {
                        return starts_type(self.peek_at(n + 1));
                    }
                }
                _ => {}
            }
            n += 1;
        }
    }

    // ---- types -------------------------------------------------------------

    /// A constraint: one or more `~T` terms joined by `|`.
    fn parse_constraint(&mut self) -> Result<TypeExpr> {
        let mut terms = vec![self.parse_term()?];
        while self.eat("|") {
            terms.push(self.parse_term()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            TypeExpr::Union(terms)
        })
    }

    fn parse_term(&mut self) -> Result<TypeExpr> {
        if self.eat("~") {
            return Ok(TypeExpr::Tilde(Box::new(self.parse_type()?)));
        }
        self.parse_type()
    }

    fn parse_type(&mut self) -> Result<TypeExpr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident if !is_keyword(&token.text) => self.parse_type_name(),
            TokenKind::Ident => match token.text.as_str() {
                "map" => {
                    self.advance();
                    self.expect("[")?;
                    let key = self.parse_type()?;
                    self.expect("]")?;
                    let value = self.parse_type()?;
                    Ok(TypeExpr::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                    })
                }
                "chan" => {
                    self.advance();
                    let dir = if self.eat("<-") {
                        ChanDir::Send
                    } else {
                        ChanDir::Both
                    };
                    let elem = self.parse_type()?;
                    Ok(TypeExpr::Chan {
                        dir,
                        elem: Box::new(elem),
                    })
                }
                "func" => {
                    self.advance();
                    let signature = self.parse_signature()?;
                    Ok(TypeExpr::Func(func_signature(signature)))
                }
                "interface" => {
                    self.advance();
                    let decl = self.parse_interface_decl()?;
                    let mut elems: Vec<_> = decl
                        .embeds
                        .into_iter()
                        .map(InterfaceElem::Embedded)
                        .collect();
                    elems.extend(decl.methods.into_iter().map(|m| InterfaceElem::Method {
                        name: m.name,
                        signature: func_signature(m.signature),
                    }));
                    Ok(TypeExpr::Interface(elems))
                }
                "struct" => {
                    self.advance();
                    self.skip_block()?;
                    Ok(TypeExpr::Struct)
                }
                _ => Err(self.unexpected("type")),
            },
            TokenKind::Op => match token.text.as_str() {
                "*" => {
                    self.advance();
                    Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
                }
                "[" => {
                    self.advance();
                    if self.eat("]") {
                        return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
                    }
                    let len = self.array_len()?;
                    let elem = self.parse_type()?;
                    Ok(TypeExpr::Array {
                        len,
                        elem: Box::new(elem),
                    })
                }
                "<-" => {
                    self.advance();
                    self.expect("chan")?;
                    let elem = self.parse_type()?;
                    Ok(TypeExpr::Chan {
                        dir: ChanDir::Recv,
                        elem: Box::new(elem),
                    })
                }
                "..." => {
                    self.advance();
                    Ok(TypeExpr::Variadic(Box::new(self.parse_type()?)))
                }
                "(" => {
                    self.advance();
                    let inner = self.parse_type()?;
                    self.expect(")")?;
                    Ok(inner)
                }
                _ => Err(self.unexpected("type")),
            },
            _ => Err(self.unexpected("type")),
        }
    }

    /// `Name`, `pkg.Name`, either optionally instantiated: `Name[A, B]`.
    fn parse_type_name(&mut self) -> Result<TypeExpr> {
        let first = self.advance();
        let base = if self.eat(".") {
            let name = self.expect_ident()?;
            TypeExpr::qualified(first.text, name.text)
        } else {
            TypeExpr::Ident(first.text)
        };
        if !self.peek().is("[") {
            return Ok(base);
        }
        self.advance();
        let mut args = Vec::new();
        while !self.peek().is("]") {
            args.push(self.parse_type()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect("]")?;
        Ok(TypeExpr::Generic {
            base: Box::new(base),
            args,
        })
    }

    /// Source text of an array length, up to and including the closing `]`.
    fn array_len(&mut self) -> Result<String> {
        let mut len = String::new();
        let mut depth = 0usize;
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Eof | TokenKind::Semicolon => {
                    return Err(self.error_at(&token, "expected ']'"));
                }
                TokenKind::Op if token.text == "]" && depth == 0 => return Ok(len),
                TokenKind::Op if matches!(token.text.as_str(), "[" | "(") => depth += 1,
                TokenKind::Op if matches!(token.text.as_str(), "]" | ")") => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| self.error_at(&token, "expected ']'"))?;
                }
                _ => {}
            }
            len.push_str(&token.text);
        }
    }
}

fn func_signature(signature: Signature) -> FuncSignature {
    FuncSignature {
        params: signature.params.into_iter().map(|p| p.ty).collect(),
        results: signature.results.into_iter().map(|p| p.ty).collect(),
    }
}

/// A non-keyword identifier.
fn is_name(token: &Token) -> bool {
    token.kind == TokenKind::Ident && !is_keyword(&token.text)
}

fn starts_type(token: &Token) -> bool {
    match token.kind {
        TokenKind::Ident => {
            !is_keyword(&token.text)
                || matches!(
                    token.text.as_str(),
                    "func" | "map" | "chan" | "interface" | "struct"
                )
        }
        TokenKind::Op => matches!(token.text.as_str(), "*" | "[" | "(" | "<-" | "..." | "~"),
        _ => false,
    }
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "EOF".to_string(),
        TokenKind::Semicolon if token.text == "\n" => "newline".to_string(),
        _ => format!("'{}'", token.text),
    }
}
