use std::path::Path;

use crate::error::{Error, Result};
use crate::lexer::{Keyword, Position, Symbol, Token, TokenKind};

use super::{
    type_names::TypeNames, Case, Declaration, Declarator, Element, EnumDef, Enumerator, ForInit,
    Form, FormCore, Function, Import, Modifier, Module, Param, Params, Pointer, Record, RecordBody,
    RecordKind, Stmt, StructDef, StructForward, Type, TypeName, TypePart, Typedef,
};

/// Where a speculative parse started, so it can be undone.
#[derive(Clone, Copy, Debug)]
struct Checkpoint {
    index: usize,
    names: usize,
    declared: usize,
}

#[derive(Debug)]
pub struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    names: &'a mut TypeNames,
    declared: Vec<String>,
    file: String,
    name: String,
    path: std::path::PathBuf,
    name_pos: Position,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with an `Eof` token, as [`crate::lexer::Lexer::tokenize`]
    /// guarantees.
    pub fn new(tokens: Vec<Token>, names: &'a mut TypeNames, path: &Path) -> Self {
        let mut tokens = tokens;
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let pos = tokens.last().map(|t| t.pos).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, pos));
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        // `name.linux.c` belongs to module `name`
        let name = name.split('.').next().unwrap_or_default().to_string();
        Self {
            tokens,
            index: 0,
            names,
            declared: vec![],
            file: path.display().to_string(),
            name,
            path: path.to_path_buf(),
            name_pos: Position::default(),
        }
    }

    /// module = (import | typedef | struct-def | enum-def | function | variable | macro-line)*
    pub fn parse(&mut self) -> Result<Module> {
        let mut module = Module::new(self.name.clone(), self.path.clone());

        while !self.is_eof() {
            if let Some(element) = self.parse_element()? {
                module.elements.push(element);
            }
        }

        module.type_names = std::mem::take(&mut self.declared);
        log::debug!(
            "parsed {}: {} elements, {} type names declared",
            self.file,
            module.elements.len(),
            module.type_names.len()
        );
        Ok(module)
    }

    pub(super) fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub(super) fn peek_at(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.index + n).min(last)]
    }

    pub(super) fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub(super) fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        token
    }

    pub(super) fn check(&self, symbol: Symbol) -> bool {
        self.peek().is_symbol(symbol)
    }

    pub(super) fn consume(&mut self, symbol: Symbol) -> bool {
        if !self.check(symbol) {
            return false;
        }
        self.index += 1;
        true
    }

    pub(super) fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if !self.peek().is_keyword(keyword) {
            return false;
        }
        self.index += 1;
        true
    }

    pub(super) fn expect(&mut self, symbol: Symbol) -> Result<Position> {
        if !self.check(symbol) {
            return Err(self.error(format!("`{}`", symbol.as_str())));
        }
        Ok(self.bump().pos)
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Position> {
        if !self.peek().is_keyword(keyword) {
            return Err(self.error(format!("`{}`", keyword.as_str())));
        }
        Ok(self.bump().pos)
    }

    pub(super) fn expect_word(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Word(w) => {
                let w = w.clone();
                self.name_pos = self.bump().pos;
                Ok(w)
            }
            _ => Err(self.error("identifier")),
        }
    }

    /// Error for the token under the cursor. A lexer error token always wins
    /// over the syntax error it causes.
    pub(super) fn error(&self, expected: impl Into<String>) -> Error {
        let token = self.peek();
        if let TokenKind::Error(message) = &token.kind {
            return Error::Lex {
                file: self.file.clone(),
                pos: token.pos,
                message: message.clone(),
            };
        }
        Error::Syntax {
            file: self.file.clone(),
            pos: token.pos,
            expected: expected.into(),
            found: token.describe(),
            context: self.context(),
        }
    }

    fn context(&self) -> String {
        let start = self.index.saturating_sub(3);
        let end = (self.index + 4).min(self.tokens.len());
        self.tokens[start..end]
            .iter()
            .map(|t| t.to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            index: self.index,
            names: self.names.checkpoint(),
            declared: self.declared.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.index = checkpoint.index;
        self.names.rollback(checkpoint.names);
        self.declared.truncate(checkpoint.declared);
    }

    /// Runs `rule`; on failure rewinds the cursor and the type-name set and
    /// returns `None` so the caller can try the next alternative.
    pub(super) fn attempt<T>(&mut self, rule: impl FnOnce(&mut Self) -> Result<T>) -> Option<T> {
        let checkpoint = self.checkpoint();
        match rule(self) {
            Ok(value) => Some(value),
            Err(e) => {
                log::trace!("backtracking to token {}: {}", checkpoint.index, e);
                self.restore(checkpoint);
                None
            }
        }
    }

    fn register(&mut self, name: &str, pos: Position) -> Result<()> {
        if !self.names.register(name) {
            return Err(Error::Redefinition {
                file: self.file.clone(),
                pos,
                name: name.to_string(),
            });
        }
        self.declared.push(name.to_string());
        Ok(())
    }

    fn parse_element(&mut self) -> Result<Option<Element>> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Macro(line) => {
                self.bump();
                self.parse_macro(line, token.pos).map(Some)
            }
            TokenKind::Keyword(Keyword::Import) => self.parse_import().map(Some),
            TokenKind::Symbol(Symbol::Semicolon) => {
                self.bump();
                Ok(None)
            }
            _ => self.parse_declaration_element().map(Some),
        }
    }

    /// `#type NAME` and `#link NAME` are directives; anything else is passed
    /// through untouched.
    fn parse_macro(&mut self, line: &str, pos: Position) -> Result<Element> {
        let mut words = line.trim_start_matches('#').split_whitespace();
        let element = match (words.next(), words.next()) {
            (Some("type"), Some(name)) => {
                self.register(name, pos)?;
                Element::TypeDirective(name.to_string())
            }
            (Some("link"), Some(name)) => Element::Link(name.to_string()),
            _ => Element::Macro(line.to_string()),
        };
        Ok(element)
    }

    /// import = "import" string ";"?
    fn parse_import(&mut self) -> Result<Element> {
        let pos = self.expect_keyword(Keyword::Import)?;
        let TokenKind::String(path) = self.peek().kind.clone() else {
            return Err(self.error("import path string"));
        };
        self.bump();
        self.consume(Symbol::Semicolon);
        Ok(Element::Import(Import {
            path,
            pos,
            module: None,
        }))
    }

    fn parse_declaration_element(&mut self) -> Result<Element> {
        let public = self.consume_keyword(Keyword::Pub);

        if self.peek().is_keyword(Keyword::Typedef) {
            return self.parse_typedef(public);
        }

        let record = matches!(
            self.peek().kind,
            TokenKind::Keyword(Keyword::Struct | Keyword::Union | Keyword::Enum)
        );
        if record {
            if let Some(element) = self.attempt(|p| p.parse_record_definition(public)) {
                return Ok(element);
            }
            if let Some(element) = self.attempt(|p| p.parse_record_forward()) {
                return Ok(element);
            }
        }

        let ty = self.parse_type()?;
        let form = self.parse_form(false)?;

        if form.is_function() {
            let body = if self.consume(Symbol::Semicolon) {
                None
            } else {
                Some(self.parse_block()?)
            };
            return Ok(Element::Function(Function {
                public,
                ty,
                form,
                body,
            }));
        }

        if public {
            return Err(Error::PubVariable {
                file: self.file.clone(),
                pos: self.name_pos,
                name: form.name().unwrap_or_default().to_string(),
            });
        }
        let declaration = self.parse_declarators(ty, form)?;
        Ok(Element::Variable(declaration))
    }

    /// typedef = "typedef" type form ";"
    fn parse_typedef(&mut self, public: bool) -> Result<Element> {
        self.expect_keyword(Keyword::Typedef)?;
        let ty = self.parse_type()?;
        let form = self.parse_form(false)?;
        let Some(name) = form.name().map(str::to_string) else {
            return Err(self.error("typedef name"));
        };
        self.expect(Symbol::Semicolon)?;
        self.register(&name, self.name_pos)?;
        Ok(Element::Typedef(Typedef { public, ty, form }))
    }

    /// record-def = ("struct" | "union" | "enum") name "{" ... "}" ";"
    fn parse_record_definition(&mut self, public: bool) -> Result<Element> {
        let record = self.parse_record()?;
        self.expect(Symbol::Semicolon)?;
        let Record {
            kind,
            name: Some(name),
            body: Some(body),
        } = record
        else {
            return Err(self.error("named definition"));
        };
        let element = match body {
            RecordBody::Fields(fields) => Element::StructDef(StructDef {
                public,
                kind,
                name,
                fields,
            }),
            RecordBody::Enumerators(variants) => Element::EnumDef(EnumDef {
                public,
                name,
                variants,
            }),
        };
        Ok(element)
    }

    /// record-forward = ("struct" | "union") name ";"
    fn parse_record_forward(&mut self) -> Result<Element> {
        let kind = match self.bump().kind {
            TokenKind::Keyword(Keyword::Struct) => RecordKind::Struct,
            TokenKind::Keyword(Keyword::Union) => RecordKind::Union,
            _ => return Err(self.error("`struct` or `union`")),
        };
        let name = self.expect_word()?;
        self.expect(Symbol::Semicolon)?;
        Ok(Element::StructForward(StructForward { kind, name }))
    }

    /// Reads `[= init] ("," form [= init])* ";"` after the first form.
    fn parse_declarators(&mut self, ty: Type, first: Form) -> Result<Declaration> {
        let mut declarators = vec![];
        let mut form = first;
        loop {
            let init = if self.consume(Symbol::Assign) {
                Some(self.parse_expression(0)?)
            } else {
                None
            };
            declarators.push(Declarator { form, init });
            if !self.consume(Symbol::Comma) {
                break;
            }
            form = self.parse_form(false)?;
        }
        self.expect(Symbol::Semicolon)?;
        Ok(Declaration { ty, declarators })
    }

    /// Whether the token under the cursor can begin a type.
    pub(super) fn starts_type(&self, token: &Token) -> bool {
        match &token.kind {
            TokenKind::Keyword(k) => k.starts_type(),
            TokenKind::Word(w) => self.names.contains(w),
            _ => false,
        }
    }

    /// type = (modifier | base-keyword | record | type-name)+
    ///
    /// At most one record or type name is taken, so in `foo_t bar` only
    /// `foo_t` belongs to the type.
    pub(super) fn parse_type(&mut self) -> Result<Type> {
        let mut parts = vec![];
        let mut has_base = false;
        loop {
            match &self.peek().kind {
                TokenKind::Keyword(k) if k.is_type_modifier() => {
                    parts.push(TypePart::Keyword(*k));
                    self.bump();
                }
                TokenKind::Keyword(k) if k.is_base_type() => {
                    parts.push(TypePart::Keyword(*k));
                    self.bump();
                    has_base = true;
                }
                TokenKind::Keyword(k) if k.is_record() && !has_base => {
                    parts.push(TypePart::Record(self.parse_record()?));
                    has_base = true;
                }
                TokenKind::Word(w) if !has_base && self.names.contains(w) => {
                    parts.push(TypePart::Name(w.clone()));
                    self.bump();
                    has_base = true;
                }
                _ => break,
            }
        }
        if !has_base {
            return Err(self.error("type"));
        }
        Ok(Type { parts })
    }

    /// record = ("struct" | "union" | "enum") name? ("{" body "}")?
    fn parse_record(&mut self) -> Result<Record> {
        let kind = match self.bump().kind {
            TokenKind::Keyword(Keyword::Struct) => RecordKind::Struct,
            TokenKind::Keyword(Keyword::Union) => RecordKind::Union,
            TokenKind::Keyword(Keyword::Enum) => RecordKind::Enum,
            _ => return Err(self.error("`struct`, `union` or `enum`")),
        };
        let name = if self.peek().word().is_some() {
            Some(self.expect_word()?)
        } else {
            None
        };

        if !self.consume(Symbol::LBrace) {
            if name.is_none() {
                return Err(self.error(format!("{} name or body", kind.as_str())));
            }
            return Ok(Record {
                kind,
                name,
                body: None,
            });
        }

        let body = if kind == RecordKind::Enum {
            RecordBody::Enumerators(self.parse_enumerators()?)
        } else {
            let mut fields = vec![];
            while !self.consume(Symbol::RBrace) {
                let ty = self.parse_type()?;
                let form = self.parse_form(false)?;
                fields.push(self.parse_declarators(ty, form)?);
            }
            RecordBody::Fields(fields)
        };
        Ok(Record {
            kind,
            name,
            body: Some(body),
        })
    }

    /// enumerators = (name ("=" expr)? ","?)* "}"
    fn parse_enumerators(&mut self) -> Result<Vec<Enumerator>> {
        let mut variants = vec![];
        while !self.consume(Symbol::RBrace) {
            let name = self.expect_word()?;
            let value = if self.consume(Symbol::Assign) {
                Some(self.parse_expression(0)?)
            } else {
                None
            };
            variants.push(Enumerator { name, value });
            if !self.consume(Symbol::Comma) {
                self.expect(Symbol::RBrace)?;
                break;
            }
        }
        Ok(variants)
    }

    /// form = ("*" qualifier*)* (name | "(" form ")")? ("[" expr? "]" | "(" params ")")*
    ///
    /// The core may only be left out when `abstract_ok`, as in casts and
    /// parameter lists.
    pub(super) fn parse_form(&mut self, abstract_ok: bool) -> Result<Form> {
        let mut pointers = vec![];
        while self.consume(Symbol::Star) {
            let mut qualifiers = vec![];
            while let TokenKind::Keyword(k @ (Keyword::Const | Keyword::Volatile | Keyword::Restrict)) = self.peek().kind {
                qualifiers.push(k);
                self.bump();
            }
            pointers.push(Pointer { qualifiers });
        }

        let core = if self.peek().word().is_some() {
            FormCore::Name(self.expect_word()?)
        } else if self.check(Symbol::LParen) && self.peek_at(1).is_symbol(Symbol::Star) {
            self.bump();
            let inner = self.parse_form(abstract_ok)?;
            self.expect(Symbol::RParen)?;
            FormCore::Nested(Box::new(inner))
        } else if abstract_ok {
            FormCore::Abstract
        } else {
            return Err(self.error("declarator name"));
        };

        let mut modifiers = vec![];
        loop {
            if self.consume(Symbol::LBracket) {
                let size = if self.check(Symbol::RBracket) {
                    None
                } else {
                    Some(self.parse_expression(0)?)
                };
                self.expect(Symbol::RBracket)?;
                modifiers.push(Modifier::Array(size));
            } else if self.check(Symbol::LParen) {
                modifiers.push(Modifier::Params(self.parse_params()?));
            } else {
                break;
            }
        }

        Ok(Form {
            pointers,
            core,
            modifiers,
        })
    }

    /// params = "(" (param ("," param)* ("," "...")?)? ")"
    fn parse_params(&mut self) -> Result<Params> {
        self.expect(Symbol::LParen)?;
        let mut params = Params::default();
        if self.consume(Symbol::RParen) {
            return Ok(params);
        }
        loop {
            if self.consume(Symbol::Ellipsis) {
                params.variadic = true;
                self.expect(Symbol::RParen)?;
                break;
            }
            let ty = self.parse_type()?;
            let form = self.parse_form(true)?;
            params.params.push(Param { ty, form });
            if !self.consume(Symbol::Comma) {
                self.expect(Symbol::RParen)?;
                break;
            }
        }
        Ok(params)
    }

    pub(super) fn parse_type_name(&mut self) -> Result<TypeName> {
        let ty = self.parse_type()?;
        let form = self.parse_form(true)?;
        Ok(TypeName { ty, form })
    }

    /// block = "{" stmt* "}"
    pub(super) fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.expect(Symbol::LBrace)?;
        let mut stmts = vec![];
        while !self.consume(Symbol::RBrace) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    /// stmt = block | ";" | if | while | do | for | switch | return | defer
    ///      | "break" ";" | "continue" ";" | declaration | expr ";"
    fn parse_stmt(&mut self) -> Result<Stmt> {
        let TokenKind::Keyword(keyword) = self.peek().kind else {
            if self.check(Symbol::LBrace) {
                return Ok(Stmt::Block(self.parse_block()?));
            }
            if self.consume(Symbol::Semicolon) {
                return Ok(Stmt::Empty);
            }
            return self.parse_simple_stmt();
        };

        match keyword {
            Keyword::If => {
                self.bump();
                let cond = self.parse_condition()?;
                let then = Box::new(self.parse_stmt()?);
                let otherwise = if self.consume_keyword(Keyword::Else) {
                    Some(Box::new(self.parse_stmt()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then,
                    otherwise,
                })
            }
            Keyword::While => {
                self.bump();
                let cond = self.parse_condition()?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::While { cond, body })
            }
            Keyword::Do => {
                self.bump();
                let body = Box::new(self.parse_stmt()?);
                self.expect_keyword(Keyword::While)?;
                let cond = self.parse_condition()?;
                self.expect(Symbol::Semicolon)?;
                Ok(Stmt::DoWhile { body, cond })
            }
            Keyword::For => self.parse_for(),
            Keyword::Switch => self.parse_switch(),
            Keyword::Return => {
                self.bump();
                let value = if self.check(Symbol::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression(0)?)
                };
                self.expect(Symbol::Semicolon)?;
                Ok(Stmt::Return(value))
            }
            Keyword::Defer => {
                self.bump();
                let expr = self.parse_expression(0)?;
                self.expect(Symbol::Semicolon)?;
                Ok(Stmt::Defer(expr))
            }
            Keyword::Break => {
                self.bump();
                self.expect(Symbol::Semicolon)?;
                Ok(Stmt::Break)
            }
            Keyword::Continue => {
                self.bump();
                self.expect(Symbol::Semicolon)?;
                Ok(Stmt::Continue)
            }
            _ => self.parse_simple_stmt(),
        }
    }

    /// A declaration when the next token can start a type, an expression
    /// statement otherwise.
    fn parse_simple_stmt(&mut self) -> Result<Stmt> {
        if self.starts_type(self.peek()) {
            let ty = self.parse_type()?;
            let form = self.parse_form(false)?;
            return Ok(Stmt::Declaration(self.parse_declarators(ty, form)?));
        }
        let expr = self.parse_expression(0)?;
        self.expect(Symbol::Semicolon)?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_condition(&mut self) -> Result<super::Expr> {
        self.expect(Symbol::LParen)?;
        let cond = self.parse_expression(0)?;
        self.expect(Symbol::RParen)?;
        Ok(cond)
    }

    /// for = "for" "(" (declaration | expr? ";") expr? ";" expr? ")" stmt
    fn parse_for(&mut self) -> Result<Stmt> {
        self.expect_keyword(Keyword::For)?;
        self.expect(Symbol::LParen)?;

        let init = if self.consume(Symbol::Semicolon) {
            None
        } else if self.starts_type(self.peek()) {
            let ty = self.parse_type()?;
            let form = self.parse_form(false)?;
            Some(ForInit::Declaration(self.parse_declarators(ty, form)?))
        } else {
            let expr = self.parse_expression(0)?;
            self.expect(Symbol::Semicolon)?;
            Some(ForInit::Expr(expr))
        };
        let cond = if self.check(Symbol::Semicolon) {
            None
        } else {
            Some(self.parse_expression(0)?)
        };
        self.expect(Symbol::Semicolon)?;
        let step = if self.check(Symbol::RParen) {
            None
        } else {
            Some(self.parse_expression(0)?)
        };
        self.expect(Symbol::RParen)?;

        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For {
            init,
            cond,
            step,
            body,
        })
    }

    /// switch = "switch" "(" expr ")" "{" (("case" expr | "default") ":" stmt*)* "}"
    fn parse_switch(&mut self) -> Result<Stmt> {
        self.expect_keyword(Keyword::Switch)?;
        let value = self.parse_condition()?;
        self.expect(Symbol::LBrace)?;

        let mut cases: Vec<Case> = vec![];
        while !self.consume(Symbol::RBrace) {
            if self.consume_keyword(Keyword::Case) {
                let label = self.parse_expression(0)?;
                self.expect(Symbol::Colon)?;
                cases.push(Case {
                    label: Some(label),
                    body: vec![],
                });
            } else if self.consume_keyword(Keyword::Default) {
                self.expect(Symbol::Colon)?;
                cases.push(Case {
                    label: None,
                    body: vec![],
                });
            } else {
                let Some(case) = cases.last_mut() else {
                    return Err(self.error("`case` or `default`"));
                };
                let stmt = self.parse_stmt()?;
                case.body.push(stmt);
            }
        }
        Ok(Stmt::Switch { value, cases })
    }
}
