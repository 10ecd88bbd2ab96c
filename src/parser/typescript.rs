use crate::model::{ReExport, ReExportBinding, TokenRecord, DEFAULT_IDENT, NAMESPACE_IDENT};
use crate::resolver::specifier::{join_relative, parent_dir};

use super::scanner::{Position, Scanner, Token};
use super::TokenizeError;

/// One entry of a brace list: `name`, `name as alias`, `type name`.
type BraceEntry = (String, Option<String>);

/// Walks the token stream and records module syntax into a [`TokenRecord`].
///
/// Recognised constructs:
/// - `require("x")`, with comments allowed anywhere between the tokens
/// - `import ... from "x"`, `import "x"`, `import("x")`
/// - `export` declarations, lists and defaults
/// - `export * from "x"`, `export * as ns from "x"`, `export { a } from "x"`
///
/// Everything else is skipped token by token.
pub(crate) struct Extractor<'a> {
    scanner: Scanner<'a>,
    record: TokenRecord,
    dir: String,
}

impl<'a> Extractor<'a> {
    pub fn new(source: &'a str, path: String) -> Self {
        let dir = parent_dir(&path).to_string();
        Self {
            scanner: Scanner::new(source),
            record: TokenRecord::new(path),
            dir,
        }
    }

    pub fn run(mut self) -> Result<TokenRecord, TokenizeError> {
        loop {
            let after_dot = self.scanner.after_dot();
            let position = self.scanner.position();
            let start = self.scanner.token_start();
            match self.scanner.next_token() {
                Token::Eof => break,
                Token::Ident("require") if !after_dot => self.require_call(),
                Token::Ident("import") if !after_dot => self.import(start, position)?,
                Token::Ident("export") if !after_dot => self.export(),
                _ => {}
            }
        }
        Ok(self.record)
    }

    fn specifier(&self, raw: &str) -> String {
        join_relative(&self.dir, raw)
    }

    fn require_call(&mut self) {
        let checkpoint = self.scanner.checkpoint();
        if self.scanner.eat_punct(b'(') {
            if let Token::Str(raw) = self.scanner.next_token() {
                if self.scanner.eat_punct(b')') {
                    let spec = self.specifier(raw);
                    self.record.add_import(spec, Vec::<String>::new());
                    return;
                }
            }
        }
        self.scanner.restore(checkpoint);
    }

    /// `import(` is an expression and counts anywhere. Import statements
    /// only count at a statement start; right after a brace on the same line
    /// a statement that fails to parse is treated as plain text.
    fn import(&mut self, start: usize, position: Position) -> Result<(), TokenizeError> {
        if self.scanner.peek_token() == Token::Punct(b'(') {
            self.dynamic_import();
            return Ok(());
        }
        match position {
            Position::StatementStart => self.import_statement(start),
            Position::AfterBrace => {
                let checkpoint = self.scanner.checkpoint();
                if self.import_statement(start).is_err() {
                    self.scanner.restore(checkpoint);
                }
                Ok(())
            }
            Position::Inline => Ok(()),
        }
    }

    fn import_statement(&mut self, start: usize) -> Result<(), TokenizeError> {
        match self.scanner.peek_token() {
            Token::Str(raw) => {
                self.scanner.next_token();
                let spec = self.specifier(raw);
                self.record.add_import(spec, Vec::<String>::new());
                Ok(())
            }
            Token::Ident(_) | Token::Punct(b'{') | Token::Punct(b'*') => {
                self.import_declaration(start)
            }
            Token::Eof => Err(self.malformed(start, "an import clause or module specifier")),
            // `import.meta`, `{ import: ... }` and friends.
            _ => Ok(()),
        }
    }

    fn dynamic_import(&mut self) {
        let checkpoint = self.scanner.checkpoint();
        self.scanner.next_token();
        if let Token::Str(raw) = self.scanner.next_token() {
            let spec = self.specifier(raw);
            self.record.add_import(spec, Vec::<String>::new());
            return;
        }
        self.scanner.restore(checkpoint);
    }

    fn import_declaration(&mut self, start: usize) -> Result<(), TokenizeError> {
        let mut idents: Vec<String> = Vec::new();

        // `import type ...` unless `type` is itself the default binding.
        if self.scanner.peek_token() == Token::Ident("type") {
            let checkpoint = self.scanner.checkpoint();
            self.scanner.next_token();
            match self.scanner.peek_token() {
                Token::Ident(word) if word != "from" => {}
                Token::Punct(b'{') | Token::Punct(b'*') => {}
                _ => self.scanner.restore(checkpoint),
            }
        }

        let mut expect_more = true;
        if let Token::Ident(name) = self.scanner.peek_token() {
            if !self.is_from_clause_ahead(name) {
                self.scanner.next_token();
                if self.scanner.peek_token() == Token::Punct(b'=') {
                    // `import x = require("y")`; the require is picked up by the main loop.
                    return Ok(());
                }
                idents.push(DEFAULT_IDENT.to_string());
                expect_more = self.scanner.eat_punct(b',');
            }
        }

        if expect_more {
            match self.scanner.peek_token() {
                Token::Punct(b'*') => {
                    self.scanner.next_token();
                    if !self.scanner.eat_ident("as") {
                        return Err(self.malformed(start, "`as` after `*`"));
                    }
                    if !matches!(self.scanner.next_token(), Token::Ident(_)) {
                        return Err(self.malformed(start, "a namespace binding name"));
                    }
                    idents.push(NAMESPACE_IDENT.to_string());
                }
                Token::Punct(b'{') => {
                    self.scanner.next_token();
                    let entries = self
                        .brace_list()
                        .ok_or_else(|| self.malformed(start, "a closing `}` in the import list"))?;
                    idents.extend(entries.into_iter().map(|(name, _)| name));
                }
                _ if idents.is_empty() => {
                    return Err(self.malformed(start, "an import binding"));
                }
                _ => {}
            }
        }

        if !self.scanner.eat_ident("from") {
            return Err(self.malformed(start, "`from`"));
        }
        match self.scanner.next_token() {
            Token::Str(raw) => {
                let spec = self.specifier(raw);
                self.record.add_import(spec, idents);
                Ok(())
            }
            _ => Err(self.malformed(start, "a module specifier string")),
        }
    }

    /// True when `name` is the `from` keyword of `import from "x"`-less syntax,
    /// i.e. the next tokens are `from "<specifier>"` rather than a binding.
    fn is_from_clause_ahead(&mut self, name: &str) -> bool {
        if name != "from" {
            return false;
        }
        let checkpoint = self.scanner.checkpoint();
        self.scanner.next_token();
        let next = self.scanner.next_token();
        self.scanner.restore(checkpoint);
        matches!(next, Token::Str(_))
    }

    /// Parse the body of `{ ... }` after the opening brace.
    ///
    /// Returns `None` when the list is not well formed.
    fn brace_list(&mut self) -> Option<Vec<BraceEntry>> {
        let mut entries = Vec::new();
        loop {
            let name = match self.scanner.next_token() {
                Token::Punct(b'}') => return Some(entries),
                Token::Ident(word) | Token::Str(word) => word.to_string(),
                _ => return None,
            };
            let name = if name == "type" {
                match self.scanner.peek_token() {
                    Token::Ident(word) if word != "as" => {
                        self.scanner.next_token();
                        word.to_string()
                    }
                    Token::Str(word) => {
                        self.scanner.next_token();
                        word.to_string()
                    }
                    _ => name,
                }
            } else {
                name
            };
            let alias = if self.scanner.eat_ident("as") {
                match self.scanner.next_token() {
                    Token::Ident(word) | Token::Str(word) => Some(word.to_string()),
                    _ => return None,
                }
            } else {
                None
            };
            entries.push((name, alias));
            match self.scanner.next_token() {
                Token::Punct(b',') => {}
                Token::Punct(b'}') => return Some(entries),
                _ => return None,
            }
        }
    }

    fn export(&mut self) {
        let checkpoint = self.scanner.checkpoint();
        if !self.export_clause() {
            self.scanner.restore(checkpoint);
        }
    }

    /// Returns false when the tokens after `export` are not recognised.
    fn export_clause(&mut self) -> bool {
        match self.scanner.next_token() {
            Token::Ident("default") => {
                self.record.add_export(DEFAULT_IDENT);
                true
            }
            Token::Punct(b'=') => {
                self.record.add_export(DEFAULT_IDENT);
                true
            }
            Token::Punct(b'*') => self.export_star(),
            Token::Punct(b'{') => self.export_list(),
            Token::Ident("type") => match self.scanner.next_token() {
                Token::Punct(b'{') => self.export_list(),
                Token::Punct(b'*') => self.export_star(),
                Token::Ident(name) => {
                    self.record.add_export(name);
                    true
                }
                _ => false,
            },
            Token::Ident(keyword) => self.export_declaration(keyword),
            _ => false,
        }
    }

    fn export_star(&mut self) -> bool {
        let namespace = if self.scanner.eat_ident("as") {
            match self.scanner.next_token() {
                Token::Ident(name) | Token::Str(name) => Some(name.to_string()),
                _ => return false,
            }
        } else {
            None
        };
        if !self.scanner.eat_ident("from") {
            return false;
        }
        let Token::Str(raw) = self.scanner.next_token() else {
            return false;
        };
        let spec = self.specifier(raw);
        match namespace {
            Some(name) => {
                self.record.add_export(name);
                self.record.add_import(spec, Vec::<String>::new());
            }
            None => self.record.re_exports.push(ReExport::Wildcard { specifier: spec }),
        }
        true
    }

    fn export_list(&mut self) -> bool {
        let Some(entries) = self.brace_list() else {
            return false;
        };
        if self.scanner.eat_ident("from") {
            let Token::Str(raw) = self.scanner.next_token() else {
                return false;
            };
            let spec = self.specifier(raw);
            self.record
                .add_import(spec.clone(), entries.iter().map(|(name, _)| name.clone()));
            let bindings = entries
                .into_iter()
                .map(|(name, alias)| ReExportBinding { name, alias })
                .collect();
            self.record.re_exports.push(ReExport::Named {
                specifier: spec,
                bindings,
            });
        } else {
            for (name, alias) in entries {
                self.record.add_export(alias.unwrap_or(name));
            }
        }
        true
    }

    fn export_declaration(&mut self, first: &'a str) -> bool {
        let mut keyword = first;
        while matches!(keyword, "declare" | "abstract" | "async") {
            match self.scanner.next_token() {
                Token::Ident(next) => keyword = next,
                _ => return false,
            }
        }

        match keyword {
            "function" => {
                self.scanner.eat_punct(b'*');
                self.export_name()
            }
            "class" | "interface" | "enum" | "namespace" | "module" | "type" | "import" => {
                self.export_name()
            }
            "const" => {
                if self.scanner.eat_ident("enum") {
                    self.export_name()
                } else {
                    self.export_binding_pattern()
                }
            }
            "let" | "var" => self.export_binding_pattern(),
            _ => false,
        }
    }

    fn export_name(&mut self) -> bool {
        match self.scanner.next_token() {
            Token::Ident(name) => {
                self.record.add_export(name);
                true
            }
            _ => false,
        }
    }

    fn export_binding_pattern(&mut self) -> bool {
        match self.scanner.next_token() {
            Token::Ident(name) => {
                self.record.add_export(name);
                true
            }
            Token::Punct(b'{') => self.object_pattern(),
            Token::Punct(b'[') => self.array_pattern(),
            _ => false,
        }
    }

    /// `{ a, b: c, d = 1, ...rest }`, one level deep.
    fn object_pattern(&mut self) -> bool {
        loop {
            match self.scanner.next_token() {
                Token::Punct(b'}') => return true,
                Token::Punct(b',') => {}
                Token::Ellipsis => {
                    if let Token::Ident(rest) = self.scanner.next_token() {
                        self.record.add_export(rest);
                    }
                }
                Token::Ident(key) => {
                    if self.scanner.eat_punct(b':') {
                        match self.scanner.next_token() {
                            Token::Ident(local) => self.record.add_export(local),
                            Token::Punct(open @ (b'{' | b'[')) => self.skip_nested(open),
                            _ => return false,
                        }
                    } else {
                        self.record.add_export(key);
                    }
                    if self.scanner.eat_punct(b'=') {
                        self.skip_default_value(b'}');
                    }
                }
                _ => return false,
            }
        }
    }

    /// `[a, , b = 1, ...rest]`, one level deep.
    fn array_pattern(&mut self) -> bool {
        loop {
            match self.scanner.next_token() {
                Token::Punct(b']') => return true,
                Token::Punct(b',') => {}
                Token::Ellipsis => {
                    if let Token::Ident(rest) = self.scanner.next_token() {
                        self.record.add_export(rest);
                    }
                }
                Token::Ident(name) => {
                    self.record.add_export(name);
                    if self.scanner.eat_punct(b'=') {
                        self.skip_default_value(b']');
                    }
                }
                Token::Punct(open @ (b'{' | b'[')) => self.skip_nested(open),
                _ => return false,
            }
        }
    }

    /// Skip a nested pattern whose opening bracket was just consumed.
    fn skip_nested(&mut self, open: u8) {
        let close = if open == b'{' { b'}' } else { b']' };
        let mut depth = 1usize;
        while depth > 0 {
            match self.scanner.next_token() {
                Token::Eof => return,
                Token::Punct(b) if b == open => depth += 1,
                Token::Punct(b) if b == close => depth -= 1,
                _ => {}
            }
        }
    }

    /// Skip a default-value expression up to the next `,` or `close` at depth zero,
    /// leaving that delimiter unconsumed.
    fn skip_default_value(&mut self, close: u8) {
        let mut depth = 0usize;
        loop {
            match self.scanner.peek_token() {
                Token::Eof => return,
                Token::Punct(b',') if depth == 0 => return,
                Token::Punct(b) if b == close && depth == 0 => return,
                Token::Punct(b'(' | b'[' | b'{') => depth += 1,
                Token::Punct(b')' | b']' | b'}') => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.scanner.next_token();
        }
    }

    fn malformed(&self, offset: usize, expected: &'static str) -> TokenizeError {
        let (line, column) = self.scanner.line_col(offset);
        TokenizeError::MalformedImport {
            path: self.record.path.clone(),
            line,
            column,
            expected,
        }
    }
}
