//! Lexical cursor over JavaScript/TypeScript source text.
//!
//! Produces just enough token structure to recognise module syntax: it skips
//! whitespace and comments, and consumes string, template and regex literals
//! whole so nothing inside them is mistaken for a keyword.

/// A significant token. Literal contents borrow from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Ident(&'a str),
    /// A terminated single- or double-quoted string, without its quotes.
    Str(&'a str),
    Template,
    Regex,
    Number,
    /// `...`
    Ellipsis,
    Punct(u8),
    /// A string literal with no closing quote on its line.
    Unterminated,
    Eof,
}

/// Where the next token sits relative to statement boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// Start of input, after `;`, or first on its line.
    StatementStart,
    /// Directly after `{` or `}` on the same line.
    AfterBrace,
    /// Anywhere else: mid-expression, JSX text, and so on.
    Inline,
}

/// Saved scanner state for backtracking.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    pos: usize,
    regex_allowed: bool,
    after_dot: bool,
    last: Position,
    line_break: bool,
}

/// Keywords after which a `/` starts a regex rather than a division.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

pub(crate) struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    regex_allowed: bool,
    after_dot: bool,
    /// Position implied by the last consumed token.
    last: Position,
    /// A line break was skipped since the last consumed token.
    line_break: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            regex_allowed: true,
            after_dot: false,
            last: Position::StatementStart,
            line_break: false,
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            regex_allowed: self.regex_allowed,
            after_dot: self.after_dot,
            last: self.last,
            line_break: self.line_break,
        }
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.regex_allowed = checkpoint.regex_allowed;
        self.after_dot = checkpoint.after_dot;
        self.last = checkpoint.last;
        self.line_break = checkpoint.line_break;
    }

    /// Whether the most recently returned token was a member-access dot.
    pub fn after_dot(&self) -> bool {
        self.after_dot
    }

    /// Statement position of the next significant token.
    pub fn position(&mut self) -> Position {
        self.skip_trivia();
        if self.line_break {
            Position::StatementStart
        } else {
            self.last
        }
    }

    /// Byte offset of the next significant token.
    pub fn token_start(&mut self) -> usize {
        self.skip_trivia();
        self.pos
    }

    /// 1-based line and column for a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let before = &self.src[..offset.min(self.src.len())];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, column)
    }

    pub fn peek_token(&mut self) -> Token<'a> {
        let checkpoint = self.checkpoint();
        let token = self.next_token();
        self.restore(checkpoint);
        token
    }

    /// Consume the next token if it is the given punctuation byte.
    pub fn eat_punct(&mut self, punct: u8) -> bool {
        if self.peek_token() == Token::Punct(punct) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume the next token if it is the given identifier or keyword.
    pub fn eat_ident(&mut self, word: &str) -> bool {
        if self.peek_token() == Token::Ident(word) {
            self.next_token();
            true
        } else {
            false
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_trivia();
        let token = self.read_token();
        self.regex_allowed = match token {
            Token::Ident(word) => REGEX_PRECEDING_KEYWORDS.contains(&word),
            Token::Punct(b')') | Token::Punct(b']') | Token::Punct(b'}') => false,
            Token::Punct(_) | Token::Ellipsis => true,
            _ => false,
        };
        self.after_dot = token == Token::Punct(b'.');
        self.last = match token {
            Token::Punct(b';') => Position::StatementStart,
            Token::Punct(b'{') | Token::Punct(b'}') => Position::AfterBrace,
            _ => Position::Inline,
        };
        self.line_break = false;
        token
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek_byte(0) {
            match b {
                b'\n' => {
                    self.line_break = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek_byte(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek_byte(1) == Some(b'*') => self.skip_block_comment(),
                // Hashbang on the first line.
                b'#' if self.pos == 0 && self.peek_byte(1) == Some(b'!') => {
                    self.skip_line_comment()
                }
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        match self.src[self.pos..].find('\n') {
            Some(nl) => {
                self.pos += nl + 1;
                self.line_break = true;
            }
            None => self.pos = self.bytes.len(),
        }
    }

    fn skip_block_comment(&mut self) {
        let end = match self.src[self.pos + 2..].find("*/") {
            Some(end) => self.pos + 2 + end + 2,
            None => self.bytes.len(),
        };
        if self.src[self.pos..end].contains('\n') {
            self.line_break = true;
        }
        self.pos = end;
    }

    fn read_token(&mut self) -> Token<'a> {
        let Some(b) = self.peek_byte(0) else {
            return Token::Eof;
        };
        match b {
            b'"' | b'\'' => self.read_string(b),
            b'`' => {
                self.skip_template();
                Token::Template
            }
            b'/' if self.regex_allowed => self.read_regex(),
            b'.' if self.peek_byte(1) == Some(b'.') && self.peek_byte(2) == Some(b'.') => {
                self.pos += 3;
                Token::Ellipsis
            }
            b'0'..=b'9' => {
                self.pos += 1;
                while self
                    .peek_byte(0)
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'.')
                {
                    self.pos += 1;
                }
                Token::Number
            }
            b if is_ident_start(b) => {
                let start = self.pos;
                while self.peek_byte(0).is_some_and(is_ident_part) {
                    self.pos += 1;
                }
                Token::Ident(&self.src[start..self.pos])
            }
            b'\\' => {
                // Unicode escape inside an identifier; treat as opaque.
                self.pos += 1;
                Token::Punct(b'\\')
            }
            _ => {
                self.pos += 1;
                Token::Punct(b)
            }
        }
    }

    fn read_string(&mut self, quote: u8) -> Token<'a> {
        let start = self.pos + 1;
        let mut i = start;
        while let Some(&c) = self.bytes.get(i) {
            match c {
                b'\\' => i += 2,
                b'\n' => break,
                c if c == quote => {
                    self.pos = i + 1;
                    return Token::Str(&self.src[start..i]);
                }
                _ => i += 1,
            }
        }
        // Leave the rest of the line to the caller's recovery.
        self.pos = i.min(self.bytes.len());
        Token::Unterminated
    }

    fn skip_template(&mut self) {
        self.pos += 1;
        while let Some(c) = self.peek_byte(0) {
            match c {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return;
                }
                b'$' if self.peek_byte(1) == Some(b'{') => {
                    self.pos += 2;
                    self.skip_substitution();
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
    }

    /// Skip a `${ ... }` body, including nested literals, up to its closing brace.
    fn skip_substitution(&mut self) {
        self.regex_allowed = true;
        let mut depth = 0usize;
        loop {
            match self.next_token() {
                Token::Eof => return,
                Token::Punct(b'{') => depth += 1,
                Token::Punct(b'}') if depth == 0 => return,
                Token::Punct(b'}') => depth -= 1,
                _ => {}
            }
        }
    }

    fn read_regex(&mut self) -> Token<'a> {
        let start = self.pos;
        let mut i = start + 1;
        let mut in_class = false;
        while let Some(&c) = self.bytes.get(i) {
            match c {
                b'\\' => i += 2,
                b'\n' => break,
                b'[' => {
                    in_class = true;
                    i += 1;
                }
                b']' => {
                    in_class = false;
                    i += 1;
                }
                b'/' if !in_class => {
                    self.pos = i + 1;
                    while self.peek_byte(0).is_some_and(is_ident_part) {
                        self.pos += 1;
                    }
                    return Token::Regex;
                }
                _ => i += 1,
            }
        }
        // Not a regex after all: plain slash.
        self.pos = start + 1;
        Token::Punct(b'/')
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}
