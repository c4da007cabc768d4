//! Tokenization and lexeme classification.
//!
//! The lexer works in two layers: [`Lexer::scan`] cuts the byte buffer into
//! raw [`Token`]s (maximal non-delimiter runs, or single delimiter bytes),
//! and [`Lexer::next`] runs those tokens through the greedy symbol tree to
//! produce typed [`Lexeme`]s.

mod lexeme;
mod symbols;
mod token;

pub use lexeme::*;
pub use token::*;

use std::{error::Error, fmt::Display};

use symbols::{Ctor, Entry, Node, SYMBOLS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub col: usize,
    pub fragment: String,
}

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unrecognized symbol '{}' at ({}:{})",
            self.fragment, self.line, self.col
        )
    }
}

impl Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b'"' | b'\''
            | b':'
            | b'!'
            | b','
            | b';'
            | b'+'
            | b'*'
            | b'^'
            | b'&'
            | b'@'
            | b'#'
            | b'$'
            | b'%'
            | b'-'
            | b'\\'
            | b'/'
            | b'|'
            | b'='
            | b'('
            | b')'
            | b'?'
            | b'<'
            | b'>'
            | b'['
            | b']'
            | b' '
            | b'\t'
            | b'\r'
            | b'\n'
    )
}

fn is_newline_byte(byte: u8) -> bool {
    byte == b'\n' || byte == b';'
}

/// Restartable lexer over an owned byte buffer.
#[derive(Debug, Clone)]
pub struct Lexer {
    src: Vec<u8>,
    pos: usize,
    line: usize,
    col: usize,
    last_was_value: bool,
}

impl Lexer {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            src: source.into().into_bytes(),
            pos: 0,
            line: 0,
            col: 0,
            last_was_value: false,
        }
    }

    fn checkpoint(&self) -> (usize, usize, usize) {
        (self.pos, self.line, self.col)
    }

    fn rewind(&mut self, to: (usize, usize, usize)) {
        (self.pos, self.line, self.col) = to;
    }

    /// Cut the next raw token out of the buffer. A token is a maximal run of
    /// non-delimiter bytes, or a single delimiter byte; a delimiter hit
    /// mid-run is pushed back for the next call.
    fn scan(&mut self) -> Option<Token> {
        if self.pos >= self.src.len() {
            return None;
        }

        let start = self.pos;

        while self.pos < self.src.len() {
            let byte = self.src[self.pos];

            if !is_delimiter(byte) {
                self.pos += 1;
                continue;
            }

            if self.pos == start {
                // a single delimiter byte is a token of its own
                self.pos += 1;
            }
            break;
        }

        let word = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        let token = Token::new(word, self.line, self.col, start);

        if token.word.len() == 1 && is_newline_byte(self.src[start]) {
            self.col = 0;
            self.line += 1;
        } else {
            self.col += token.word.len();
        }

        Some(token)
    }

    /// Classify tokens through the symbol tree, greedily. Returns `Ok(None)`
    /// at end of input.
    pub fn next(&mut self) -> LexResult<Option<Lexeme>> {
        let mut node: &Node = &SYMBOLS;
        let mut word = String::new();
        let mut first: Option<Token> = None;

        loop {
            let checkpoint = self.checkpoint();

            let Some(token) = self.scan() else {
                // EOF; fall back to the terminal of the current node
                let Some(start) = first else {
                    return Ok(None);
                };
                let Some(ctor) = node.terminal else {
                    return Err(LexError {
                        line: start.line,
                        col: start.col,
                        fragment: word,
                    });
                };
                return self.emit(ctor, start, word).map(Some);
            };

            let hit = node.edges.iter().find(|edge| {
                (!edge.not_after_value || !self.last_was_value)
                    && edge.pattern.is_match(&token.word)
            });

            let Some(edge) = hit else {
                if first.is_none() {
                    return Err(LexError {
                        line: token.line,
                        col: token.col,
                        fragment: token.word,
                    });
                }
                // back off to the terminal of what we accumulated so far
                let start = first.unwrap();
                let Some(ctor) = node.terminal else {
                    return Err(LexError {
                        line: start.line,
                        col: start.col,
                        fragment: word,
                    });
                };
                self.rewind(checkpoint);
                return self.emit(ctor, start, word).map(Some);
            };

            if first.is_none() {
                first = Some(token.clone());
            }
            word.push_str(&token.word);

            match &edge.next {
                Entry::Leaf(ctor) => {
                    return self.emit(*ctor, first.unwrap(), word).map(Some);
                }
                Entry::Node(next) => node = next,
            }
        }
    }

    fn emit(&mut self, ctor: Ctor, start: Token, word: String) -> LexResult<Lexeme> {
        let Some(kind) = ctor(&word) else {
            return Err(LexError {
                line: start.line,
                col: start.col,
                fragment: word,
            });
        };

        let lexeme = Lexeme::new(kind, Token::new(word, start.line, start.col, start.byte));

        if !matches!(lexeme.kind, LexemeKind::Space | LexemeKind::Tab) {
            self.last_was_value = lexeme.is_value();
        }

        Ok(lexeme)
    }

    /// Consume raw bytes up to (and including) `stop`, returning the content
    /// before it. `None` means the input ended before the stop byte.
    pub fn verbatim(&mut self, stop: u8) -> Option<String> {
        let start = self.pos;

        while self.pos < self.src.len() {
            let byte = self.src[self.pos];
            self.pos += 1;

            if byte == stop {
                self.col += 1;
                return Some(String::from_utf8_lossy(&self.src[start..self.pos - 1]).into_owned());
            }

            if byte == b'\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }

        None
    }

    /// Skip up to the next newline-class byte without consuming it, so the
    /// statement separator survives a line comment.
    pub fn skip_line(&mut self) {
        while self.pos < self.src.len() && !is_newline_byte(self.src[self.pos]) {
            self.pos += 1;
            self.col += 1;
        }
    }

    /// Skip through the closing `*/` of a block comment. Returns whether the
    /// closing marker was found before the input ran out.
    pub fn skip_block(&mut self) -> bool {
        while self.pos < self.src.len() {
            if self.src[self.pos] == b'*' && self.src.get(self.pos + 1) == Some(&b'/') {
                self.pos += 2;
                self.col += 2;
                return true;
            }

            if self.src[self.pos] == b'\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }

        false
    }
}
