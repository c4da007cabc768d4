//! Statement and expression parsing.
//!
//! The parser drives the lexer, validates expressions incrementally against
//! the typing grammar, and reshapes flat token runs into precedence-correct
//! trees with [`Parser::build_ast`]. It also tracks block nesting at parse
//! time so every `procedure` knows the statement count of its body once the
//! matching `end` has been seen.

mod ast;

pub use ast::*;

use std::{collections::VecDeque, error::Error, fmt::Display, mem};

use colored::Colorize;
use log::trace;

use crate::{
    grammar::Start,
    lexer::{KeywordKind, LexError, Lexeme, LexemeKind, Lexer, ParamKind, Token},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedSymbol {
        word: String,
        line: usize,
        col: usize,
        expected: Vec<String>,
    },
    UnexpectedEof {
        context: String,
    },
    BlockMismatch {
        line: usize,
        col: usize,
    },
    Lex(LexError),
    Load {
        message: String,
    },
}

impl ParseError {
    fn unexpected(lexeme: &Lexeme, expected: Vec<String>) -> Self {
        ParseError::UnexpectedSymbol {
            word: lexeme.word.clone(),
            line: lexeme.line,
            col: lexeme.col,
            expected,
        }
    }

    fn eof(context: &str) -> Self {
        ParseError::UnexpectedEof {
            context: context.into(),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnexpectedSymbol {
                word,
                line,
                col,
                expected,
            } => {
                write!(
                    f,
                    "Unexpected {} at ({line}:{col}). Expecting: {}",
                    format!("\"{word}\"").red(),
                    expected.join(", ")
                )
            }
            ParseError::UnexpectedEof { context } => {
                write!(f, "Unexpected EOF while parsing {context}")
            }
            ParseError::BlockMismatch { line, col } => {
                write!(f, "\"end\" with no open block at ({line}:{col})")
            }
            ParseError::Lex(error) => write!(f, "{error}"),
            ParseError::Load { message } => f.write_str(message),
        }
    }
}

impl Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        ParseError::Lex(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockTag {
    Main,
    If,
    For,
    Procedure,
    Def,
}

/// A saved parser position, used to roll back a failed load so no partial
/// program is left behind.
#[derive(Debug, Clone, Copy)]
pub struct ParserMark {
    count: usize,
    blocks: usize,
    patches: usize,
}

pub struct Parser {
    lexer: Lexer,
    pending: Vec<Lexeme>,
    blocks: Vec<(usize, BlockTag)>,
    count: usize,
    patches: Vec<(usize, usize)>,
}

impl Parser {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            lexer: Lexer::new(source),
            pending: vec![],
            blocks: vec![(0, BlockTag::Main)],
            count: 0,
            patches: vec![],
        }
    }

    /// Swap in a new source buffer. Statement counting continues, so
    /// repeated loads keep lining up with the appended instruction stream.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.lexer = Lexer::new(source);
        self.pending.clear();
    }

    pub fn mark(&self) -> ParserMark {
        ParserMark {
            count: self.count,
            blocks: self.blocks.len(),
            patches: self.patches.len(),
        }
    }

    pub fn reset_to(&mut self, mark: ParserMark) {
        self.count = mark.count;
        self.blocks.truncate(mark.blocks);
        self.patches.truncate(mark.patches);
        self.pending.clear();
    }

    /// Block-length patches recorded since the last take: `(opener index,
    /// statement count of the body)`.
    pub fn take_patches(&mut self) -> Vec<(usize, usize)> {
        mem::take(&mut self.patches)
    }

    /// Number of blocks still waiting for their `end`.
    pub fn open_blocks(&self) -> usize {
        self.blocks.len() - 1
    }

    fn push_back(&mut self, lexeme: Lexeme) {
        self.pending.push(lexeme);
    }

    /// The next meaningful lexeme: spaces, tabs and comment spans are
    /// dispatched here. A line comment leaves its terminating newline in
    /// place so it still ends the surrounding statement.
    fn next(&mut self) -> Result<Option<Lexeme>, ParseError> {
        loop {
            let lexeme = match self.pending.pop() {
                Some(lexeme) => lexeme,
                None => match self.lexer.next()? {
                    Some(lexeme) => lexeme,
                    None => return Ok(None),
                },
            };

            match lexeme.kind {
                LexemeKind::CommentLine => self.lexer.skip_line(),
                LexemeKind::CommentBlock { open: true } => {
                    if !self.lexer.skip_block() {
                        return Err(ParseError::eof("block comment"));
                    }
                }
                // stray close marker
                LexemeKind::CommentBlock { open: false } => {}
                LexemeKind::Space | LexemeKind::Tab => {}
                _ => return Ok(Some(lexeme)),
            }
        }
    }

    /// Read a raw string literal body, the opening quote already consumed.
    fn string_literal(&mut self, quote: &Lexeme) -> Result<Lexeme, ParseError> {
        let stop = match quote.kind {
            LexemeKind::SingleQuote => b'\'',
            _ => b'"',
        };

        let Some(content) = self.lexer.verbatim(stop) else {
            return Err(ParseError::eof("string literal"));
        };

        Ok(Lexeme::new(
            LexemeKind::Str(content.clone()),
            Token::new(content, quote.line, quote.col, quote.byte),
        ))
    }

    /// Collect lexemes into a grammar-validated expression until a newline,
    /// EOF, or the caller's stop tag.
    pub fn parse_expression(&mut self, until: Option<&str>) -> Result<Expression, ParseError> {
        let mut expression = Expression::new();

        loop {
            let Some(lexeme) = self.next()? else {
                return Ok(expression);
            };

            if matches!(lexeme.kind, LexemeKind::NewLine) {
                return Ok(expression);
            }

            if until == Some(lexeme.tag()) {
                return Ok(expression);
            }

            match lexeme.kind {
                LexemeKind::SingleQuote | LexemeKind::DoubleQuote => {
                    let literal = self.string_literal(&lexeme)?;
                    let expected = expression.hint();
                    if !expression.push(Ast::Atom(literal)) {
                        return Err(ParseError::unexpected(&lexeme, expected));
                    }
                }
                // a parameter ends the expression and opens a clause
                LexemeKind::Parameter(_) => {
                    self.push_back(lexeme);
                    return Ok(expression);
                }
                // an inline call; it consumes the rest of the line
                LexemeKind::Keyword(KeywordKind::Exec) => {
                    let call = self.parse_exec()?;
                    let expected = expression.hint();
                    if !expression.push(Ast::Call(call)) {
                        return Err(ParseError::unexpected(&lexeme, expected));
                    }
                    return Ok(expression);
                }
                // any other keyword is the next statement; blocks may share
                // a line with their body (`procedure p() prnt 9 end`)
                LexemeKind::Keyword(_) => {
                    self.push_back(lexeme);
                    return Ok(expression);
                }
                _ => {
                    let expected = expression.hint();
                    if !expression.push(Ast::Atom(lexeme.clone())) {
                        return Err(ParseError::unexpected(&lexeme, expected));
                    }
                }
            }
        }
    }

    /// Collect a parameter clause (`UNTIL expr`, `BY expr`). If the next
    /// lexeme is not the expected parameter, it is pushed back and an empty
    /// clause is returned.
    pub fn clause(&mut self, expected: ParamKind) -> Result<Expression, ParseError> {
        let mut clause = Expression::with(Start::Clause);

        let Some(first) = self.next()? else {
            return Ok(clause);
        };

        if first.kind != LexemeKind::Parameter(expected) {
            self.push_back(first);
            return Ok(clause);
        }

        clause.push(Ast::Atom(first));

        loop {
            let Some(lexeme) = self.next()? else {
                return Ok(clause);
            };

            if !clause.push(Ast::Atom(lexeme.clone())) {
                self.push_back(lexeme);
                return Ok(clause);
            }
        }
    }

    /// Optional `( ident [, ident]* )` after a callable's name.
    fn parse_signature(&mut self) -> Result<Vec<String>, ParseError> {
        let Some(first) = self.next()? else {
            return Ok(vec![]);
        };

        if !matches!(first.kind, LexemeKind::Paren { open: true }) {
            self.push_back(first);
            return Ok(vec![]);
        }

        let mut params = vec![];

        loop {
            let Some(lexeme) = self.next()? else {
                return Err(ParseError::eof("signature"));
            };

            match lexeme.kind {
                LexemeKind::Paren { open: false } => return Ok(params),
                LexemeKind::Ident => params.push(lexeme.word),
                LexemeKind::Comma => {}
                _ => {
                    return Err(ParseError::unexpected(
                        &lexeme,
                        vec!["<ident>".into(), "</delim>".into()],
                    ))
                }
            }
        }
    }

    /// `exec` target and arguments; shared by the statement form and the
    /// inline-expression form.
    fn parse_exec(&mut self) -> Result<ExecCall, ParseError> {
        let Some(target) = self.next()? else {
            return Err(ParseError::eof("exec"));
        };

        if !matches!(target.kind, LexemeKind::Ident) {
            return Err(ParseError::unexpected(&target, vec!["<ident>".into()]));
        }

        // an empty pair of parentheses means no arguments
        match self.next()? {
            None => {
                return Ok(ExecCall {
                    target: target.word,
                    arguments: None,
                })
            }
            Some(open) if matches!(open.kind, LexemeKind::Paren { open: true }) => {
                match self.next()? {
                    Some(close) if matches!(close.kind, LexemeKind::Paren { open: false }) => {
                        return Ok(ExecCall {
                            target: target.word,
                            arguments: None,
                        });
                    }
                    Some(other) => {
                        self.push_back(other);
                        self.push_back(open);
                    }
                    None => return Err(ParseError::eof("exec arguments")),
                }
            }
            Some(other) => self.push_back(other),
        }

        let expression = self.parse_expression(None)?;
        let arguments = if expression.is_empty() {
            None
        } else {
            Some(Box::new(self.build_ast(expression)?))
        };

        Ok(ExecCall {
            target: target.word,
            arguments,
        })
    }

    /// Parse statements until the `end` that closes the current block. The
    /// delimiter itself is consumed. Nested blocks are fine; only the `end`
    /// that pops this block's parse-time entry stops the loop.
    pub fn parse_block(&mut self) -> Result<Vec<Statement>, ParseError> {
        let depth = self.blocks.len();
        let mut block = vec![];

        loop {
            let Some(statement) = self.parse()? else {
                return Err(ParseError::eof("block"));
            };

            if matches!(statement, Statement::End) && self.blocks.len() < depth {
                return Ok(block);
            }

            block.push(statement);
        }
    }

    /// Parse one statement. `Ok(None)` is the end-of-program sentinel.
    pub fn parse(&mut self) -> Result<Option<Statement>, ParseError> {
        loop {
            let Some(lexeme) = self.next()? else {
                return Ok(None);
            };

            match lexeme.kind {
                LexemeKind::Keyword(keyword) => {
                    return self.parse_keyword(keyword, lexeme).map(Some);
                }
                LexemeKind::Paren { .. }
                | LexemeKind::Bracket { .. }
                | LexemeKind::SingleQuote
                | LexemeKind::DoubleQuote
                | LexemeKind::Comma
                | LexemeKind::Integer(_)
                | LexemeKind::Float(_)
                | LexemeKind::Str(_)
                | LexemeKind::Bool(_)
                | LexemeKind::Ident
                | LexemeKind::Unary(_)
                | LexemeKind::Postfix(_) => {
                    self.push_back(lexeme);
                    self.count += 1;
                    let expression = self.parse_expression(None)?;
                    return Ok(Some(Statement::Expression(self.build_ast(expression)?)));
                }
                LexemeKind::Parameter(_) => {
                    return Err(ParseError::unexpected(&lexeme, vec!["<keyword>".into()]));
                }
                // newline & whitespace leakage
                _ => {}
            }
        }
    }

    fn parse_keyword(
        &mut self,
        keyword: KeywordKind,
        lexeme: Lexeme,
    ) -> Result<Statement, ParseError> {
        match keyword {
            KeywordKind::If => self.blocks.push((self.count, BlockTag::If)),
            KeywordKind::For => self.blocks.push((self.count, BlockTag::For)),
            KeywordKind::Procedure => self.blocks.push((self.count, BlockTag::Procedure)),
            KeywordKind::Def => self.blocks.push((self.count, BlockTag::Def)),
            KeywordKind::End => {
                if self.blocks.len() <= 1 {
                    return Err(ParseError::BlockMismatch {
                        line: lexeme.line,
                        col: lexeme.col,
                    });
                }
                let (opened, tag) = self.blocks.pop().expect("block stack underflow");
                trace!("closing {tag:?} block opened at statement {opened}");
                self.patches.push((opened, self.count - opened - 1));
            }
            _ => {}
        }

        self.count += 1;

        match keyword {
            KeywordKind::Prnt => {
                let expression = self.parse_expression(None)?;
                Ok(Statement::Prnt {
                    text: self.build_ast(expression)?,
                })
            }
            KeywordKind::If => {
                let expression = self.parse_expression(None)?;
                Ok(Statement::If {
                    condition: self.build_ast(expression)?,
                })
            }
            KeywordKind::Else => Ok(Statement::Else),
            KeywordKind::End => Ok(Statement::End),
            KeywordKind::For => {
                let init = self.parse_expression(None)?;
                let condition = self.parse_expression(None)?;
                let increment = self.parse_expression(None)?;

                Ok(Statement::For {
                    init: self.build_ast(init)?,
                    condition: self.build_ast(condition)?,
                    increment: self.build_ast(increment)?,
                })
            }
            KeywordKind::Procedure => {
                let name = self.callable_name(&lexeme)?;
                let params = self.parse_signature()?;

                Ok(Statement::Procedure {
                    name,
                    params,
                    length: 0,
                })
            }
            KeywordKind::Def => {
                let name = self.callable_name(&lexeme)?;
                let params = self.parse_signature()?;

                // the body lives inside the def, not in the linear stream;
                // it must not advance the statement counter, and length
                // patches recorded under its local counts do not apply
                let resume = self.count;
                let patches = self.patches.len();
                let body = self.parse_block()?;
                self.count = resume;
                self.patches.truncate(patches);

                Ok(Statement::Def { name, params, body })
            }
            KeywordKind::Exec => Ok(Statement::Exec(self.parse_exec()?)),
            KeywordKind::Include => {
                let expression = self.parse_expression(None)?;
                Ok(Statement::Include {
                    source: self.build_ast(expression)?,
                })
            }
            KeywordKind::Wait => {
                let condition = self.parse_expression(None)?;
                let until = self.clause(ParamKind::Until)?;

                Ok(Statement::Wait {
                    condition: self.build_ast(condition)?,
                    until: self.build_ast(until)?,
                })
            }
        }
    }

    fn callable_name(&mut self, keyword: &Lexeme) -> Result<String, ParseError> {
        let Some(name) = self.next()? else {
            return Err(ParseError::eof("callable name"));
        };

        if !matches!(name.kind, LexemeKind::Ident) {
            return Err(ParseError::unexpected(&name, vec!["<ident>".into()]));
        }

        trace!("parsing callable '{}' ({})", name.word, keyword.word);
        Ok(name.word)
    }

    /// Reshape a flat expression into a precedence-correct tree. Binary
    /// operators recurse on the tail, which makes the language
    /// right-associative with no precedence levels; grouping is explicit
    /// parentheses.
    pub fn build_ast(&self, expression: Expression) -> Result<Ast, ParseError> {
        Self::build(expression.terms)
    }

    fn build(mut terms: Vec<Ast>) -> Result<Ast, ParseError> {
        // get rid of superfluous nesting
        if terms.len() == 1 && matches!(terms[0], Ast::Seq(_)) {
            let Some(Ast::Seq(inner)) = terms.pop() else {
                unreachable!()
            };
            terms = inner;
        }

        let mut s: VecDeque<Ast> = terms.into();
        let mut n: Vec<Ast> = vec![];

        while let Some(term) = s.pop_front() {
            let Ast::Atom(lexeme) = term else {
                n.push(term);
                continue;
            };

            match lexeme.kind {
                LexemeKind::Paren { open: true } => {
                    let inner = Self::group(&mut s, &lexeme, GroupKind::Paren)?;
                    n.push(Self::build(inner)?);
                }
                LexemeKind::Bracket { open: true } => {
                    let inner = Self::group(&mut s, &lexeme, GroupKind::Bracket)?;
                    n.push(Ast::List(Self::split_list(inner)?));
                }
                LexemeKind::Paren { open: false } | LexemeKind::Bracket { open: false } => {
                    return Err(ParseError::unexpected(&lexeme, vec![]));
                }
                // a bare comma turns the whole run into a list
                LexemeKind::Comma => {
                    let mut rest = n;
                    rest.push(Ast::Atom(lexeme));
                    rest.extend(s);
                    return Ok(Ast::List(Self::split_list(rest)?));
                }
                LexemeKind::Parameter(_) | LexemeKind::Unary(_) => {
                    return Ok(Ast::Seq(vec![Ast::Atom(lexeme), Self::build(s.into())?]));
                }
                LexemeKind::Postfix(_) => {
                    return Ok(Ast::Seq(vec![Ast::Atom(lexeme), Ast::Seq(n)]));
                }
                LexemeKind::Op(_) => {
                    return Ok(Ast::Seq(vec![
                        Ast::Seq(n),
                        Ast::Atom(lexeme),
                        Self::build(s.into())?,
                    ]));
                }
                _ => n.push(Ast::Atom(lexeme)),
            }
        }

        Ok(Ast::Seq(n))
    }

    /// Drain the terms up to the matching close delimiter, which is
    /// consumed and dropped.
    fn group(
        s: &mut VecDeque<Ast>,
        open: &Lexeme,
        kind: GroupKind,
    ) -> Result<Vec<Ast>, ParseError> {
        let mut inner = vec![];
        let mut depth = 0usize;

        while let Some(term) = s.pop_front() {
            if let Ast::Atom(lexeme) = &term {
                match (kind, &lexeme.kind) {
                    (GroupKind::Paren, LexemeKind::Paren { open: true })
                    | (GroupKind::Bracket, LexemeKind::Bracket { open: true }) => depth += 1,
                    (GroupKind::Paren, LexemeKind::Paren { open: false })
                    | (GroupKind::Bracket, LexemeKind::Bracket { open: false }) => {
                        if depth == 0 {
                            return Ok(inner);
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
            }
            inner.push(term);
        }

        Err(ParseError::UnexpectedEof {
            context: format!("group opened at ({}:{})", open.line, open.col),
        })
    }

    /// Split a term run on its top-level commas, building each element.
    fn split_list(terms: Vec<Ast>) -> Result<Vec<Ast>, ParseError> {
        let mut elements = vec![];
        let mut current = vec![];
        let mut depth = 0usize;

        for term in terms {
            if let Ast::Atom(lexeme) = &term {
                match lexeme.kind {
                    LexemeKind::Paren { open: true } | LexemeKind::Bracket { open: true } => {
                        depth += 1
                    }
                    LexemeKind::Paren { open: false } | LexemeKind::Bracket { open: false } => {
                        depth = depth.saturating_sub(1)
                    }
                    LexemeKind::Comma if depth == 0 => {
                        elements.push(Self::build(mem::take(&mut current))?);
                        continue;
                    }
                    _ => {}
                }
            }
            current.push(term);
        }

        if !current.is_empty() {
            elements.push(Self::build(current)?);
        }

        Ok(elements)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Paren,
    Bracket,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{BinOp, PostOp, UnaryOp};

    fn atom(kind: LexemeKind, word: &str, line: usize, col: usize, byte: usize) -> Ast {
        Ast::Atom(Lexeme::new(kind, Token::new(word, line, col, byte)))
    }

    fn built(source: &str) -> Ast {
        let mut parser = Parser::new(source);
        let expression = parser.parse_expression(None).expect("expression rejected");
        parser.build_ast(expression).expect("build failed")
    }

    fn statements(source: &str) -> Vec<Statement> {
        let mut parser = Parser::new(source);
        let mut statements = vec![];

        while let Some(statement) = parser.parse().expect("parse failed") {
            statements.push(statement);
        }

        statements
    }

    #[test]
    fn test_build_simple_addition() {
        assert_eq!(
            Ast::Seq(vec![
                Ast::Seq(vec![atom(LexemeKind::Integer(1), "1", 0, 0, 0)]),
                atom(LexemeKind::Op(BinOp::Add), "+", 0, 1, 1),
                Ast::Seq(vec![atom(LexemeKind::Integer(2), "2", 0, 2, 2)]),
            ]),
            built("1+2")
        );
    }

    #[test]
    fn test_build_is_right_associative() {
        let Ast::Seq(outer) = built("a + b * c") else {
            panic!("expected a sequence");
        };

        // [a] + ([b] * [c])
        assert_eq!(3, outer.len());
        assert_eq!(
            Ast::Seq(vec![atom(LexemeKind::Ident, "a", 0, 0, 0)]),
            outer[0]
        );
        assert_eq!(atom(LexemeKind::Op(BinOp::Add), "+", 0, 2, 2), outer[1]);

        let Ast::Seq(rhs) = &outer[2] else {
            panic!("expected the tail to be a sequence");
        };
        assert_eq!(atom(LexemeKind::Op(BinOp::Multiply), "*", 0, 6, 6), rhs[1]);
    }

    #[test]
    fn test_build_parentheses_group_first() {
        let Ast::Seq(outer) = built("(a + b) * c") else {
            panic!("expected a sequence");
        };

        let Ast::Seq(lhs) = &outer[0] else {
            panic!("expected grouped lhs");
        };
        let Ast::Seq(grouped) = &lhs[0] else {
            panic!("expected inner group");
        };
        assert_eq!(atom(LexemeKind::Op(BinOp::Add), "+", 0, 3, 3), grouped[1]);
        assert_eq!(atom(LexemeKind::Op(BinOp::Multiply), "*", 0, 8, 8), outer[1]);
    }

    #[test]
    fn test_build_postfix() {
        assert_eq!(
            Ast::Seq(vec![
                atom(LexemeKind::Postfix(PostOp::Increment), "++", 0, 3, 3),
                Ast::Seq(vec![atom(LexemeKind::Ident, "foo", 0, 0, 0)]),
            ]),
            built("foo++")
        );
    }

    #[test]
    fn test_build_unary_prefix() {
        assert_eq!(
            Ast::Seq(vec![
                atom(LexemeKind::Unary(UnaryOp::Not), "NOT", 0, 0, 0),
                Ast::Seq(vec![atom(LexemeKind::Ident, "bar", 0, 4, 4)]),
            ]),
            built("NOT bar")
        );
    }

    #[test]
    fn test_build_bracket_list() {
        assert_eq!(
            Ast::Seq(vec![Ast::List(vec![
                Ast::Seq(vec![atom(LexemeKind::Integer(1), "1", 0, 1, 1)]),
                Ast::Seq(vec![atom(LexemeKind::Integer(2), "2", 0, 3, 3)]),
            ])]),
            built("[1,2]")
        );
    }

    #[test]
    fn test_build_empty_list() {
        assert_eq!(Ast::Seq(vec![Ast::List(vec![])]), built("[]"));
    }

    #[test]
    fn test_string_literal_is_one_lexeme() {
        assert_eq!(
            Ast::Seq(vec![atom(
                LexemeKind::Str("hello world".into()),
                "hello world",
                0,
                0,
                0
            )]),
            built("'hello world'")
        );
    }

    #[test]
    fn test_expression_rejects_stray_bracket() {
        let mut parser = Parser::new("]");
        let result = parser.parse_expression(None);

        assert!(matches!(
            result,
            Err(ParseError::UnexpectedSymbol { word, .. }) if word == "]"
        ));
    }

    #[test]
    fn test_expression_rejects_postfix_opening() {
        let mut parser = Parser::new("++foo");

        assert!(parser.parse_expression(None).is_err());
    }

    #[test]
    fn test_unbalanced_group() {
        let mut parser = Parser::new("(1 + 2");
        let expression = parser.parse_expression(None).expect("grammar accepts");

        assert!(matches!(
            parser.build_ast(expression),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_parse_splits_statements_on_semicolon_and_newline() {
        let parsed = statements("a = 1; b = 2\nc = 3");

        assert_eq!(3, parsed.len());
        assert!(parsed
            .iter()
            .all(|statement| matches!(statement, Statement::Expression(_))));
    }

    #[test]
    fn test_parse_skips_comments() {
        let parsed = statements("a = 1 // trailing note\n/* block\ncomment */ b = 2");

        assert_eq!(2, parsed.len());
    }

    #[test]
    fn test_parse_prnt() {
        let parsed = statements("prnt 'hi'");

        assert_eq!(
            vec![Statement::Prnt {
                text: Ast::Seq(vec![atom(LexemeKind::Str("hi".into()), "hi", 0, 5, 5)]),
            }],
            parsed
        );
    }

    #[test]
    fn test_parse_if_else_end() {
        let parsed = statements("if 1 == 1\na = 1\nelse\na = 2\nend");

        assert_eq!(5, parsed.len());
        assert!(matches!(parsed[0], Statement::If { .. }));
        assert_eq!(Statement::Else, parsed[2]);
        assert_eq!(Statement::End, parsed[4]);
    }

    #[test]
    fn test_block_length_patch() {
        let mut parser = Parser::new("procedure p()\nprnt 1\nprnt 2\nend");
        while parser.parse().expect("parse failed").is_some() {}

        assert_eq!(vec![(0, 2)], parser.take_patches());
        assert_eq!(0, parser.open_blocks());
    }

    #[test]
    fn test_parse_procedure_signature() {
        let parsed = statements("procedure p(x, y)\nend");

        assert_eq!(
            Statement::Procedure {
                name: "p".into(),
                params: vec!["x".into(), "y".into()],
                length: 0,
            },
            parsed[0]
        );
    }

    #[test]
    fn test_parse_def_owns_its_body() {
        let parsed = statements("def f(x)\nx + 5\nend\na = 1");

        assert_eq!(2, parsed.len());
        let Statement::Def { name, params, body } = &parsed[0] else {
            panic!("expected a def");
        };
        assert_eq!("f", name);
        assert_eq!(&vec!["x".to_string()], params);
        assert_eq!(1, body.len());
        assert!(matches!(body[0], Statement::Expression(_)));
    }

    #[test]
    fn test_def_body_may_nest_blocks() {
        let parsed = statements("def f(x)\nif x\nprnt x\nend\nx\nend");

        let Statement::Def { body, .. } = &parsed[0] else {
            panic!("expected a def");
        };
        assert_eq!(4, body.len());
        assert_eq!(Statement::End, body[2]);
    }

    #[test]
    fn test_def_body_does_not_advance_statement_count() {
        let mut parser = Parser::new("def f(x)\nx\nend\nprocedure p()\nprnt 1\nend");
        while parser.parse().expect("parse failed").is_some() {}

        // the procedure opens at instruction 1, right after the def
        assert!(parser.take_patches().contains(&(1, 1)));
    }

    #[test]
    fn test_stray_end_is_a_block_mismatch() {
        let mut parser = Parser::new("end");

        assert!(matches!(
            parser.parse(),
            Err(ParseError::BlockMismatch { .. })
        ));
    }

    #[test]
    fn test_unterminated_def_is_eof() {
        let mut parser = Parser::new("def f(x)\nx + 1");
        let result = parser.parse();

        assert!(matches!(result, Err(ParseError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_parse_wait_clause() {
        let parsed = statements("WAIT 1 UNTIL key");

        let Statement::Wait { condition, until } = &parsed[0] else {
            panic!("expected a wait");
        };
        assert_eq!(
            &Ast::Seq(vec![atom(LexemeKind::Integer(1), "1", 0, 5, 5)]),
            condition
        );
        let Ast::Seq(until) = until else {
            panic!("expected a clause sequence");
        };
        assert!(
            matches!(&until[0], Ast::Atom(lexeme) if lexeme.kind == LexemeKind::Parameter(ParamKind::Until))
        );
    }

    #[test]
    fn test_parse_exec_statement() {
        let parsed = statements("exec p");

        assert_eq!(
            vec![Statement::Exec(ExecCall {
                target: "p".into(),
                arguments: None,
            })],
            parsed
        );
    }

    #[test]
    fn test_parse_exec_empty_parens() {
        let parsed = statements("exec p()");

        assert_eq!(
            vec![Statement::Exec(ExecCall {
                target: "p".into(),
                arguments: None,
            })],
            parsed
        );
    }

    #[test]
    fn test_parse_inline_exec() {
        let parsed = statements("r = exec f(1)");

        let Statement::Expression(Ast::Seq(outer)) = &parsed[0] else {
            panic!("expected an expression");
        };
        assert_eq!(atom(LexemeKind::Op(BinOp::Assign), "=", 0, 2, 2), outer[1]);

        let Ast::Seq(rhs) = &outer[2] else {
            panic!("expected rhs sequence");
        };
        let Ast::Call(call) = &rhs[0] else {
            panic!("expected an inline call");
        };
        assert_eq!("f", call.target);
        assert!(call.arguments.is_some());
    }

    #[test]
    fn test_keyword_ends_an_expression() {
        let parsed = statements("procedure p() prnt 9 end");

        assert_eq!(3, parsed.len());
        assert!(matches!(parsed[0], Statement::Procedure { .. }));
        assert!(matches!(parsed[1], Statement::Prnt { .. }));
        assert_eq!(Statement::End, parsed[2]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let source = "(a + b) * [1, 2] / NOT c";

        assert_eq!(built(source), built(source));
    }

    #[test]
    fn test_misplaced_parameter() {
        let mut parser = Parser::new("UNTIL 3");

        assert!(matches!(
            parser.parse(),
            Err(ParseError::UnexpectedSymbol { word, .. }) if word == "UNTIL"
        ));
    }
}
