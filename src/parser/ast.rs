use std::fmt::Display;

use crate::{
    grammar::{Cursor, Start},
    lexer::{Lexeme, TAG_CONST},
};

/// An `exec` call site: the target name and the pre-built argument
/// expression, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecCall {
    pub target: String,
    pub arguments: Option<Box<Ast>>,
}

/// The precedence-reshaped tree `build_ast` produces out of a flat
/// expression.
///
/// `Seq` is the generic nested node (`[lhs, op, rhs]`, `[op, operand]`, a
/// grouped sub-expression); `List` is a data list from brackets or top-level
/// commas; `Call` is an `exec` embedded in an expression, which behaves as a
/// constant for grammar purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Atom(Lexeme),
    Seq(Vec<Ast>),
    List(Vec<Ast>),
    Call(ExecCall),
}

impl Ast {
    pub fn tag(&self) -> &'static str {
        match self {
            Ast::Atom(lexeme) => lexeme.tag(),
            Ast::Seq(_) => "<expression>",
            Ast::List(_) => "<list>",
            Ast::Call(_) => TAG_CONST,
        }
    }
}

/// A flat, grammar-validated expression: the terms collected so far plus the
/// current position in the rule graph.
#[derive(Debug, Clone)]
pub struct Expression {
    pub terms: Vec<Ast>,
    cursor: Cursor,
}

impl Expression {
    pub fn new() -> Self {
        Self::with(Start::Expression)
    }

    pub fn with(start: Start) -> Self {
        Self {
            terms: vec![],
            cursor: Cursor::new(start),
        }
    }

    /// Push a term if the grammar admits its tag here. Rejection leaves both
    /// the terms and the grammar position untouched.
    pub fn push(&mut self, term: Ast) -> bool {
        if !self.cursor.advance(term.tag()) {
            return false;
        }

        self.terms.push(term);
        true
    }

    pub fn hint(&self) -> Vec<String> {
        self.cursor.hint()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

impl Default for Expression {
    fn default() -> Self {
        Self::new()
    }
}

/// One compiled instruction of the linear program.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Ast),
    Prnt {
        text: Ast,
    },
    If {
        condition: Ast,
    },
    Else,
    End,
    For {
        init: Ast,
        condition: Ast,
        increment: Ast,
    },
    /// A procedure declaration; `length` is the statement count of its body,
    /// patched in once the matching `end` has been seen.
    Procedure {
        name: String,
        params: Vec<String>,
        length: usize,
    },
    /// A function declaration; the body is owned by the statement and never
    /// enters the linear instruction stream.
    Def {
        name: String,
        params: Vec<String>,
        body: Vec<Statement>,
    },
    Exec(ExecCall),
    Include {
        source: Ast,
    },
    Wait {
        condition: Ast,
        until: Ast,
    },
}

impl Statement {
    /// Control statements run even when the current block is read-disabled;
    /// block openers and closers have to keep the stacks balanced.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Statement::If { .. }
                | Statement::Else
                | Statement::End
                | Statement::For { .. }
                | Statement::Procedure { .. }
                | Statement::Def { .. }
        )
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Expression(_) => write!(f, "<expression>"),
            Statement::Prnt { .. } => write!(f, "<keyword prnt>"),
            Statement::If { .. } => write!(f, "<keyword if>"),
            Statement::Else => write!(f, "<keyword else>"),
            Statement::End => write!(f, "<keyword end>"),
            Statement::For { .. } => write!(f, "<keyword for>"),
            Statement::Procedure { name, .. } => write!(f, "<keyword procedure {name}>"),
            Statement::Def { name, .. } => write!(f, "<keyword def {name}>"),
            Statement::Exec(call) => write!(f, "<keyword exec {}>", call.target),
            Statement::Include { .. } => write!(f, "<keyword include>"),
            Statement::Wait { .. } => write!(f, "<keyword WAIT>"),
        }
    }
}
