//! The stepping evaluator.
//!
//! The interpreter owns the compiled instruction list, the scope stack, the
//! per-call value stack, and the two parallel stacks that drive block
//! execution: the block stack (what region are we in) and the control stack
//! (is the current region read-enabled). The host drives execution one
//! statement at a time through [`Interpreter::exec_next`].

mod error;
mod ops;
mod value;

pub use error::*;
pub use value::*;

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    io::{self, Write},
    rc::Rc,
};

use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::{
    lexer::{BinOp, Lexeme, LexemeKind, PostOp, UnaryOp},
    parser::{Ast, ExecCall, ParseError, Parser, Statement},
};

pub type Scope = HashMap<String, Value>;

/// An active region on the block stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Main,
    If,
    For {
        address: usize,
        condition: Ast,
        increment: Ast,
    },
    Call {
        name: String,
    },
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Block::Main => f.write_str("<main>"),
            Block::If => f.write_str("<if>"),
            Block::For { address, .. } => write!(f, "<for @{address}>"),
            Block::Call { name } => write!(f, "<call {name}>"),
        }
    }
}

/// A frame on the value stack. Procedure calls save a return address; def
/// calls push an empty frame so their return cannot consume an enclosing
/// procedure's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub ret_addr: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Memory {
    pub instr: Vec<Statement>,
    pub stack: Vec<Frame>,
    pub scope: Vec<Scope>,
}

/// A rendered dump of the interpreter state, for hosts and debugging.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub pointer: usize,
    pub block_stack: Vec<String>,
    pub scope: BTreeMap<String, String>,
    pub stack: Vec<Option<usize>>,
    pub ctrl_stack: Vec<bool>,
    pub instruction: Option<String>,
    pub last: String,
}

pub struct Interpreter {
    parser: Parser,
    pub memory: Memory,
    ctrl_stack: Vec<bool>,
    block_stack: Vec<Block>,
    pc: usize,
    last: Value,
    out: Box<dyn Write>,
}

enum Item<'a> {
    Atom(&'a Lexeme),
    Val(Value),
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_sink(Box::new(io::stdout()))
    }

    /// Build an interpreter whose `prnt` output goes to the given sink.
    pub fn with_sink(out: Box<dyn Write>) -> Self {
        Self {
            parser: Parser::new(""),
            memory: Memory {
                instr: vec![],
                stack: vec![],
                scope: vec![Scope::new()],
            },
            ctrl_stack: vec![true],
            block_stack: vec![Block::Main],
            pc: 0,
            last: Value::Void,
            out,
        }
    }

    /// Load a program from a source string or a file path and parse it
    /// fully. Loads append to the instruction stream, so a host can feed
    /// sources incrementally. A parse error leaves memory untouched.
    pub fn read(&mut self, source: &str, is_file: bool) -> Result<&mut Self, ParseError> {
        let text = if is_file {
            std::fs::read_to_string(source).map_err(|error| ParseError::Load {
                message: format!("could not read '{source}': {error}"),
            })?
        } else {
            source.to_string()
        };

        self.parser.set_source(text);
        self.load()?;
        Ok(self)
    }

    fn load(&mut self) -> Result<(), ParseError> {
        let mark = self.parser.mark();
        let mut staged = vec![];

        loop {
            match self.parser.parse() {
                Ok(Some(statement)) => staged.push(statement),
                Ok(None) => break,
                Err(error) => {
                    self.parser.reset_to(mark);
                    return Err(error);
                }
            }
        }

        if self.parser.open_blocks() > 0 {
            self.parser.reset_to(mark);
            return Err(ParseError::UnexpectedEof {
                context: "program (missing \"end\")".into(),
            });
        }

        debug!("loaded {} instruction(s)", staged.len());
        self.memory.instr.extend(staged);

        for (index, length) in self.parser.take_patches() {
            if let Some(Statement::Procedure { length: slot, .. }) =
                self.memory.instr.get_mut(index)
            {
                *slot = length;
            }
        }

        Ok(())
    }

    /// Execute one statement. Past the last instruction, the `Eof` signal is
    /// raised; hosts treat it as normal termination.
    pub fn exec_next(&mut self) -> Result<Value, RuntimeError> {
        let Some(statement) = self.memory.instr.get(self.pc).cloned() else {
            return Err(RuntimeError::Eof);
        };

        trace!("exec {statement} @ {}", self.pc);
        let result = self.exec(&statement)?;
        self.last = result.clone();
        self.pc += 1;
        Ok(result)
    }

    /// Step until end of program; the result is the last statement's value.
    pub fn run(&mut self) -> Result<Value, RuntimeError> {
        loop {
            match self.exec_next() {
                Ok(_) => {}
                Err(RuntimeError::Eof) => return Ok(self.last.clone()),
                Err(error) => return Err(error),
            }
        }
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn last(&self) -> &Value {
        &self.last
    }

    pub fn block_stack(&self) -> &[Block] {
        &self.block_stack
    }

    pub fn control_stack(&self) -> &[bool] {
        &self.ctrl_stack
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pointer: self.pc,
            block_stack: self.block_stack.iter().map(Block::to_string).collect(),
            scope: self
                .scope()
                .iter()
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
            stack: self.memory.stack.iter().map(|frame| frame.ret_addr).collect(),
            ctrl_stack: self.ctrl_stack.clone(),
            instruction: self.memory.instr.get(self.pc).map(Statement::to_string),
            last: self.last.to_string(),
        }
    }

    // --- scope discipline ---

    pub fn scope(&self) -> &Scope {
        self.memory.scope.last().expect("scope stack is never empty")
    }

    fn scope_mut(&mut self) -> &mut Scope {
        self.memory
            .scope
            .last_mut()
            .expect("scope stack is never empty")
    }

    fn bind(&mut self, name: &str, value: Value) {
        trace!("bind {name} = {value}");
        self.scope_mut().insert(name.to_string(), value);
    }

    fn fetch(&self, name: &str) -> Option<Value> {
        self.scope().get(name).cloned()
    }

    /// Open a scope as a copy of the current one: the callee sees the
    /// caller's bindings by value, and its mutations never escape.
    fn push_scope(&mut self) {
        let copy = self.scope().clone();
        self.memory.scope.push(copy);
    }

    fn pop_scope(&mut self) {
        if self.memory.scope.len() > 1 {
            self.memory.scope.pop();
        }
    }

    // --- control-stack discipline ---

    fn is_read_enabled(&self) -> bool {
        *self.ctrl_stack.last().expect("control stack is never empty")
    }

    /// A child block is only enabled if its parent is.
    fn push_read_enabled(&mut self, enabled: bool) {
        let enabled = self.is_read_enabled() && enabled;
        self.ctrl_stack.push(enabled);
    }

    fn pop_read_enabled(&mut self) {
        if self.ctrl_stack.len() > 1 {
            self.ctrl_stack.pop();
        }
    }

    /// Flip the current read-enable for `else`. A no-op while the parent
    /// block is disabled.
    fn toggle_read_enabled(&mut self) -> Result<(), RuntimeError> {
        if self.ctrl_stack.len() < 2 {
            return Err(RuntimeError::BlockMismatch {
                message: "\"else\" outside of any block".into(),
            });
        }

        let parent = self.ctrl_stack[self.ctrl_stack.len() - 2];
        let top = self.ctrl_stack.last_mut().expect("control stack is never empty");
        *top = if parent { !*top } else { false };
        Ok(())
    }

    // --- block-stack discipline ---

    fn current_block(&self) -> &Block {
        self.block_stack.last().expect("block stack is never empty")
    }

    fn pop_block(&mut self) {
        if self.block_stack.len() > 1 {
            self.block_stack.pop();
        }
    }

    // --- evaluation ---

    /// Resolve an identifier reference through the scope; anything else
    /// passes through untouched.
    fn getval(&self, value: Value) -> Value {
        match value {
            Value::Ident(name) => self.fetch(&name).unwrap_or(Value::Void),
            value => value,
        }
    }

    fn exec(&mut self, statement: &Statement) -> Result<Value, RuntimeError> {
        // control statements run even in disabled regions; everything else
        // is gated
        if !statement.is_control() && !self.is_read_enabled() {
            return Ok(Value::Void);
        }

        match statement {
            Statement::Expression(ast) => self.eval(ast),
            Statement::Prnt { text } => {
                let value = self.eval(text)?;
                let mut result = self.getval(value);

                while let Value::List(ref items) = result {
                    if items.len() != 1 {
                        break;
                    }
                    result = items[0].clone();
                }

                let _ = writeln!(self.out, "{result}");
                Ok(Value::Void)
            }
            Statement::If { condition } => {
                let condition = self.eval(condition)?;
                let condition = self.getval(condition);
                self.push_read_enabled(condition.truthy());
                self.block_stack.push(Block::If);
                Ok(Value::Void)
            }
            Statement::Else => {
                self.toggle_read_enabled()?;
                Ok(Value::Void)
            }
            Statement::End => self.exec_end(),
            Statement::For {
                init,
                condition,
                increment,
            } => {
                let address = self.pc;
                self.eval(init)?;
                let entered = self.eval(condition)?;
                let entered = self.getval(entered);

                self.push_read_enabled(entered.truthy());
                self.block_stack.push(Block::For {
                    address,
                    condition: condition.clone(),
                    increment: increment.clone(),
                });
                Ok(Value::Void)
            }
            Statement::Procedure {
                name,
                params,
                length,
            } => {
                let procedure = ProcedureVal {
                    name: name.clone(),
                    params: params.clone(),
                    address: self.pc,
                    length: *length,
                };
                self.bind(name, Value::Procedure(Rc::new(procedure)));

                // a declaration only: skip over the body
                self.pc += length + 1;
                Ok(Value::Void)
            }
            Statement::Def { name, params, body } => {
                let def = DefVal {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                };
                self.bind(name, Value::Def(Rc::new(def)));
                Ok(Value::Void)
            }
            Statement::Exec(call) => self.exec_call(call),
            Statement::Include { source } => {
                let source = self.eval(source)?;
                let source = self.getval(source);
                warn!("include is not supported, skipping '{source}'");
                Ok(Value::Void)
            }
            Statement::Wait { condition, until } => {
                let condition = self.eval(condition)?;
                let condition = self.getval(condition);
                let until = self.eval(until)?;
                let until = self.getval(until);
                info!("WAITING {condition} UNTIL {until}");
                Ok(Value::Void)
            }
        }
    }

    fn exec_end(&mut self) -> Result<Value, RuntimeError> {
        match self.current_block().clone() {
            Block::If => {
                self.pop_read_enabled();
                self.pop_block();
                Ok(Value::Void)
            }
            Block::For {
                address,
                condition,
                increment,
            } => {
                self.eval(&increment)?;
                let again = self.eval(&condition)?;
                let again = self.getval(again);

                if again.truthy() {
                    // re-enter the body; the block and its read-enable stay
                    self.pc = address;
                } else {
                    self.pop_read_enabled();
                    self.pop_block();
                }
                Ok(Value::Void)
            }
            Block::Call { .. } => self.end_call(),
            Block::Main => Err(RuntimeError::BlockMismatch {
                message: "\"end\" outside of any block".into(),
            }),
        }
    }

    fn exec_call(&mut self, call: &ExecCall) -> Result<Value, RuntimeError> {
        let Some(routine) = self.fetch(&call.target) else {
            return Err(RuntimeError::UnknownCallable {
                name: call.target.clone(),
            });
        };

        let arguments = match &call.arguments {
            None => vec![],
            Some(ast) => {
                let value = self.eval(ast)?;
                match self.getval(value) {
                    Value::List(items) => items,
                    Value::Void => vec![],
                    value => vec![value],
                }
            }
        };

        match routine {
            Value::Procedure(procedure) => self.call_procedure(procedure, arguments),
            Value::Def(def) => self.call_def(def, arguments),
            _ => Err(RuntimeError::UnknownCallable {
                name: call.target.clone(),
            }),
        }
    }

    fn open_call(&mut self, name: &str, params: &[String], arguments: Vec<Value>) {
        self.block_stack.push(Block::Call { name: name.into() });
        self.push_read_enabled(true);
        self.push_scope();

        for (param, argument) in params.iter().zip(arguments) {
            self.bind(param, argument);
        }
    }

    fn call_procedure(
        &mut self,
        procedure: Rc<ProcedureVal>,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        debug!("calling procedure '{}'", procedure.name);

        if procedure.params.len() != arguments.len() {
            return Err(RuntimeError::Arity {
                name: procedure.name.clone(),
                expected: procedure.params.len(),
                given: arguments.len(),
            });
        }

        self.open_call(&procedure.name, &procedure.params, arguments);

        // jump into the body; stepping returns through the matching end
        self.memory.stack.push(Frame {
            ret_addr: Some(self.pc),
        });
        self.pc = procedure.address;
        Ok(Value::Void)
    }

    fn call_def(&mut self, def: Rc<DefVal>, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        debug!("calling def '{}'", def.name);

        if def.params.len() != arguments.len() {
            return Err(RuntimeError::Arity {
                name: def.name.clone(),
                expected: def.params.len(),
                given: arguments.len(),
            });
        }

        self.open_call(&def.name, &def.params, arguments);
        self.memory.stack.push(Frame { ret_addr: None });

        // the body is evaluated in place; the call yields its last value,
        // resolved before the callee scope goes away
        let mut last = Value::Void;
        for statement in &def.body {
            last = self.exec(statement)?;
        }
        let last = self.getval(last);

        self.end_call()?;
        Ok(last)
    }

    fn end_call(&mut self) -> Result<Value, RuntimeError> {
        let ret_addr = self.memory.stack.pop().and_then(|frame| frame.ret_addr);

        self.pop_read_enabled();
        self.pop_block();
        self.pop_scope();

        if let Some(ret_addr) = ret_addr {
            self.pc = ret_addr;
        }
        Ok(Value::Void)
    }

    fn eval(&mut self, node: &Ast) -> Result<Value, RuntimeError> {
        match node {
            Ast::Atom(lexeme) => self.eval_atom(lexeme),
            Ast::List(elements) => {
                if !self.is_read_enabled() {
                    return Ok(Value::Void);
                }

                let mut values = vec![];
                for element in elements {
                    let value = self.eval(element)?;
                    values.push(self.getval(value));
                }
                Ok(Value::List(values))
            }
            Ast::Call(call) => {
                if !self.is_read_enabled() {
                    return Ok(Value::Void);
                }
                self.exec_call(call)
            }
            Ast::Seq(terms) => {
                if !self.is_read_enabled() {
                    return Ok(Value::Void);
                }
                self.eval_seq(terms)
            }
        }
    }

    fn eval_atom(&mut self, lexeme: &Lexeme) -> Result<Value, RuntimeError> {
        match &lexeme.kind {
            LexemeKind::Ident => Ok(self.fetch(&lexeme.word).unwrap_or(Value::Void)),
            _ => self.constant(lexeme),
        }
    }

    fn constant(&self, lexeme: &Lexeme) -> Result<Value, RuntimeError> {
        match &lexeme.kind {
            LexemeKind::Integer(value) => Ok(Value::Int(*value)),
            LexemeKind::Float(value) => Ok(Value::Float(*value)),
            LexemeKind::Str(value) => Ok(Value::Str(value.clone())),
            LexemeKind::Bool(value) => Ok(Value::Bool(*value)),
            _ => Err(RuntimeError::type_error(format!(
                "cannot evaluate '{}'",
                lexeme.word
            ))),
        }
    }

    /// An item of a sequence under evaluation: identifiers stay unresolved
    /// until an operator decides whether it needs the reference or the
    /// value.
    fn item_value(&self, item: Item) -> Result<Value, RuntimeError> {
        match item {
            Item::Val(value) => Ok(value),
            Item::Atom(lexeme) => match &lexeme.kind {
                LexemeKind::Ident => Ok(Value::Ident(lexeme.word.clone())),
                _ => self.constant(lexeme),
            },
        }
    }

    fn eval_seq(&mut self, terms: &[Ast]) -> Result<Value, RuntimeError> {
        if terms.is_empty() {
            return Ok(Value::Void);
        }

        // evaluate nested nodes first, keep atoms for operator dispatch
        let mut items = vec![];
        for term in terms {
            match term {
                Ast::Atom(lexeme) => items.push(Item::Atom(lexeme)),
                nested => items.push(Item::Val(self.eval(nested)?)),
            }
        }

        match items.len() {
            1 => self.item_value(items.pop().expect("one item")),
            2 => {
                let operand = items.pop().expect("two items");
                let head = items.pop().expect("two items");
                self.eval_unary(head, operand)
            }
            3 => {
                let rhs = items.pop().expect("three items");
                let op = items.pop().expect("three items");
                let lhs = items.pop().expect("three items");
                self.eval_binary(lhs, op, rhs)
            }
            _ => Err(RuntimeError::type_error("malformed expression")),
        }
    }

    fn eval_unary(&mut self, head: Item, operand: Item) -> Result<Value, RuntimeError> {
        let Item::Atom(head) = head else {
            return Err(RuntimeError::type_error("malformed expression"));
        };

        match &head.kind {
            LexemeKind::Unary(UnaryOp::Not) => {
                let value = self.item_value(operand)?;
                let value = self.getval(value);
                Ok(Value::Bool(!value.truthy()))
            }
            LexemeKind::Postfix(op) => {
                let value = self.item_value(operand)?;
                let Value::Ident(name) = value else {
                    return Err(RuntimeError::type_error(format!(
                        "'{}' needs an identifier",
                        head.word
                    )));
                };

                let Some(current) = self.fetch(&name) else {
                    return Err(RuntimeError::type_error(format!(
                        "'{name}' is not defined"
                    )));
                };

                let next = match (op, current) {
                    (PostOp::Increment, Value::Int(value)) => Value::Int(value + 1),
                    (PostOp::Increment, Value::Float(value)) => Value::Float(value + 1.0),
                    (PostOp::Decrement, Value::Int(value)) => Value::Int(value - 1),
                    (PostOp::Decrement, Value::Float(value)) => Value::Float(value - 1.0),
                    (_, other) => {
                        return Err(RuntimeError::type_error(format!(
                            "cannot apply '{}' to {}",
                            head.word,
                            other.type_name()
                        )))
                    }
                };

                self.bind(&name, next.clone());
                Ok(next)
            }
            // a parameter clause evaluates to its argument
            LexemeKind::Parameter(_) => {
                let value = self.item_value(operand)?;
                Ok(self.getval(value))
            }
            _ => Err(RuntimeError::type_error(format!(
                "'{}' is not a unary operator",
                head.word
            ))),
        }
    }

    fn eval_binary(&mut self, lhs: Item, op: Item, rhs: Item) -> Result<Value, RuntimeError> {
        let Item::Atom(op) = op else {
            return Err(RuntimeError::type_error("malformed expression"));
        };

        let LexemeKind::Op(binop) = op.kind else {
            return Err(RuntimeError::type_error(format!(
                "'{}' is not an operator",
                op.word
            )));
        };

        if binop == BinOp::Assign {
            let rhs = self.item_value(rhs)?;
            let rhs = self.getval(rhs);

            return match self.item_value(lhs)? {
                Value::Ident(name) => {
                    self.bind(&name, rhs);
                    Ok(Value::Ident(name))
                }
                other => Err(RuntimeError::type_error(format!(
                    "cannot assign to a {}",
                    other.type_name()
                ))),
            };
        }

        let lhs = self.item_value(lhs)?;
        let lhs = self.getval(lhs);
        let rhs = self.item_value(rhs)?;
        let rhs = self.getval(rhs);
        ops::binary(binop, lhs, rhs)
    }
}
