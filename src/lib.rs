//! DungeonTalk: a small imperative scripting language for driving tabletop
//! style scenarios, executed one statement at a time so a host can
//! interleave its own work between steps.
//!
//! The crate is a straight pipeline: [`lexer`] turns bytes into typed
//! lexemes, [`grammar`] validates expressions at the type-tag level,
//! [`parser`] produces the instruction stream, and [`interpreter`] walks it.

pub mod grammar;
pub mod interpreter;
pub mod lexer;
pub mod parser;
