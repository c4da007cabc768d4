//! The symbol tree: a greedy, regex-keyed acceptor turning raw tokens into
//! typed lexemes. Multi-token symbols (`==`, `!==`, `++`, `/*`, negative
//! numerics) are nested nodes; a node's terminal is what the accumulated
//! word becomes when no longer match is possible.

use once_cell::sync::Lazy;
use regex::Regex;

use super::lexeme::{reserved, BinOp, LexemeKind, PostOp, UnaryOp};

/// Builds the kind of the accumulated word. `None` means the word does not
/// fit the target type after all (e.g. a numeric literal out of range).
pub(super) type Ctor = fn(&str) -> Option<LexemeKind>;

pub(super) enum Entry {
    Leaf(Ctor),
    Node(Node),
}

pub(super) struct Node {
    pub edges: Vec<Edge>,
    pub terminal: Option<Ctor>,
}

pub(super) struct Edge {
    pub pattern: Regex,
    /// Edge is only taken when the previous lexeme was not a value. Used to
    /// tell a negative literal apart from a subtraction.
    pub not_after_value: bool,
    pub next: Entry,
}

fn edge(pattern: &str, next: Entry) -> Edge {
    Edge {
        pattern: Regex::new(pattern).expect("invalid symbol pattern"),
        not_after_value: false,
        next,
    }
}

fn guarded(pattern: &str, next: Entry) -> Edge {
    Edge {
        pattern: Regex::new(pattern).expect("invalid symbol pattern"),
        not_after_value: true,
        next,
    }
}

const R_SPACE: &str = r"^[ \r]$";
const R_NEWLINE: &str = r"^[\n;]$";
const R_TAB: &str = r"^\t$";
const R_SLASH: &str = r"^/$";
const R_ASTERISK: &str = r"^\*$";
const R_COMMA: &str = r"^,$";
const R_EQUAL: &str = r"^=$";
const R_PLUS: &str = r"^\+$";
const R_DASH: &str = r"^-$";
const R_GREATER: &str = r"^>$";
const R_LESSER: &str = r"^<$";
const R_BRACKET_L: &str = r"^\[$";
const R_BRACKET_R: &str = r"^\]$";
const R_PAREN_L: &str = r"^\($";
const R_PAREN_R: &str = r"^\)$";
const R_BANG: &str = r"^!$";
const R_DOUBLE_QUOTE: &str = "^\"$";
const R_SINGLE_QUOTE: &str = r"^'$";
const R_FLOAT: &str = r"^[0-9]*\.[0-9]+$";
const R_INT: &str = r"^[0-9]+$";
const R_OR: &str = r"(?i)^OR$";
const R_NOR: &str = r"(?i)^NOR$";
const R_XOR: &str = r"(?i)^XOR$";
const R_AND: &str = r"(?i)^AND$";
const R_NAND: &str = r"(?i)^NAND$";
const R_NOT: &str = r"(?i)^NOT$";
const R_TRUE: &str = r"(?i)^TRUE$";
const R_FALSE: &str = r"(?i)^FALSE$";
const R_IDENTIFIER: &str = r"^[_a-zA-Z][_a-zA-Z0-9]*$";

fn space(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Space)
}

fn tab(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Tab)
}

fn newline(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::NewLine)
}

fn bracket_open(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Bracket { open: true })
}

fn bracket_close(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Bracket { open: false })
}

fn paren_open(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Paren { open: true })
}

fn paren_close(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Paren { open: false })
}

fn double_quote(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::DoubleQuote)
}

fn single_quote(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::SingleQuote)
}

fn comma(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Comma)
}

fn comment_line(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::CommentLine)
}

fn comment_open(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::CommentBlock { open: true })
}

fn comment_close(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::CommentBlock { open: false })
}

fn integer(word: &str) -> Option<LexemeKind> {
    word.parse().ok().map(LexemeKind::Integer)
}

fn float(word: &str) -> Option<LexemeKind> {
    word.parse().ok().map(LexemeKind::Float)
}

fn boolean(word: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Bool(word.eq_ignore_ascii_case("true")))
}

fn identifier(word: &str) -> Option<LexemeKind> {
    Some(reserved(word).unwrap_or(LexemeKind::Ident))
}

fn op(op: BinOp) -> Ctor {
    match op {
        BinOp::Assign => |_| Some(LexemeKind::Op(BinOp::Assign)),
        BinOp::Equal => |_| Some(LexemeKind::Op(BinOp::Equal)),
        BinOp::EqualStrict => |_| Some(LexemeKind::Op(BinOp::EqualStrict)),
        BinOp::Unequal => |_| Some(LexemeKind::Op(BinOp::Unequal)),
        BinOp::UnequalStrict => |_| Some(LexemeKind::Op(BinOp::UnequalStrict)),
        BinOp::Greater => |_| Some(LexemeKind::Op(BinOp::Greater)),
        BinOp::Lesser => |_| Some(LexemeKind::Op(BinOp::Lesser)),
        BinOp::Add => |_| Some(LexemeKind::Op(BinOp::Add)),
        BinOp::Subtract => |_| Some(LexemeKind::Op(BinOp::Subtract)),
        BinOp::Multiply => |_| Some(LexemeKind::Op(BinOp::Multiply)),
        BinOp::Divide => |_| Some(LexemeKind::Op(BinOp::Divide)),
        BinOp::And => |_| Some(LexemeKind::Op(BinOp::And)),
        BinOp::Or => |_| Some(LexemeKind::Op(BinOp::Or)),
        BinOp::Nor => |_| Some(LexemeKind::Op(BinOp::Nor)),
        BinOp::Xor => |_| Some(LexemeKind::Op(BinOp::Xor)),
        BinOp::Nand => |_| Some(LexemeKind::Op(BinOp::Nand)),
    }
}

fn not(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Unary(UnaryOp::Not))
}

fn increment(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Postfix(PostOp::Increment))
}

fn decrement(_: &str) -> Option<LexemeKind> {
    Some(LexemeKind::Postfix(PostOp::Decrement))
}

pub(super) static SYMBOLS: Lazy<Node> = Lazy::new(|| Node {
    terminal: None,
    edges: vec![
        edge(R_SPACE, Entry::Leaf(space)),
        edge(R_NEWLINE, Entry::Leaf(newline)),
        edge(R_TAB, Entry::Leaf(tab)),
        edge(R_BRACKET_L, Entry::Leaf(bracket_open)),
        edge(R_BRACKET_R, Entry::Leaf(bracket_close)),
        edge(R_DOUBLE_QUOTE, Entry::Leaf(double_quote)),
        edge(R_SINGLE_QUOTE, Entry::Leaf(single_quote)),
        edge(R_PAREN_L, Entry::Leaf(paren_open)),
        edge(R_PAREN_R, Entry::Leaf(paren_close)),
        edge(
            R_SLASH,
            Entry::Node(Node {
                edges: vec![
                    edge(R_ASTERISK, Entry::Leaf(comment_open)),
                    edge(R_SLASH, Entry::Leaf(comment_line)),
                ],
                terminal: Some(op(BinOp::Divide)),
            }),
        ),
        edge(
            R_ASTERISK,
            Entry::Node(Node {
                edges: vec![edge(R_SLASH, Entry::Leaf(comment_close))],
                terminal: Some(op(BinOp::Multiply)),
            }),
        ),
        edge(R_COMMA, Entry::Leaf(comma)),
        edge(
            R_BANG,
            Entry::Node(Node {
                edges: vec![edge(
                    R_EQUAL,
                    Entry::Node(Node {
                        edges: vec![edge(R_EQUAL, Entry::Leaf(op(BinOp::UnequalStrict)))],
                        terminal: Some(op(BinOp::Unequal)),
                    }),
                )],
                terminal: Some(not),
            }),
        ),
        edge(
            R_EQUAL,
            Entry::Node(Node {
                edges: vec![edge(
                    R_EQUAL,
                    Entry::Node(Node {
                        edges: vec![edge(R_EQUAL, Entry::Leaf(op(BinOp::EqualStrict)))],
                        terminal: Some(op(BinOp::Equal)),
                    }),
                )],
                terminal: Some(op(BinOp::Assign)),
            }),
        ),
        edge(
            R_PLUS,
            Entry::Node(Node {
                edges: vec![edge(R_PLUS, Entry::Leaf(increment))],
                terminal: Some(op(BinOp::Add)),
            }),
        ),
        edge(R_FLOAT, Entry::Leaf(float)),
        edge(R_INT, Entry::Leaf(integer)),
        edge(
            R_DASH,
            Entry::Node(Node {
                edges: vec![
                    edge(R_DASH, Entry::Leaf(decrement)),
                    guarded(R_FLOAT, Entry::Leaf(float)),
                    guarded(R_INT, Entry::Leaf(integer)),
                ],
                terminal: Some(op(BinOp::Subtract)),
            }),
        ),
        edge(R_GREATER, Entry::Leaf(op(BinOp::Greater))),
        edge(R_LESSER, Entry::Leaf(op(BinOp::Lesser))),
        edge(R_OR, Entry::Leaf(op(BinOp::Or))),
        edge(R_NOR, Entry::Leaf(op(BinOp::Nor))),
        edge(R_XOR, Entry::Leaf(op(BinOp::Xor))),
        edge(R_AND, Entry::Leaf(op(BinOp::And))),
        edge(R_NAND, Entry::Leaf(op(BinOp::Nand))),
        edge(R_NOT, Entry::Leaf(not)),
        edge(R_TRUE, Entry::Leaf(boolean)),
        edge(R_FALSE, Entry::Leaf(boolean)),
        edge(R_IDENTIFIER, Entry::Leaf(identifier)),
    ],
});
