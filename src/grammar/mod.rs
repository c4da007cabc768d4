//! The typing grammar: a declarative acceptor over lexeme type tags.
//!
//! The rule tree of the language is self-referential, so it lives as an
//! explicit graph built once at startup: nodes in a vector, edges keyed by a
//! regex over tags pointing at node indices. Every node is accepting; the
//! grammar only answers "may this tag come next", precedence is the
//! parser's business (see `Parser::build_ast`).

use once_cell::sync::Lazy;
use regex::Regex;

struct Edge {
    pattern: Regex,
    to: usize,
}

struct Node {
    edges: Vec<Edge>,
}

struct Rules {
    nodes: Vec<Node>,
}

const EXPRESSION: usize = 0;
const VALUE: usize = 1;
const CLAUSE: usize = 2;

fn edge(pattern: &str, to: usize) -> Edge {
    Edge {
        pattern: Regex::new(pattern).expect("invalid grammar pattern"),
        to,
    }
}

static RULES: Lazy<Rules> = Lazy::new(|| Rules {
    nodes: vec![
        // expression root: a term may open with a prefix operator, a
        // grouping, a list or a value
        Node {
            edges: vec![
                edge(r"^<unary-op>$", EXPRESSION),
                edge(r"^<delim>$", EXPRESSION),
                edge(r"^<bracket>$", VALUE),
                edge(r"^(<const>|<ident>)$", VALUE),
            ],
        },
        // after a value
        Node {
            edges: vec![
                edge(r"^(<bracket>|<const>|<ident>)$", VALUE),
                edge(r"^<op>$", EXPRESSION),
                edge(r"^<unary-post-op>$", EXPRESSION),
                edge(r"^(</delim>|</bracket>)$", VALUE),
                edge(r"^<comma>$", EXPRESSION),
            ],
        },
        // clause: a parameter word introducing an expression
        Node {
            edges: vec![edge(r"^<parameter>$", EXPRESSION)],
        },
    ],
});

impl Rules {
    fn step(&self, at: usize, tag: &str) -> Option<usize> {
        self.nodes[at]
            .edges
            .iter()
            .find(|edge| edge.pattern.is_match(tag))
            .map(|edge| edge.to)
    }
}

/// Entry points into the rule graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    Expression,
    Clause,
}

impl Start {
    fn node(&self) -> usize {
        match self {
            Start::Expression => EXPRESSION,
            Start::Clause => CLAUSE,
        }
    }
}

/// A position inside the rule graph, advanced one tag at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    at: usize,
}

impl Cursor {
    pub fn new(start: Start) -> Self {
        Self { at: start.node() }
    }

    /// Advance by one tag. On rejection the cursor is left untouched.
    pub fn advance(&mut self, tag: &str) -> bool {
        match RULES.step(self.at, tag) {
            Some(to) => {
                self.at = to;
                true
            }
            None => false,
        }
    }

    /// The currently legal tag patterns. Used for error messages.
    pub fn hint(&self) -> Vec<String> {
        RULES.nodes[self.at]
            .edges
            .iter()
            .map(|edge| {
                edge.pattern
                    .as_str()
                    .trim_matches(|c| c == '^' || c == '$')
                    .to_string()
            })
            .collect()
    }
}

/// Does any path from the entry point admit this tag?
pub fn belongs(start: Start, tag: &str) -> bool {
    let mut seen = vec![false; RULES.nodes.len()];
    let mut queue = vec![start.node()];

    while let Some(at) = queue.pop() {
        if seen[at] {
            continue;
        }
        seen[at] = true;

        for edge in &RULES.nodes[at].edges {
            if edge.pattern.is_match(tag) {
                return true;
            }
            queue.push(edge.to);
        }
    }

    false
}

/// Is the tag sequence an acceptable prefix of a sentence?
pub fn is_legal<'a>(start: Start, tags: impl IntoIterator<Item = &'a str>) -> bool {
    let mut cursor = Cursor::new(start);
    tags.into_iter().all(|tag| cursor.advance(tag))
}
