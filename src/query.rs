use std::fmt;

use lazy_static::lazy_static;
use log::trace;
use serde_json::Value;

use crate::{
    ast::AstNode,
    env::Environment,
    errors::JSONPathError,
    evaluator::{renumber, QueryContext},
    node::{Node, NodeList},
    parser::Parser,
    position::locate_all,
};

lazy_static! {
    static ref PARSER: Parser = Parser::new();
}

/// A compiled path.
#[derive(Debug, Clone)]
pub struct Query {
    /// Top-level segments, in the order they are applied to the root.
    pub segments: Vec<AstNode>,
}

impl Query {
    pub fn new(expr: &str) -> Result<Self, JSONPathError> {
        PARSER.parse(expr)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn find<'v>(
        &self,
        value: &'v Value,
        env: &Environment,
    ) -> Result<NodeList<'v>, JSONPathError> {
        self.find_with_checkpoint(value, env, || true)
    }

    /// Like [`Query::find`], polling `checkpoint` before each top-level
    /// segment. Evaluation is cancelled when it returns `false`.
    pub fn find_with_checkpoint<'v>(
        &self,
        value: &'v Value,
        env: &Environment,
        mut checkpoint: impl FnMut() -> bool,
    ) -> Result<NodeList<'v>, JSONPathError> {
        let budget = env.budget();
        let context = QueryContext {
            env,
            budget: &budget,
            root: value,
        };

        let mut nodes = vec![Node::root(value)];

        for (i, segment) in self.segments.iter().enumerate() {
            if !checkpoint() {
                return Err(JSONPathError::cancelled(format!(
                    "evaluation of {} stopped before segment {}",
                    self, i
                )));
            }

            let prev = i.checked_sub(1).and_then(|j| self.segments.get(j));
            nodes = renumber(segment.resolve(nodes, prev, &context)?);
            trace!("{} node(s) after {}", nodes.len(), segment);
        }

        Ok(nodes)
    }

    /// Evaluate against `value`, decoded from `text`, and set the position of
    /// each node in `text`.
    pub fn find_with_positions<'v>(
        &self,
        value: &'v Value,
        text: &str,
        env: &Environment,
    ) -> Result<NodeList<'v>, JSONPathError> {
        let mut nodes = self.find(value, env)?;
        locate_all(&mut nodes, text);
        Ok(nodes)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}",
            self.segments
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>()
                .join("")
        )
    }
}
