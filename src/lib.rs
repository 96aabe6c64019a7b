//! A JSONPath query engine supporting the JSONPath-Plus extensions: parent
//! references (`^`), property names (`~`), context predicates like
//! `@property`, `@parent`, `@parentProperty` and `@path`, and method calls
//! like `@.name.startsWith('A')` inside filters.
//!
//! ## Compile and find
//!
//! Compile a path once with [`Query::new`], then evaluate it against any
//! number of [`serde_json::Value`]s.
//!
//! ```
//! use jsonpath_plus::{errors::JSONPathError, Environment, Query};
//! use serde_json::json;
//!
//! fn main() -> Result<(), JSONPathError> {
//!     let env = Environment::new();
//!     let query = Query::new("$.store.book[?(@.price < 10)].title")?;
//!     let data = json!({"store": {"book": [
//!         {"title": "Sayings of the Century", "price": 8.95},
//!         {"title": "Sword of Honour", "price": 12.99}
//!     ]}});
//!
//!     let nodes = query.find(&data, &env)?;
//!     assert_eq!(nodes.len(), 1);
//!     assert_eq!(nodes[0].path(), "$.store.book[0].title");
//!     Ok(())
//! }
//! ```
//!
//! Each [`Node`] in the result records its value, the container holding it,
//! its location and its index in the source array.
//!
//! ## Source positions
//!
//! [`Query::find_with_positions`] also maps each node to its byte span in the
//! JSON text the value was decoded from.
//!
//! ## Limits
//!
//! [`JSONPathEngine`] wraps compilation and evaluation with a path cache, a
//! recursion limit, a result limit and a timeout, configured by [`Config`].

mod ast;
pub mod cache;
pub mod config;
pub mod engine;
pub mod env;
pub mod errors;
mod evaluator;
pub mod filter;
pub mod function;
pub mod jsonpath;
mod lexer;
pub mod node;
pub mod parser;
pub mod position;
pub mod query;
pub mod standard_functions;
mod token;

pub use ast::{
    Accessor, AstNode, ComparisonOperator, FilterExpression, LogicalOperator, NodeKind, PathBase,
};
pub use config::Config;
pub use engine::JSONPathEngine;
pub use env::Environment;
pub use errors::{JSONPathError, JSONPathErrorType};
pub use jsonpath::find;
pub use jsonpath::ENV;
pub use node::{Match, Node, NodeList, PathElement, Via};
pub use parser::Parser;
pub use position::Span;
pub use query::Query;
