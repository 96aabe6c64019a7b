use crate::{env::Environment, errors::JSONPathError, node::NodeList, Query};
use lazy_static::lazy_static;
use serde_json::Value;

lazy_static! {
    pub static ref ENV: Environment = Environment::new();
}

/// Compile `expr` and evaluate it against `value` with the standard
/// environment.
pub fn find<'a>(expr: &str, value: &'a Value) -> Result<NodeList<'a>, JSONPathError> {
    let query = Query::new(expr)?;
    query.find(value, &ENV)
}
