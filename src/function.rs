use std::{borrow::Cow, collections::HashMap};

use regex::Regex;
use serde_json::Value;

/// A method call argument, after evaluation.
#[derive(Debug)]
pub enum Argument<'a> {
    Value(Cow<'a, Value>),
    /// A regular expression literal, compiled with the path.
    Regex(&'a Regex),
    /// The argument expression selected nothing.
    Nothing,
}

impl<'a> Argument<'a> {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Value(value) => Some(value.as_ref()),
            _ => None,
        }
    }
}

/// A method callable from a filter predicate, like `@.name.startsWith('A')`.
///
/// Methods are only called on a receiver that exists. Returning `None` means
/// the call selects nothing.
pub trait MethodExtension {
    fn call(&self, receiver: &Value, args: &[Argument]) -> Option<Value>;

    /// The number of arguments the method requires.
    fn arity(&self) -> usize;
}

pub type MethodRegister = HashMap<String, Box<dyn MethodExtension + Send + Sync>>;
