//! Methods available on filter paths, like `@.name.toLowerCase()`.

use std::{num::NonZeroUsize, sync::Mutex};

use log::trace;
use lru::LruCache;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::{
    filter::{js_string, number_value},
    function::{Argument, MethodExtension},
};

/// Compile a regular expression literal, `/pattern/flags`.
///
/// The `i`, `m` and `s` flags map to builder options. `g`, `u` and `y`
/// have no effect on a single match and are ignored.
pub fn js_regex(pattern: &str, flags: &str) -> Result<Regex, regex::Error> {
    let mut builder = RegexBuilder::new(&pattern.replace("\\/", "/"));

    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'g' | 'u' | 'y' => &mut builder,
            _ => {
                return Err(regex::Error::Syntax(format!(
                    "unknown regular expression flag '{}'",
                    flag
                )))
            }
        };
    }

    builder.build()
}

fn string_argument(args: &[Argument]) -> Option<String> {
    args.first()
        .and_then(|arg| arg.as_value())
        .map(|value| js_string(value))
}

pub struct Contains;

impl Contains {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for Contains {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodExtension for Contains {
    fn call(&self, receiver: &Value, args: &[Argument]) -> Option<Value> {
        let Some(needle) = string_argument(args) else {
            return Some(Value::Bool(false));
        };

        let rv = match receiver {
            Value::String(s) => s.contains(&needle),
            Value::Array(items) => items.iter().any(|item| match item {
                Value::String(s) => s.contains(&needle),
                _ => js_string(item) == needle,
            }),
            _ => js_string(receiver).contains(&needle),
        };

        Some(Value::Bool(rv))
    }

    fn arity(&self) -> usize {
        1
    }
}

pub struct StartsWith;

impl StartsWith {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for StartsWith {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodExtension for StartsWith {
    fn call(&self, receiver: &Value, args: &[Argument]) -> Option<Value> {
        let rv = string_argument(args).is_some_and(|prefix| js_string(receiver).starts_with(&prefix));
        Some(Value::Bool(rv))
    }

    fn arity(&self) -> usize {
        1
    }
}

pub struct EndsWith;

impl EndsWith {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for EndsWith {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodExtension for EndsWith {
    fn call(&self, receiver: &Value, args: &[Argument]) -> Option<Value> {
        let rv = string_argument(args).is_some_and(|suffix| js_string(receiver).ends_with(&suffix));
        Some(Value::Bool(rv))
    }

    fn arity(&self) -> usize {
        1
    }
}

/// `match` and `test`. The pattern is a regex literal or a string, which is
/// compiled without flags and cached.
pub struct Match {
    cache: Mutex<LruCache<String, Regex>>,
}

impl Match {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn is_match(&self, pattern: &str, s: &str) -> bool {
        let mut cache = self.cache.lock().unwrap_or_else(|err| err.into_inner());

        if let Some(re) = cache.get(pattern) {
            return re.is_match(s);
        }

        match js_regex(pattern, "") {
            Ok(re) => {
                let rv = re.is_match(s);
                cache.push(pattern.to_owned(), re);
                rv
            }
            Err(err) => {
                trace!("invalid pattern '{}': {}", pattern, err);
                false
            }
        }
    }
}

impl Default for Match {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodExtension for Match {
    fn call(&self, receiver: &Value, args: &[Argument]) -> Option<Value> {
        let Value::String(s) = receiver else {
            return Some(Value::Bool(false));
        };

        let rv = match args.first() {
            Some(Argument::Regex(re)) => re.is_match(s),
            Some(Argument::Value(pattern)) => match pattern.as_ref() {
                Value::String(p) => self.is_match(p, s),
                other => self.is_match(&js_string(other), s),
            },
            _ => false,
        };

        Some(Value::Bool(rv))
    }

    fn arity(&self) -> usize {
        1
    }
}

pub struct ToLowerCase;

impl ToLowerCase {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ToLowerCase {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodExtension for ToLowerCase {
    fn call(&self, receiver: &Value, _args: &[Argument]) -> Option<Value> {
        receiver.as_str().map(|s| Value::String(s.to_lowercase()))
    }

    fn arity(&self) -> usize {
        0
    }
}

pub struct ToUpperCase;

impl ToUpperCase {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ToUpperCase {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodExtension for ToUpperCase {
    fn call(&self, receiver: &Value, _args: &[Argument]) -> Option<Value> {
        receiver.as_str().map(|s| Value::String(s.to_uppercase()))
    }

    fn arity(&self) -> usize {
        0
    }
}

/// The name of the receiver's type, as reported by the `typeof` operator.
pub struct TypeOf;

impl TypeOf {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for TypeOf {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodExtension for TypeOf {
    fn call(&self, receiver: &Value, _args: &[Argument]) -> Option<Value> {
        let name = match receiver {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
        };
        Some(Value::String(name.to_owned()))
    }

    fn arity(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Rounding {
    Floor,
    Round,
    Ceil,
}

/// `floor`, `round` and `ceil`. Rounding applies to numbers only. `round`
/// rounds halves up, so `-2.5` rounds to `-2`.
pub struct Round {
    mode: Rounding,
}

impl Round {
    pub fn new(mode: Rounding) -> Self {
        Self { mode }
    }
}

impl MethodExtension for Round {
    fn call(&self, receiver: &Value, _args: &[Argument]) -> Option<Value> {
        let n = receiver.as_f64()?;
        let rv = match self.mode {
            Rounding::Floor => n.floor(),
            Rounding::Round => (n + 0.5).floor(),
            Rounding::Ceil => n.ceil(),
        };
        Some(number_value(rv))
    }

    fn arity(&self) -> usize {
        0
    }
}
