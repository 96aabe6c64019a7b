//! Evaluation of compiled filter predicates.

use std::{borrow::Cow, cmp::Ordering};

use log::debug;
use serde_json::{Number, Value};

use crate::{
    ast::{Accessor, ComparisonOperator, FilterExpression, LogicalOperator, PathBase},
    env::{Budget, Environment},
    errors::JSONPathError,
    function::Argument,
    node::{bracket_path, PathElement},
};

/// The view of one candidate node seen by a filter predicate.
pub struct FilterContext<'c, 'e> {
    pub env: &'e Environment,
    pub budget: &'e Budget,
    pub root: &'c Value,
    /// The value bound to `@`.
    pub current: &'c Value,
    /// The value bound to `@parent`.
    pub parent: Option<&'c Value>,
    /// Location of the current value. `@property` is its last element and
    /// `@parentProperty` the one before.
    pub location: &'e [PathElement],
    pub index: usize,
}

impl<'c, 'e> FilterContext<'c, 'e> {
    pub fn property(&self) -> Option<&PathElement> {
        self.location.last()
    }

    pub fn parent_property(&self) -> Option<&PathElement> {
        self.location.len().checked_sub(2).map(|i| &self.location[i])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpressionResult<'c> {
    Value(Cow<'c, Value>),
    /// Zero or more values from a multi-valued path, like `@.items[*]`.
    Values(Vec<Cow<'c, Value>>),
    Nothing,
}

impl<'c> FilterExpressionResult<'c> {
    fn into_values(self) -> Vec<Cow<'c, Value>> {
        match self {
            FilterExpressionResult::Value(v) => vec![v],
            FilterExpressionResult::Values(values) => values,
            FilterExpressionResult::Nothing => Vec::new(),
        }
    }

    /// A path result is truthy if it selected something that is not empty,
    /// `null` or `false`.
    fn exists(&self) -> bool {
        match self {
            FilterExpressionResult::Value(v) => is_present(v),
            FilterExpressionResult::Values(values) => !values.is_empty(),
            FilterExpressionResult::Nothing => false,
        }
    }
}

impl FilterExpression {
    /// Test the predicate against one candidate.
    pub fn test(&self, context: &FilterContext) -> Result<bool, JSONPathError> {
        match self {
            FilterExpression::True => Ok(true),
            FilterExpression::False | FilterExpression::Null => Ok(false),
            FilterExpression::String { value } => Ok(!value.is_empty()),
            FilterExpression::Int { value } => Ok(*value != 0),
            FilterExpression::Float { value } => Ok(*value != 0.0 && !value.is_nan()),
            FilterExpression::Regex { .. } => Ok(true),
            FilterExpression::Not { expression } => Ok(!expression.test(context)?),
            FilterExpression::Logical {
                left,
                operator,
                right,
            } => match operator {
                LogicalOperator::And => Ok(left.test(context)? && right.test(context)?),
                LogicalOperator::Or => Ok(left.test(context)? || right.test(context)?),
            },
            FilterExpression::Comparison {
                left,
                operator,
                right,
            } => {
                let coerce = left.is_keyword() || right.is_keyword();
                let left = left.evaluate(context)?;
                let right = right.evaluate(context)?;
                Ok(compare(left, *operator, right, coerce))
            }
            FilterExpression::Path { base, accessors } => {
                let rv = self.evaluate(context)?;
                if accessors.is_empty() && *base != PathBase::Root {
                    // `@`, `@property` and friends use JavaScript truthiness
                    Ok(matches!(&rv, FilterExpressionResult::Value(v) if is_truthy(v)))
                } else {
                    Ok(rv.exists())
                }
            }
        }
    }

    pub fn evaluate<'c>(
        &self,
        context: &FilterContext<'c, '_>,
    ) -> Result<FilterExpressionResult<'c>, JSONPathError> {
        match self {
            FilterExpression::True => Ok(owned(Value::Bool(true))),
            FilterExpression::False => Ok(owned(Value::Bool(false))),
            FilterExpression::Null => Ok(owned(Value::Null)),
            FilterExpression::String { value } => Ok(owned(Value::String(value.clone()))),
            FilterExpression::Int { value } => Ok(owned(Value::Number(Number::from(*value)))),
            FilterExpression::Float { value } => Ok(owned(number_value(*value))),
            FilterExpression::Regex { pattern, .. } => Ok(owned(Value::String(pattern.clone()))),
            FilterExpression::Not { .. }
            | FilterExpression::Logical { .. }
            | FilterExpression::Comparison { .. } => Ok(owned(Value::Bool(self.test(context)?))),
            FilterExpression::Path { base, accessors } => evaluate_path(*base, accessors, context),
        }
    }
}

fn owned<'c>(value: Value) -> FilterExpressionResult<'c> {
    FilterExpressionResult::Value(Cow::Owned(value))
}

fn evaluate_path<'c>(
    base: PathBase,
    accessors: &[Accessor],
    context: &FilterContext<'c, '_>,
) -> Result<FilterExpressionResult<'c>, JSONPathError> {
    let mut rv = match base {
        PathBase::Current => FilterExpressionResult::Value(Cow::Borrowed(context.current)),
        PathBase::Root => FilterExpressionResult::Value(Cow::Borrowed(context.root)),
        PathBase::Parent => match context.parent {
            Some(parent) => FilterExpressionResult::Value(Cow::Borrowed(parent)),
            None => FilterExpressionResult::Nothing,
        },
        PathBase::Property => match context.property() {
            Some(key) => owned(key.to_value()),
            None => FilterExpressionResult::Nothing,
        },
        PathBase::ParentProperty => match context.parent_property() {
            Some(key) => owned(key.to_value()),
            None => FilterExpressionResult::Nothing,
        },
        PathBase::Path => owned(Value::String(bracket_path(context.location, false))),
    };

    // Where the current value sits, for nested predicates. Only tracked
    // while the path selects a single value.
    let nested = accessors
        .iter()
        .any(|accessor| matches!(accessor, Accessor::Filter { .. }));
    let mut location = match base {
        PathBase::Current if nested => Some(context.location.to_vec()),
        PathBase::Root if nested => Some(Vec::new()),
        _ => None,
    };

    for accessor in accessors {
        if let (Some(loc), FilterExpressionResult::Value(_)) = (location.as_mut(), &rv) {
            match accessor {
                Accessor::Name { name } => loc.push(PathElement::Name(name.clone())),
                Accessor::Index { index } if *index >= 0 => {
                    loc.push(PathElement::Index(*index as usize))
                }
                _ => (),
            }
        }

        if matches!(accessor, Accessor::Index { index } if *index < 0) {
            location = None;
        }

        rv = match rv {
            FilterExpressionResult::Nothing => return Ok(FilterExpressionResult::Nothing),
            FilterExpressionResult::Value(value) => {
                let loc = location.as_deref().unwrap_or(context.location);
                apply(accessor, value, loc, context)?
            }
            FilterExpressionResult::Values(values) => {
                location = None;
                let mut rv = Vec::new();
                for value in values {
                    rv.extend(apply(accessor, value, context.location, context)?.into_values());
                }
                FilterExpressionResult::Values(rv)
            }
        };

        if accessor.is_multi_valued() {
            location = None;
        }
    }

    Ok(rv)
}

/// Apply one accessor to a value.
fn apply<'c>(
    accessor: &Accessor,
    value: Cow<'c, Value>,
    location: &[PathElement],
    context: &FilterContext<'c, '_>,
) -> Result<FilterExpressionResult<'c>, JSONPathError> {
    let rv = match accessor {
        Accessor::Name { name } if name == "length" => length(value)?,
        Accessor::Name { name } => member(&value, name),
        Accessor::Index { index } => element(&value, *index),
        Accessor::Wild => FilterExpressionResult::Values(children(&value)),
        Accessor::Filter { expression } => nested_filter(expression, value, location, context)?,
        Accessor::Method { name, args } => call_method(name, args, &value, context)?,
    };
    Ok(rv)
}

fn project<'c>(
    value: &Cow<'c, Value>,
    select: impl Fn(&Value) -> Option<&Value>,
) -> FilterExpressionResult<'c> {
    let selected = match value {
        Cow::Borrowed(v) => select(*v).map(Cow::Borrowed),
        Cow::Owned(v) => select(v).map(|child| Cow::Owned(child.clone())),
    };

    match selected {
        Some(v) => FilterExpressionResult::Value(v),
        None => FilterExpressionResult::Nothing,
    }
}

fn member<'c>(value: &Cow<'c, Value>, name: &str) -> FilterExpressionResult<'c> {
    project(value, |v| match v {
        Value::Object(obj) => obj.get(name),
        Value::Array(arr) => name
            .parse::<i64>()
            .ok()
            .and_then(|i| normalize_index(i, arr.len()))
            .and_then(|i| arr.get(i)),
        _ => None,
    })
}

fn element<'c>(value: &Cow<'c, Value>, index: i64) -> FilterExpressionResult<'c> {
    project(value, |v| match v {
        Value::Array(arr) => normalize_index(index, arr.len()).and_then(|i| arr.get(i)),
        Value::Object(obj) => obj.get(&index.to_string()),
        _ => None,
    })
}

fn children<'c>(value: &Cow<'c, Value>) -> Vec<Cow<'c, Value>> {
    match value {
        Cow::Borrowed(v) => match *v {
            Value::Array(arr) => arr.iter().map(Cow::Borrowed).collect(),
            Value::Object(obj) => obj.values().map(Cow::Borrowed).collect(),
            _ => Vec::new(),
        },
        Cow::Owned(v) => match v {
            Value::Array(arr) => arr.iter().cloned().map(Cow::Owned).collect(),
            Value::Object(obj) => obj.values().cloned().map(Cow::Owned).collect(),
            _ => Vec::new(),
        },
    }
}

/// The `length` property. An object's own `length` member takes priority.
fn length(value: Cow<Value>) -> Result<FilterExpressionResult, JSONPathError> {
    let n = match value.as_ref() {
        Value::Object(obj) if obj.contains_key("length") => return Ok(member(&value, "length")),
        Value::String(s) => s.chars().count(),
        Value::Array(arr) => arr.len(),
        Value::Object(obj) => obj.len(),
        Value::Null => {
            return Err(JSONPathError::typ(
                String::from("cannot read property 'length' of null"),
                0,
            ))
        }
        _ => return Ok(FilterExpressionResult::Nothing),
    };
    Ok(owned(Value::from(n)))
}

/// Evaluate `[?(…)]` inside a predicate. Array elements are tested with the
/// array as their parent; any other value is tested itself.
fn nested_filter<'c>(
    expression: &FilterExpression,
    value: Cow<'c, Value>,
    location: &[PathElement],
    context: &FilterContext<'c, '_>,
) -> Result<FilterExpressionResult<'c>, JSONPathError> {
    let Cow::Borrowed(value) = value else {
        return Ok(FilterExpressionResult::Nothing);
    };

    let _guard = context.budget.enter()?;

    match value {
        Value::Array(arr) => {
            let mut rv = Vec::new();
            let mut element_location = location.to_vec();
            for (i, item) in arr.iter().enumerate() {
                element_location.push(PathElement::Index(i));
                let nested = FilterContext {
                    env: context.env,
                    budget: context.budget,
                    root: context.root,
                    current: item,
                    parent: Some(value),
                    location: &element_location,
                    index: i,
                };
                if expression.test(&nested)? {
                    rv.push(Cow::Borrowed(item));
                }
                element_location.pop();
            }
            Ok(FilterExpressionResult::Values(rv))
        }
        _ => {
            let nested = FilterContext {
                env: context.env,
                budget: context.budget,
                root: context.root,
                current: value,
                parent: context.parent,
                location,
                index: context.index,
            };
            if expression.test(&nested)? {
                Ok(FilterExpressionResult::Value(Cow::Borrowed(value)))
            } else {
                Ok(FilterExpressionResult::Nothing)
            }
        }
    }
}

fn call_method<'c>(
    name: &str,
    args: &[FilterExpression],
    receiver: &Value,
    context: &FilterContext<'c, '_>,
) -> Result<FilterExpressionResult<'c>, JSONPathError> {
    let Some(method) = context.env.method_register.get(name) else {
        debug!("unknown method '{}'", name);
        return Ok(FilterExpressionResult::Nothing);
    };

    let mut arguments = Vec::with_capacity(args.len());
    for arg in args {
        let argument = match arg {
            FilterExpression::Regex { regex, .. } => Argument::Regex(regex),
            _ => match arg.evaluate(context)? {
                FilterExpressionResult::Value(v) => Argument::Value(v),
                FilterExpressionResult::Values(values) => match values.into_iter().next() {
                    Some(v) => Argument::Value(v),
                    None => Argument::Nothing,
                },
                FilterExpressionResult::Nothing => Argument::Nothing,
            },
        };
        arguments.push(argument);
    }

    if arguments.len() < method.arity() {
        debug!(
            "method '{}' expects {} argument(s), found {}",
            name,
            method.arity(),
            arguments.len()
        );
        return Ok(FilterExpressionResult::Nothing);
    }

    Ok(match method.call(receiver, &arguments) {
        Some(v) => owned(v),
        None => FilterExpressionResult::Nothing,
    })
}

/// Convert a possibly negative index to an offset into a sequence of `len`
/// items.
pub fn normalize_index(index: i64, len: usize) -> Option<usize> {
    if index >= 0 {
        usize::try_from(index).ok().filter(|i| *i < len)
    } else {
        let len = i64::try_from(len).ok()?;
        usize::try_from(len + index).ok()
    }
}

/// JavaScript truthiness.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Existence truthiness, false for `null`, `false` and empty strings,
/// arrays and objects.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => true,
        Value::String(s) => !s.is_empty(),
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
    }
}

/// A value's string form, as JavaScript's `String()` would produce it.
pub fn js_string(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
            Some(f) => f.to_string(),
            None => n.to_string(),
        },
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => arr
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                _ => js_string(v),
            })
            .collect::<Vec<String>>()
            .join(","),
        Value::Object(_) => String::from("[object Object]"),
    }
}

/// A JSON number from a float, preferring an integer representation.
pub fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

fn compare(
    left: FilterExpressionResult,
    operator: ComparisonOperator,
    right: FilterExpressionResult,
    coerce: bool,
) -> bool {
    match (&left, &right) {
        // two missing operands are equal, like `undefined == undefined`
        (FilterExpressionResult::Nothing, FilterExpressionResult::Nothing) => {
            return matches!(operator, ComparisonOperator::Eq | ComparisonOperator::StrictEq);
        }
        (FilterExpressionResult::Nothing, _) | (_, FilterExpressionResult::Nothing) => {
            return operator.is_negative();
        }
        _ => (),
    }

    let left = left.into_values();
    let right = right.into_values();

    // nothing to compare against an empty set
    if left.is_empty() || right.is_empty() {
        return operator.is_negative();
    }

    left.iter().any(|l| {
        right
            .iter()
            .any(|r| compare_values(l.as_ref(), operator, r.as_ref(), coerce))
    })
}

fn compare_values(left: &Value, operator: ComparisonOperator, right: &Value, coerce: bool) -> bool {
    use ComparisonOperator::*;
    match operator {
        StrictEq => strict_eq(left, right, coerce),
        StrictNe => !strict_eq(left, right, coerce),
        Eq => loose_eq(left, right),
        Ne => !loose_eq(left, right),
        Lt => ordering(left, right) == Some(Ordering::Less),
        Le => matches!(ordering(left, right), Some(Ordering::Less | Ordering::Equal)),
        Gt => ordering(left, right) == Some(Ordering::Greater),
        Ge => matches!(
            ordering(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

fn strict_eq(left: &Value, right: &Value, coerce: bool) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) if coerce => {
            parse_number(s).is_some_and(|f| Some(f) == n.as_f64())
        }
        _ => left == right,
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            parse_number(s).is_some_and(|f| Some(f) == n.as_f64())
        }
        (Value::Number(n), Value::Bool(b)) | (Value::Bool(b), Value::Number(n)) => {
            n.as_f64() == Some(if *b { 1.0 } else { 0.0 })
        }
        (Value::Number(_), Value::Number(_))
        | (Value::String(_), Value::String(_))
        | (Value::Bool(_), Value::Bool(_)) => strict_eq(left, right, false),
        _ => left == right || js_string(left) == js_string(right),
    }
}

fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Number(l), Value::String(r)) => l.as_f64()?.partial_cmp(&parse_number(r)?),
        (Value::String(l), Value::Number(r)) => parse_number(l)?.partial_cmp(&r.as_f64()?),
        _ => None,
    }
}

/// Parse a numeric string. Blank strings are not numbers.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}
