//! Evaluation of path segments against a JSON value.

use std::cmp;

use itertools::Itertools;
use serde_json::Value;

use crate::{
    ast::{AstNode, FilterExpression, NodeKind},
    env::{Budget, Environment},
    errors::JSONPathError,
    filter::{normalize_index, FilterContext},
    node::{Node, NodeList, PathElement},
};

pub struct QueryContext<'v, 'e> {
    pub env: &'e Environment,
    pub budget: &'e Budget,
    pub root: &'v Value,
}

/// Resolve `segments` in order, starting from `nodes`. `prev` is the segment
/// that produced `nodes`, if any.
pub fn resolve_segments<'v>(
    segments: &[AstNode],
    nodes: NodeList<'v>,
    prev: Option<&AstNode>,
    context: &QueryContext<'v, '_>,
) -> Result<NodeList<'v>, JSONPathError> {
    segments
        .iter()
        .enumerate()
        .try_fold(nodes, |nodes, (i, segment)| {
            let before = if i == 0 { prev } else { segments.get(i - 1) };
            segment.resolve(nodes, before, context).map(renumber)
        })
}

/// Set each node's position within its batch.
pub fn renumber(mut nodes: NodeList) -> NodeList {
    for (i, node) in nodes.iter_mut().enumerate() {
        node.index = i;
    }
    nodes
}

impl AstNode {
    pub fn resolve<'v>(
        &self,
        nodes: NodeList<'v>,
        prev: Option<&AstNode>,
        context: &QueryContext<'v, '_>,
    ) -> Result<NodeList<'v>, JSONPathError> {
        match &self.kind {
            NodeKind::Root => Ok(vec![Node::root(context.root)]),
            NodeKind::Property { name } => Ok(nodes
                .iter()
                .filter_map(|node| property(node, name))
                .collect()),
            NodeKind::Wildcard => Ok(nodes.iter().flat_map(wildcard).collect()),
            NodeKind::IndexWildcard => Ok(nodes.iter().flat_map(children).collect()),
            NodeKind::Index { index } => Ok(nodes
                .iter()
                .filter_map(|node| element(node, *index))
                .collect()),
            NodeKind::Slice { start, end, step } => Ok(nodes
                .iter()
                .flat_map(|node| slice(node, *start, *end, *step))
                .collect()),
            NodeKind::Filter { expression, .. } => match expression {
                Some(expression) => {
                    let test_self = prev.is_some_and(AstNode::is_multi_valued);
                    filter(expression, nodes, test_self, context)
                }
                None => Ok(visit(nodes, context)?
                .into_iter()
                .unique_by(|node| node.location.clone())
                .collect()),
            },
            NodeKind::Recursive => self.resolve_recursive(nodes, prev, context),
            NodeKind::Union => nodes
                .iter()
                .flat_map(|node| {
                    self.children
                        .iter()
                        .map(move |member| member.resolve(vec![node.clone()], None, context))
                })
                .flatten_ok()
                .collect(),
            NodeKind::Chain => nodes
                .into_iter()
                .map(|node| self.resolve_chain(node, prev, context))
                .flatten_ok()
                .collect(),
            NodeKind::PropertyNames => Ok(resolve_segments(&self.children, nodes, prev, context)?
                .iter()
                .filter_map(Node::new_key_name)
                .collect()),
            NodeKind::Parent => Ok(resolve_segments(&self.children, nodes, prev, context)?
                .iter()
                .filter_map(|node| parent(node, context.root))
                .unique_by(|node| node.location.clone())
                .collect()),
        }
    }

    /// Thread one node through the members of a chain. A slice following a
    /// multi-valued member slices the batch.
    fn resolve_chain<'v>(
        &self,
        node: Node<'v>,
        prev: Option<&AstNode>,
        context: &QueryContext<'v, '_>,
    ) -> Result<NodeList<'v>, JSONPathError> {
        let mut batch = vec![node];

        for (i, member) in self.children.iter().enumerate() {
            let before = if i == 0 { prev } else { self.children.get(i - 1) };
            batch = match (&member.kind, before) {
                (NodeKind::Slice { start, end, step }, Some(before))
                    if i > 0 && before.is_multi_valued() =>
                {
                    slice_indices(batch.len(), *start, *end, *step)
                        .into_iter()
                        .map(|j| batch[j].clone())
                        .collect()
                }
                _ => member.resolve(batch, before, context)?,
            };
            batch = renumber(batch);
        }

        Ok(batch)
    }

    fn resolve_recursive<'v>(
        &self,
        nodes: NodeList<'v>,
        prev: Option<&AstNode>,
        context: &QueryContext<'v, '_>,
    ) -> Result<NodeList<'v>, JSONPathError> {
        match self.children.split_first() {
            None => Ok(visit(nodes, context)?
                .into_iter()
                .unique_by(|node| node.location.clone())
                .collect()),
            Some((first, rest)) if first.is_wildcard() => {
                let mut visited = Vec::new();
                for node in &nodes {
                    descendants(node, context, &mut visited)?;
                }
                let flattened = visited
                    .into_iter()
                    .unique_by(|node| node.location.clone())
                    .collect();
                resolve_segments(rest, renumber(flattened), Some(first), context)
            }
            Some(_) => {
                let rv: NodeList = visit(nodes, context)?
                    .into_iter()
                    .map(|node| resolve_segments(&self.children, vec![node], prev, context))
                    .flatten_ok()
                    .collect::<Result<_, _>>()?;
                Ok(rv
                    .into_iter()
                    .unique_by(|node| node.location.clone())
                    .collect())
            }
        }
    }
}

/// Each of `nodes` followed by its descendants, in pre-order.
fn visit<'v>(
    nodes: NodeList<'v>,
    context: &QueryContext<'v, '_>,
) -> Result<NodeList<'v>, JSONPathError> {
    let mut visited = Vec::new();
    for node in nodes {
        let at = visited.len();
        descendants(&node, context, &mut visited)?;
        visited.insert(at, node);
    }
    Ok(visited)
}

/// Append every descendant of `node` to `out`, in pre-order.
fn descendants<'v>(
    node: &Node<'v>,
    context: &QueryContext<'v, '_>,
    out: &mut NodeList<'v>,
) -> Result<(), JSONPathError> {
    let _guard = context.budget.enter()?;

    for child in children(node) {
        out.push(child.clone());
        descendants(&child, context, out)?;
    }

    Ok(())
}

fn property<'v>(node: &Node<'v>, name: &str) -> Option<Node<'v>> {
    let container = node.borrowed()?;
    match container {
        Value::Object(obj) => obj
            .iter()
            .enumerate()
            .find(|(_, (key, _))| key.as_str() == name)
            .map(|(i, (key, value))| node.new_object_member(container, key, value, i)),
        Value::Array(arr) => {
            let i = normalize_index(name.parse::<i64>().ok()?, arr.len())?;
            Some(node.new_array_element(container, &arr[i], i))
        }
        _ => None,
    }
}

fn element<'v>(node: &Node<'v>, index: i64) -> Option<Node<'v>> {
    let container = node.borrowed()?;
    match container {
        Value::Array(arr) => {
            let i = normalize_index(index, arr.len())?;
            Some(node.new_array_element(container, &arr[i], i))
        }
        Value::Object(_) => property(node, &index.to_string()),
        _ => None,
    }
}

fn members<'v>(node: &Node<'v>) -> NodeList<'v> {
    match node.borrowed() {
        Some(container @ Value::Object(obj)) => obj
            .iter()
            .enumerate()
            .map(|(i, (key, value))| node.new_object_member(container, key, value, i))
            .collect(),
        _ => Vec::new(),
    }
}

fn elements<'v>(node: &Node<'v>) -> NodeList<'v> {
    match node.borrowed() {
        Some(container @ Value::Array(arr)) => arr
            .iter()
            .enumerate()
            .map(|(i, value)| node.new_array_element(container, value, i))
            .collect(),
        _ => Vec::new(),
    }
}

/// Array elements or object members.
fn children<'v>(node: &Node<'v>) -> NodeList<'v> {
    match node.borrowed() {
        Some(Value::Array(_)) => elements(node),
        Some(Value::Object(_)) => members(node),
        _ => Vec::new(),
    }
}

/// `.*` on an array selects the members of each object element. Other
/// elements are selected themselves.
fn wildcard<'v>(node: &Node<'v>) -> NodeList<'v> {
    match node.borrowed() {
        Some(Value::Array(_)) => elements(node)
            .into_iter()
            .flat_map(|element| {
                if !element.value.is_object() {
                    return vec![element];
                }
                let mut flattened = members(&element);
                for member in flattened.iter_mut() {
                    member.original_index = element.original_index;
                }
                flattened
            })
            .collect(),
        _ => children(node),
    }
}

fn slice<'v>(
    node: &Node<'v>,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> NodeList<'v> {
    match node.borrowed() {
        Some(container @ Value::Array(arr)) => slice_indices(arr.len(), start, end, step)
            .into_iter()
            .map(|i| node.new_array_element(container, &arr[i], i))
            .collect(),
        _ => Vec::new(),
    }
}

/// Indices selected by `start:end:step` from a sequence of `length` items.
pub fn slice_indices(
    length: usize,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> Vec<usize> {
    let Ok(length) = i64::try_from(length) else {
        return Vec::new();
    };

    let step = step.unwrap_or(1);
    if length == 0 || step == 0 {
        return Vec::new();
    }

    let normalize = |i: i64| {
        if i < 0 {
            length.saturating_add(i)
        } else {
            i
        }
    };

    let mut indices = Vec::new();

    if step > 0 {
        let lower = cmp::min(cmp::max(normalize(start.unwrap_or(0)), 0), length);
        let upper = cmp::min(cmp::max(end.map_or(length, normalize), 0), length);
        let mut i = lower;
        while i < upper {
            indices.push(i as usize);
            i = i.saturating_add(step);
        }
    } else {
        let upper = cmp::min(cmp::max(start.map_or(length - 1, normalize), -1), length - 1);
        let lower = cmp::min(cmp::max(end.map_or(-1, normalize), -1), length - 1);
        let mut i = upper;
        while lower < i {
            indices.push(i as usize);
            i = i.saturating_add(step);
        }
    }

    indices
}

/// Test nodes against a filter. Array elements are tested individually, with
/// the array's container as their parent, unless `test_self` is set or the
/// node is not an array.
fn filter<'v>(
    expression: &FilterExpression,
    nodes: NodeList<'v>,
    test_self: bool,
    context: &QueryContext<'v, '_>,
) -> Result<NodeList<'v>, JSONPathError> {
    let mut rv = Vec::new();

    for node in nodes {
        match node.borrowed() {
            Some(container @ Value::Array(arr)) if !test_self => {
                for (i, value) in arr.iter().enumerate() {
                    let element = node.new_array_element(container, value, i);
                    if test(expression, &element, node.parent, context)? {
                        rv.push(element);
                    }
                }
            }
            _ => {
                if test(expression, &node, node.parent, context)? {
                    rv.push(node);
                }
            }
        }
    }

    Ok(rv)
}

fn test(
    expression: &FilterExpression,
    node: &Node,
    parent: Option<&Value>,
    context: &QueryContext,
) -> Result<bool, JSONPathError> {
    expression.test(&FilterContext {
        env: context.env,
        budget: context.budget,
        root: context.root,
        current: node.value.as_ref(),
        parent,
        location: &node.location,
        index: node.original_index,
    })
}

/// The node containing `node`, resolved from the root. `None` for the root.
fn parent<'v>(node: &Node<'v>, root: &'v Value) -> Option<Node<'v>> {
    let (_, location) = node.location.split_last()?;
    location
        .iter()
        .try_fold(Node::root(root), |node, element| match element {
            PathElement::Name(name) => property(&node, name),
            PathElement::Index(i) => {
                let container = node.borrowed()?;
                let value = container.as_array()?.get(*i)?;
                Some(node.new_array_element(container, value, *i))
            }
        })
}
