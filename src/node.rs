use std::{
    borrow::Cow,
    fmt::{self, Write},
};

use serde::Serialize;
use serde_json::Value;

use crate::{ast::write_quoted, lexer::is_shorthand_name, position::Span};

pub type Location = Vec<PathElement>;
pub type NodeList<'v> = Vec<Node<'v>>;

/// An array element index or object member name in a Node's location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    Index(usize),
    Name(String),
}

impl PathElement {
    /// The key as a JSON value: a string for member names, a number for
    /// array indices.
    pub fn to_value(&self) -> Value {
        match self {
            PathElement::Index(i) => Value::from(*i),
            PathElement::Name(name) => Value::String(name.clone()),
        }
    }

    /// The key as a JSON string. Array indices are stringified.
    pub fn to_key(&self) -> Value {
        match self {
            PathElement::Index(i) => Value::String(i.to_string()),
            PathElement::Name(name) => Value::String(name.clone()),
        }
    }

    fn write_bracketed(&self, f: &mut impl Write) -> fmt::Result {
        match self {
            PathElement::Index(i) => write!(f, "[{}]", i),
            PathElement::Name(name) => {
                f.write_char('[')?;
                write_quoted(f, name)?;
                f.write_char(']')
            }
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Name(name) if is_shorthand_name(name) => write!(f, ".{}", name),
            _ => self.write_bracketed(f),
        }
    }
}

/// How a node's value was reached from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Via {
    Root,
    Member,
    Element,
    /// The node is the key of a member or element, produced by `~`.
    KeyName,
}

/// A value matched by a query, with its location in the query argument.
#[derive(Debug, Clone)]
pub struct Node<'v> {
    pub value: Cow<'v, Value>,
    /// The object or array containing this value, `None` for the root.
    pub parent: Option<&'v Value>,
    pub location: Location,
    pub via: Via,
    /// Position within the result batch.
    pub index: usize,
    /// Index in the containing source array, or the ordinal of an object
    /// member.
    pub original_index: usize,
    pub position: Option<Span>,
}

impl<'v> Node<'v> {
    pub fn root(value: &'v Value) -> Self {
        Node {
            value: Cow::Borrowed(value),
            parent: None,
            location: Vec::new(),
            via: Via::Root,
            index: 0,
            original_index: 0,
            position: None,
        }
    }

    pub fn new_object_member(
        &self,
        container: &'v Value,
        name: &str,
        value: &'v Value,
        ordinal: usize,
    ) -> Self {
        let mut location = self.location.clone();
        location.push(PathElement::Name(name.to_owned()));
        Node {
            value: Cow::Borrowed(value),
            parent: Some(container),
            location,
            via: Via::Member,
            index: 0,
            original_index: ordinal,
            position: None,
        }
    }

    pub fn new_array_element(&self, container: &'v Value, value: &'v Value, index: usize) -> Self {
        let mut location = self.location.clone();
        location.push(PathElement::Index(index));
        Node {
            value: Cow::Borrowed(value),
            parent: Some(container),
            location,
            via: Via::Element,
            index: 0,
            original_index: index,
            position: None,
        }
    }

    /// A node holding the key by which this node was reached. `None` for the
    /// root, which has no key.
    pub fn new_key_name(&self) -> Option<Self> {
        let key = self.location.last()?.to_key();
        Some(Node {
            value: Cow::Owned(key),
            parent: self.parent,
            location: self.location.clone(),
            via: Via::KeyName,
            index: self.index,
            original_index: self.original_index,
            position: None,
        })
    }

    /// The matched value, if it is borrowed from the query argument. Only
    /// borrowed values have children.
    pub fn borrowed(&self) -> Option<&'v Value> {
        match self.value {
            Cow::Borrowed(value) => Some(value),
            Cow::Owned(_) => None,
        }
    }

    /// The key by which `parent` reaches this node.
    pub fn parent_property(&self) -> Option<&PathElement> {
        self.location.last()
    }

    /// The location of this node as a path, using shorthand names where
    /// possible. Key name nodes end with `~`.
    pub fn path(&self) -> String {
        let mut path = String::from("$");
        for element in &self.location {
            let _ = write!(path, "{}", element);
        }
        if self.via == Via::KeyName {
            path.push('~');
        }
        path
    }

    /// The location of this node in bracket notation, like `$['a'][0]`.
    pub fn bracket_path(&self) -> String {
        bracket_path(&self.location, self.via == Via::KeyName)
    }
}

pub fn bracket_path(location: &[PathElement], key_name: bool) -> String {
    let mut path = String::from("$");
    for element in location {
        let _ = element.write_bracketed(&mut path);
    }
    if key_name {
        path.push('~');
    }
    path
}

/// An owned, serializable view of a [`Node`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub path: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_property: Option<Value>,
    pub index: usize,
    pub original_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Span>,
}

impl<'v> From<&Node<'v>> for Match {
    fn from(node: &Node<'v>) -> Self {
        Match {
            path: node.path(),
            value: node.value.clone().into_owned(),
            parent_property: node.parent_property().map(PathElement::to_key),
            index: node.index,
            original_index: node.original_index,
            position: node.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at(value: &Value, location: Location) -> Node<'_> {
        let mut node = Node::root(value);
        node.location = location;
        node
    }

    #[test]
    fn normalized_path_names() {
        let value = Value::Bool(true);
        let node = node_at(
            &value,
            vec![
                PathElement::Name(String::from("a")),
                PathElement::Name(String::from("b")),
                PathElement::Name(String::from("c")),
            ],
        );

        assert_eq!(node.path(), "$.a.b.c");
        assert_eq!(node.bracket_path(), "$['a']['b']['c']");
    }

    #[test]
    fn normalized_path_indices() {
        let value = Value::Bool(true);
        let node = node_at(
            &value,
            vec![
                PathElement::Index(1),
                PathElement::Index(2),
                PathElement::Index(3),
            ],
        );

        assert_eq!(node.path(), "$[1][2][3]");
    }

    #[test]
    fn normalized_path_mixed() {
        let value = Value::Bool(true);
        let node = node_at(
            &value,
            vec![
                PathElement::Name(String::from("a")),
                PathElement::Index(2),
                PathElement::Name(String::from("first name")),
            ],
        );

        assert_eq!(node.path(), "$.a[2]['first name']");
        assert_eq!(node.bracket_path(), "$['a'][2]['first name']");
    }

    #[test]
    fn normalized_path_root() {
        let value = Value::Bool(true);
        let node = Node::root(&value);
        assert_eq!(node.path(), "$");
        assert!(node.parent_property().is_none());
    }

    #[test]
    fn names_needing_quotes() {
        let value = Value::Null;
        let node = node_at(
            &value,
            vec![
                PathElement::Name(String::from("0")),
                PathElement::Name(String::from("it's")),
                PathElement::Name(String::from("a.b")),
            ],
        );

        assert_eq!(node.path(), r"$['0']['it\'s']['a.b']");
    }

    #[test]
    fn key_name_node() {
        let value = serde_json::json!({"a": {"x": 1}});
        let root = Node::root(&value);
        let a = root.new_object_member(&value, "a", &value["a"], 0);
        let x = a.new_object_member(&value["a"], "x", &value["a"]["x"], 0);
        let key = x.new_key_name().unwrap();

        assert_eq!(key.value.as_ref(), &Value::String(String::from("x")));
        assert_eq!(key.path(), "$.a.x~");
        assert_eq!(key.via, Via::KeyName);
        assert!(key.borrowed().is_none());
        assert!(root.new_key_name().is_none());

        let list = serde_json::json!(["p", "q"]);
        let list_root = Node::root(&list);
        let q = list_root.new_array_element(&list, &list[1], 1);
        let key = q.new_key_name().unwrap();
        assert_eq!(key.value.as_ref(), &Value::String(String::from("1")));
        assert_eq!(key.path(), "$[1]~");
    }

    #[test]
    fn match_from_node() {
        let value = serde_json::json!([10, 20]);
        let root = Node::root(&value);
        let second = root.new_array_element(&value, &value[1], 1);
        let m = Match::from(&second);

        assert_eq!(m.path, "$[1]");
        assert_eq!(m.value, serde_json::json!(20));
        assert_eq!(m.parent_property, Some(serde_json::json!("1")));
        assert_eq!(m.original_index, 1);
        assert_eq!(
            serde_json::to_string(&m).unwrap(),
            r#"{"path":"$[1]","value":20,"parent_property":"1","index":0,"original_index":1}"#
        );
    }
}
