//! Recover the byte span of a matched node in the JSON text it was decoded
//! from.
//!
//! Object members map to the span of their quoted key, array elements and
//! the root to the span of the value itself. Mapping is best effort: text
//! that does not describe the node's location yields `None`.

use serde::Serialize;

use crate::node::{Node, NodeList, PathElement};

/// A byte range in source text. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub length: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span {
            start,
            end,
            length: end - start,
        }
    }
}

/// Find the span of `node` in `text`.
pub fn locate(node: &Node, text: &str) -> Option<Span> {
    locate_path(&node.location, text)
}

/// Set the position of every node in `nodes`.
pub fn locate_all(nodes: &mut NodeList, text: &str) {
    for node in nodes.iter_mut() {
        node.position = locate(node, text);
    }
}

/// Find the span of the value at `location`, or of its member key when the
/// last element is a name.
pub fn locate_path(location: &[PathElement], text: &str) -> Option<Span> {
    let mut scanner = Scanner::new(text);
    scanner.skip_whitespace();
    let mut key_span = None;

    for element in location {
        match element {
            PathElement::Name(name) => {
                let (span, value_start) = scanner.find_member(name)?;
                key_span = Some(span);
                scanner.pos = value_start;
            }
            PathElement::Index(index) => {
                scanner.pos = scanner.find_element(*index)?;
                key_span = None;
            }
        }
    }

    match key_span {
        Some(span) => Some(span),
        None => {
            let start = scanner.pos;
            scanner.skip_value()?;
            Some(Span::new(start, scanner.pos))
        }
    }
}

struct Scanner<'t> {
    text: &'t str,
    bytes: &'t [u8],
    pos: usize,
}

impl<'t> Scanner<'t> {
    fn new(text: &'t str) -> Self {
        Scanner {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        if self.peek()? == byte {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn skip_value(&mut self) -> Option<()> {
        match self.peek()? {
            b'"' => self.skip_string(),
            b'{' => self.skip_container(b'}'),
            b'[' => self.skip_container(b']'),
            _ => self.skip_primitive(),
        }
    }

    fn skip_string(&mut self) -> Option<()> {
        self.expect(b'"')?;
        loop {
            match self.peek()? {
                b'\\' => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return Some(());
                }
                _ => self.pos += 1,
            }
        }
    }

    fn skip_container(&mut self, close: u8) -> Option<()> {
        self.pos += 1;
        let mut depth = 1;
        while depth > 0 {
            match self.peek()? {
                b'"' => {
                    self.skip_string()?;
                    continue;
                }
                b'{' | b'[' => depth += 1,
                b'}' | b']' => depth -= 1,
                _ => (),
            }
            self.pos += 1;
        }
        if self.bytes[self.pos - 1] == close {
            Some(())
        } else {
            None
        }
    }

    fn skip_primitive(&mut self) -> Option<()> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') {
                break;
            }
            self.pos += 1;
        }
        if self.pos > start {
            Some(())
        } else {
            None
        }
    }

    /// Read a quoted key, returning its decoded text and span.
    fn read_key(&mut self) -> Option<(String, Span)> {
        let start = self.pos;
        self.skip_string()?;
        let raw = self.text.get(start..self.pos)?;
        let key = serde_json::from_str::<String>(raw).ok()?;
        Some((key, Span::new(start, self.pos)))
    }

    /// Scan the object at the current position for member `name`. Returns
    /// the key span and the offset of the member's value. The last of
    /// duplicate keys wins, as when decoding.
    fn find_member(&mut self, name: &str) -> Option<(Span, usize)> {
        self.expect(b'{')?;
        let mut found = None;

        loop {
            self.skip_whitespace();
            if self.peek()? == b'}' {
                return found;
            }

            let (key, span) = self.read_key()?;
            self.skip_whitespace();
            self.expect(b':')?;
            self.skip_whitespace();
            if key == name {
                found = Some((span, self.pos));
            }
            self.skip_value()?;
            self.skip_whitespace();

            match self.peek()? {
                b',' => self.pos += 1,
                b'}' => return found,
                _ => return None,
            }
        }
    }

    /// Scan the array at the current position for the start of element
    /// `index`.
    fn find_element(&mut self, index: usize) -> Option<usize> {
        self.expect(b'[')?;
        let mut i = 0;

        loop {
            self.skip_whitespace();
            if self.peek()? == b']' {
                return None;
            }
            if i == index {
                return Some(self.pos);
            }

            self.skip_value()?;
            self.skip_whitespace();

            match self.peek()? {
                b',' => self.pos += 1,
                _ => return None,
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> PathElement {
        PathElement::Name(s.to_owned())
    }

    fn snippet<'t>(text: &'t str, span: &Span) -> &'t str {
        &text[span.start..span.end]
    }

    #[test]
    fn root_spans_whole_value() {
        let text = "  {\"a\": 1}  ";
        let span = locate_path(&[], text).unwrap();
        assert_eq!(span, Span::new(2, 10));
        assert_eq!(snippet(text, &span), "{\"a\": 1}");
    }

    #[test]
    fn member_spans_key() {
        let text = r#"{"id":123,"name":"test"}"#;
        let span = locate_path(&[name("id")], text).unwrap();
        assert_eq!(span.start, 1);
        assert_eq!(span.length, 4);

        let span = locate_path(&[name("name")], text).unwrap();
        assert_eq!(span.start, 10);
        assert_eq!(snippet(text, &span), "\"name\"");
    }

    #[test]
    fn element_spans_value() {
        let text = r#"[1, "two", {"x": [3]}, null]"#;
        let span = locate_path(&[PathElement::Index(2)], text).unwrap();
        assert_eq!(snippet(text, &span), r#"{"x": [3]}"#);

        let span = locate_path(&[PathElement::Index(3)], text).unwrap();
        assert_eq!(snippet(text, &span), "null");

        assert!(locate_path(&[PathElement::Index(4)], text).is_none());
    }

    #[test]
    fn nested_location() {
        let text = r#"{
  "store": {
    "book": [
      {"title": "Sayings", "price": 8.95},
      {"title": "Sword", "price": 12.99}
    ]
  }
}"#;
        let location = vec![
            name("store"),
            name("book"),
            PathElement::Index(1),
            name("price"),
        ];
        let span = locate_path(&location, text).unwrap();
        assert_eq!(snippet(text, &span), "\"price\"");
        assert!(span.start > text.find("Sword").unwrap());
    }

    #[test]
    fn keys_are_decoded() {
        let text = r#"{"a\"b": 1, "c": 2}"#;
        let span = locate_path(&[name("a\"b")], text).unwrap();
        assert_eq!(snippet(text, &span), r#""a\"b""#);

        let span = locate_path(&[name("c")], text).unwrap();
        assert_eq!(snippet(text, &span), r#""c""#);
    }

    #[test]
    fn strings_containing_brackets() {
        let text = r#"{"a": "}]", "b": ["[", "x"]}"#;
        let span = locate_path(&[name("b"), PathElement::Index(1)], text).unwrap();
        assert_eq!(snippet(text, &span), "\"x\"");
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let text = r#"{"a": 1, "a": 2}"#;
        let span = locate_path(&[name("a")], text).unwrap();
        assert_eq!(span.start, 9);
    }

    #[test]
    fn missing_or_malformed() {
        assert!(locate_path(&[name("x")], r#"{"a": 1}"#).is_none());
        assert!(locate_path(&[name("a")], "[1, 2]").is_none());
        assert!(locate_path(&[name("a"), name("b")], r#"{"a": {"b": 1"#).is_none());
        assert!(locate_path(&[], "").is_none());
    }
}
