//! Structs and enums that make up a compiled path.
//!
//! A [`Query`](crate::Query) holds an ordered list of [`AstNode`]s, one per
//! top-level segment. Union and chain nodes hold their members as children,
//! `~` and `^` wrap the node they follow, and recursive descent holds the rest
//! of the path as its target. A filter segment carries its predicate as a tree
//! of [`FilterExpression`]s.

use std::fmt::{self, Write};

use regex::Regex;

use crate::lexer::is_shorthand_name;

#[derive(Debug, Clone)]
pub enum NodeKind {
    Root,
    Property {
        name: String,
    },
    /// `.*`
    Wildcard,
    /// `[*]`
    IndexWildcard,
    Index {
        index: i64,
    },
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    Filter {
        /// Predicate text following `?`, as written.
        source: String,
        /// `None` when the predicate failed to compile. Such a filter never
        /// matches.
        expression: Option<Box<FilterExpression>>,
    },
    Recursive,
    Union,
    Chain,
    PropertyNames,
    Parent,
}

#[derive(Debug, Clone)]
pub struct AstNode {
    pub kind: NodeKind,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn new(kind: NodeKind) -> Self {
        AstNode {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<AstNode>) -> Self {
        AstNode { kind, children }
    }

    /// Wrap `node` in a property-names (`~`) or parent (`^`) node.
    pub fn wrap(kind: NodeKind, node: AstNode) -> Self {
        AstNode {
            kind,
            children: vec![node],
        }
    }

    /// Reports whether this segment can produce more than one result from a
    /// single input node.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Wildcard
                | NodeKind::IndexWildcard
                | NodeKind::Union
                | NodeKind::Slice { .. }
                | NodeKind::Filter { .. }
        )
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, NodeKind::Wildcard | NodeKind::IndexWildcard)
    }

    pub fn is_filter(&self) -> bool {
        matches!(self.kind, NodeKind::Filter { .. })
    }

    /// Render this node as the content of a bracketed segment.
    fn fmt_bracket_content(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Property { name } => write_quoted(f, name),
            NodeKind::IndexWildcard | NodeKind::Wildcard => f.write_char('*'),
            NodeKind::Index { index } => write!(f, "{index}"),
            NodeKind::Slice { start, end, step } => write_slice(f, start, end, step),
            NodeKind::Filter { source, .. } => write!(f, "?{source}"),
            NodeKind::Union => {
                for (i, member) in self.children.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    member.fmt_bracket_content(f)?;
                }
                Ok(())
            }
            NodeKind::PropertyNames => {
                for child in &self.children {
                    child.fmt_bracket_content(f)?;
                }
                f.write_char('~')
            }
            NodeKind::Parent => {
                for child in &self.children {
                    child.fmt_bracket_content(f)?;
                }
                f.write_char('^')
            }
            NodeKind::Root | NodeKind::Recursive | NodeKind::Chain => write!(f, "{self}"),
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Root => f.write_char('$'),
            NodeKind::Property { name } => {
                if is_shorthand_name(name) {
                    write!(f, ".{name}")
                } else {
                    f.write_char('[')?;
                    write_quoted(f, name)?;
                    f.write_char(']')
                }
            }
            NodeKind::Wildcard => f.write_str(".*"),
            NodeKind::Recursive => {
                let target = self
                    .children
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<String>();
                if target.starts_with('.') {
                    write!(f, ".{target}")
                } else {
                    write!(f, "..{target}")
                }
            }
            NodeKind::Chain => {
                for member in &self.children {
                    f.write_char('[')?;
                    member.fmt_bracket_content(f)?;
                    f.write_char(']')?;
                }
                Ok(())
            }
            NodeKind::PropertyNames => {
                for child in &self.children {
                    write!(f, "{child}")?;
                }
                f.write_char('~')
            }
            NodeKind::Parent => {
                for child in &self.children {
                    write!(f, "{child}")?;
                }
                f.write_char('^')
            }
            _ => {
                f.write_char('[')?;
                self.fmt_bracket_content(f)?;
                f.write_char(']')
            }
        }
    }
}

fn write_slice(
    f: &mut fmt::Formatter<'_>,
    start: &Option<i64>,
    end: &Option<i64>,
    step: &Option<i64>,
) -> fmt::Result {
    if let Some(i) = start {
        write!(f, "{i}")?;
    }
    f.write_char(':')?;
    if let Some(i) = end {
        write!(f, "{i}")?;
    }
    if let Some(i) = step {
        write!(f, ":{i}")?;
    }
    Ok(())
}

/// Write `name` as a single quoted string that reads back as the same name.
pub fn write_quoted(f: &mut impl Write, name: &str) -> fmt::Result {
    f.write_char('\'')?;
    for (i, ch) in name.char_indices() {
        match ch {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            // a literal trailing operator would be read back as `~` or `^`
            '~' | '^' if i + 1 == name.len() => write!(f, "\\u{:04x}", ch as u32)?,
            _ => f.write_char(ch)?,
        }
    }
    f.write_char('\'')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("&&"),
            LogicalOperator::Or => f.write_str("||"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    StrictEq,
    Ne,
    StrictNe,
    Ge,
    Gt,
    Le,
    Lt,
}

impl ComparisonOperator {
    pub fn is_negative(&self) -> bool {
        matches!(self, ComparisonOperator::Ne | ComparisonOperator::StrictNe)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOperator::Eq => f.write_str("=="),
            ComparisonOperator::StrictEq => f.write_str("==="),
            ComparisonOperator::Ne => f.write_str("!="),
            ComparisonOperator::StrictNe => f.write_str("!=="),
            ComparisonOperator::Ge => f.write_str(">="),
            ComparisonOperator::Gt => f.write_str(">"),
            ComparisonOperator::Le => f.write_str("<="),
            ComparisonOperator::Lt => f.write_str("<"),
        }
    }
}

/// Where a filter path starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathBase {
    Current,
    Root,
    Property,
    ParentProperty,
    Parent,
    Path,
}

impl PathBase {
    pub fn is_keyword(&self) -> bool {
        !matches!(self, PathBase::Current | PathBase::Root)
    }
}

impl fmt::Display for PathBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathBase::Current => f.write_char('@'),
            PathBase::Root => f.write_char('$'),
            PathBase::Property => f.write_str("@property"),
            PathBase::ParentProperty => f.write_str("@parentProperty"),
            PathBase::Parent => f.write_str("@parent"),
            PathBase::Path => f.write_str("@path"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Accessor {
    Name { name: String },
    Index { index: i64 },
    Wild,
    Filter { expression: Box<FilterExpression> },
    Method {
        name: String,
        args: Vec<FilterExpression>,
    },
}

impl Accessor {
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Accessor::Wild | Accessor::Filter { .. })
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Name { name } => {
                if is_shorthand_name(name) {
                    write!(f, ".{name}")
                } else {
                    f.write_char('[')?;
                    write_quoted(f, name)?;
                    f.write_char(']')
                }
            }
            Accessor::Index { index } => write!(f, "[{index}]"),
            Accessor::Wild => f.write_str("[*]"),
            Accessor::Filter { expression } => write!(f, "[?({expression})]"),
            Accessor::Method { name, args } => write!(
                f,
                ".{}({})",
                name,
                args.iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FilterExpression {
    True,
    False,
    Null,
    String {
        value: String,
    },
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    Regex {
        pattern: String,
        flags: String,
        regex: Regex,
    },
    Not {
        expression: Box<FilterExpression>,
    },
    Logical {
        left: Box<FilterExpression>,
        operator: LogicalOperator,
        right: Box<FilterExpression>,
    },
    Comparison {
        left: Box<FilterExpression>,
        operator: ComparisonOperator,
        right: Box<FilterExpression>,
    },
    Path {
        base: PathBase,
        accessors: Vec<Accessor>,
    },
}

impl FilterExpression {
    /// Reports whether this expression is a path starting at a context keyword.
    pub fn is_keyword(&self) -> bool {
        matches!(self, FilterExpression::Path { base, .. } if base.is_keyword())
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpression::True => f.write_str("true"),
            FilterExpression::False => f.write_str("false"),
            FilterExpression::Null => f.write_str("null"),
            FilterExpression::String { value } => write_quoted(f, value),
            FilterExpression::Int { value } => write!(f, "{value}"),
            FilterExpression::Float { value } => write!(f, "{value}"),
            FilterExpression::Regex { pattern, flags, .. } => write!(f, "/{pattern}/{flags}"),
            FilterExpression::Not { expression } => write!(f, "!{expression}"),
            FilterExpression::Logical {
                left,
                operator,
                right,
            } => write!(f, "({left} {operator} {right})"),
            FilterExpression::Comparison {
                left,
                operator,
                right,
            } => write!(f, "{left} {operator} {right}"),
            FilterExpression::Path { base, accessors } => {
                write!(f, "{base}")?;
                for accessor in accessors {
                    write!(f, "{accessor}")?;
                }
                Ok(())
            }
        }
    }
}
