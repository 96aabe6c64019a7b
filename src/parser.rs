use std::{iter::Peekable, vec::IntoIter};

use log::debug;

use crate::{
    ast::{
        Accessor, AstNode, ComparisonOperator, FilterExpression, LogicalOperator, NodeKind,
        PathBase,
    },
    errors::JSONPathError,
    lexer::lex,
    query::Query,
    standard_functions::js_regex,
    token::{Token, TokenType, EOQ},
};

use TokenType::*;

const EOQ_TOKEN: Token = Token {
    kind: Eoq,
    span: (0, 0),
};

type Tokens = Peekable<IntoIter<Token>>;

const PRECEDENCE_LOWEST: u8 = 1;
const PRECEDENCE_LOGICAL_OR: u8 = 3;
const PRECEDENCE_LOGICAL_AND: u8 = 4;
const PRECEDENCE_RELATIONAL: u8 = 5;
const PRECEDENCE_LOGICAL_NOT: u8 = 7;

/// Compiles path text into a [`Query`].
///
/// Path segments are recognized directly from the path text. The predicate of
/// each `[?( … )]` segment is tokenized by the filter lexer and parsed with a
/// Pratt parser.
#[derive(Debug, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Parser
    }

    pub fn parse(&self, expr: &str) -> Result<Query, JSONPathError> {
        let offset = expr.len() - expr.trim_start().len();
        let path = expr.trim();

        match path.chars().next() {
            Some('$') => (),
            Some(ch) => {
                return Err(JSONPathError::syntax(
                    format!("expected '$', found '{}'", ch),
                    offset,
                ))
            }
            None => {
                return Err(JSONPathError::syntax(
                    String::from("expected '$', found end of path"),
                    offset,
                ))
            }
        }

        let segments = self.parse_segments(&path[1..], offset + 1)?;
        Ok(Query { segments })
    }

    fn parse_segments(&self, path: &str, offset: usize) -> Result<Vec<AstNode>, JSONPathError> {
        let mut segments = Vec::new();
        let mut pos = 0;

        while pos < path.len() {
            let rest = &path[pos..];
            let (segment, consumed) = match rest.chars().next().unwrap_or(EOQ) {
                '.' => self.parse_dot_segment(rest, offset + pos)?,
                '[' => self.parse_bracket_segments(rest, offset + pos)?,
                ch => {
                    return Err(JSONPathError::syntax(
                        format!("unexpected character '{}'", ch),
                        offset + pos,
                    ))
                }
            };
            segments.push(segment);
            pos += consumed;
        }

        Ok(segments)
    }

    /// Parse `.name`, `.*` or `..` starting at `path`. Recursive descent
    /// consumes the remainder of the path as its target.
    fn parse_dot_segment(
        &self,
        path: &str,
        offset: usize,
    ) -> Result<(AstNode, usize), JSONPathError> {
        if let Some(rest) = path.strip_prefix("..") {
            let mut target = Vec::new();

            if rest.is_empty() {
                target.push(AstNode::new(NodeKind::Wildcard));
            } else if rest.starts_with('.') || rest.starts_with('[') {
                target = self.parse_segments(rest, offset + 2)?;
            } else if !rest.is_empty() {
                let (first, consumed) = self.parse_member(rest, offset + 2)?;
                target.push(first);
                target.extend(self.parse_segments(&rest[consumed..], offset + 2 + consumed)?);
            }

            return Ok((
                AstNode::with_children(NodeKind::Recursive, target),
                path.len(),
            ));
        }

        let (node, consumed) = self.parse_member(&path[1..], offset + 1)?;
        Ok((node, consumed + 1))
    }

    /// Parse a wildcard or member name following a dot, plus any trailing
    /// `~` or `^` operators.
    fn parse_member(&self, path: &str, offset: usize) -> Result<(AstNode, usize), JSONPathError> {
        let (node, consumed) = if path.starts_with('*') {
            (AstNode::new(NodeKind::Wildcard), 1)
        } else {
            let end = path
                .find(|ch| matches!(ch, '.' | '[' | '~' | '^'))
                .unwrap_or(path.len());

            if end == 0 {
                return Err(JSONPathError::syntax(
                    String::from("empty property name"),
                    offset,
                ));
            }

            (
                AstNode::new(NodeKind::Property {
                    name: path[..end].to_string(),
                }),
                end,
            )
        };

        Ok(wrap_suffixes(node, path, consumed))
    }

    /// Parse one or more consecutive bracketed segments. Two or more collapse
    /// into a chain.
    fn parse_bracket_segments(
        &self,
        path: &str,
        offset: usize,
    ) -> Result<(AstNode, usize), JSONPathError> {
        let mut members = Vec::new();
        let mut pos = 0;

        while path[pos..].starts_with('[') {
            let end = find_closing_bracket(&path[pos..]).ok_or_else(|| {
                JSONPathError::syntax(String::from("unmatched bracket"), offset + pos)
            })?;

            let content = &path[pos + 1..pos + end];
            members.push(self.parse_bracket_content(content, offset + pos + 1)?);
            pos += end + 1;
        }

        let node = if members.len() == 1 {
            members.remove(0)
        } else {
            AstNode::with_children(NodeKind::Chain, members)
        };

        let (node, consumed) = wrap_suffixes(node, path, pos);
        Ok((node, consumed))
    }

    fn parse_bracket_content(&self, content: &str, offset: usize) -> Result<AstNode, JSONPathError> {
        let offset = offset + content.len() - content.trim_start().len();
        let content = content.trim();

        if content.is_empty() {
            return Err(JSONPathError::syntax(
                String::from("empty bracket content"),
                offset,
            ));
        }

        if content == "*" {
            return Ok(AstNode::new(NodeKind::IndexWildcard));
        }

        if let Some(source) = content.strip_prefix('?') {
            let source = source.trim();
            return Ok(AstNode::new(NodeKind::Filter {
                source: source.to_string(),
                expression: self.compile_filter(source),
            }));
        }

        if let Some(name) = unquote(content, offset)? {
            // An unescaped operator inside the quotes still applies to the name.
            let raw = &content[1..content.len() - 1];
            return Ok(if raw.ends_with('~') {
                let name = name.strip_suffix('~').unwrap_or(&name);
                AstNode::wrap(NodeKind::PropertyNames, property(name))
            } else if raw.ends_with('^') {
                let name = name.strip_suffix('^').unwrap_or(&name);
                AstNode::wrap(NodeKind::Parent, property(name))
            } else {
                property(&name)
            });
        }

        if let Some(inner) = content.strip_suffix('~') {
            let node = self.parse_bracket_content(inner, offset)?;
            return Ok(AstNode::wrap(NodeKind::PropertyNames, node));
        }

        if let Some(inner) = content.strip_suffix('^') {
            let node = self.parse_bracket_content(inner, offset)?;
            return Ok(AstNode::wrap(NodeKind::Parent, node));
        }

        let parts = split_top_level(content, ',');
        if parts.len() > 1 {
            let members = parts
                .into_iter()
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| self.parse_union_member(part, offset))
                .collect::<Result<Vec<_>, _>>()?;

            if members.is_empty() {
                return Err(JSONPathError::syntax(
                    String::from("empty bracket content"),
                    offset,
                ));
            }

            return Ok(AstNode::with_children(NodeKind::Union, members));
        }

        if content.contains(':') {
            return parse_slice(content, offset);
        }

        if is_integer(content) {
            return parse_index(content, offset);
        }

        Ok(property(content))
    }

    fn parse_union_member(&self, member: &str, offset: usize) -> Result<AstNode, JSONPathError> {
        if let Some(name) = unquote(member, offset)? {
            Ok(property(&name))
        } else if member == "*" {
            Ok(AstNode::new(NodeKind::IndexWildcard))
        } else if member.contains(':') {
            parse_slice(member, offset)
        } else if is_integer(member) {
            parse_index(member, offset)
        } else {
            Ok(property(member))
        }
    }

    /// Compile predicate text. A predicate that fails to compile yields `None`
    /// and a filter that never matches.
    fn compile_filter(&self, source: &str) -> Option<Box<FilterExpression>> {
        match self.parse_filter(source) {
            Ok(expression) => Some(Box::new(expression)),
            Err(err) => {
                debug!("malformed filter predicate '{}': {}", source, err);
                None
            }
        }
    }

    /// Parse the text of a filter predicate into a [`FilterExpression`].
    pub fn parse_filter(&self, source: &str) -> Result<FilterExpression, JSONPathError> {
        // `[?()]` tests the current value
        if source
            .chars()
            .all(|ch| ch == '(' || ch == ')' || ch.is_whitespace())
            && source.matches('(').count() == source.matches(')').count()
        {
            return Ok(FilterExpression::Path {
                base: PathBase::Current,
                accessors: Vec::new(),
            });
        }

        let mut it = lex(source)?.into_iter().peekable();
        let expr = self.parse_filter_expression(&mut it, PRECEDENCE_LOWEST)?;

        match it.next() {
            Some(Token { kind: Eoq, .. }) | None => Ok(expr),
            Some(token) => Err(JSONPathError::syntax(
                format!("expected end of expression, found {}", token.kind),
                token.span.0,
            )),
        }
    }

    fn parse_not_expression(&self, it: &mut Tokens) -> Result<FilterExpression, JSONPathError> {
        it.next(); // eat `!`
        let expr = self.parse_filter_expression(it, PRECEDENCE_LOGICAL_NOT)?;
        Ok(FilterExpression::Not {
            expression: Box::new(expr),
        })
    }

    fn parse_infix_expression(
        &self,
        it: &mut Tokens,
        left: FilterExpression,
    ) -> Result<FilterExpression, JSONPathError> {
        let token = it.next().unwrap_or(EOQ_TOKEN);
        let precedence = self.precedence(&token.kind);
        let right = self.parse_filter_expression(it, precedence)?;

        let operator = match token.kind {
            And | Or => {
                let operator = if token.kind == And {
                    LogicalOperator::And
                } else {
                    LogicalOperator::Or
                };
                return Ok(FilterExpression::Logical {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                });
            }
            Eq => ComparisonOperator::Eq,
            StrictEq => ComparisonOperator::StrictEq,
            Ne => ComparisonOperator::Ne,
            StrictNe => ComparisonOperator::StrictNe,
            Ge => ComparisonOperator::Ge,
            Gt => ComparisonOperator::Gt,
            Le => ComparisonOperator::Le,
            Lt => ComparisonOperator::Lt,
            _ => {
                return Err(JSONPathError::syntax(
                    format!("unexpected infix operator {}", token.kind),
                    token.span.0,
                ))
            }
        };

        Ok(FilterExpression::Comparison {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&self, it: &mut Tokens) -> Result<FilterExpression, JSONPathError> {
        it.next(); // eat open paren
        let mut expr = self.parse_filter_expression(it, PRECEDENCE_LOWEST)?;

        loop {
            match it.peek().unwrap_or(&EOQ_TOKEN) {
                Token { kind: Eoq, span } => {
                    return Err(JSONPathError::syntax(
                        String::from("unbalanced parentheses"),
                        span.0,
                    ));
                }
                Token { kind: RParen, .. } => break,
                _ => expr = self.parse_infix_expression(it, expr)?,
            }
        }

        it.next(); // eat closing paren
        Ok(expr)
    }

    fn parse_basic_expression(&self, it: &mut Tokens) -> Result<FilterExpression, JSONPathError> {
        match it.peek().unwrap_or(&EOQ_TOKEN) {
            Token {
                kind: DoubleQuoteString { value } | SingleQuoteString { value },
                span,
            } => {
                let value = unescape_string(value, span.0)?;
                it.next();
                Ok(FilterExpression::String { value })
            }
            Token { kind: False, .. } => {
                it.next();
                Ok(FilterExpression::False)
            }
            Token {
                kind: Float { value },
                span,
            } => {
                let f = value.parse::<f64>().map_err(|_| {
                    JSONPathError::syntax(String::from("invalid float literal"), span.0)
                })?;
                it.next();
                Ok(FilterExpression::Float { value: f })
            }
            Token {
                kind: Int { value },
                span,
            } => {
                let expr = match value.parse::<i64>() {
                    Ok(i) => FilterExpression::Int { value: i },
                    Err(_) => FilterExpression::Float {
                        value: value.parse::<f64>().map_err(|_| {
                            JSONPathError::syntax(String::from("invalid int literal"), span.0)
                        })?,
                    },
                };
                it.next();
                Ok(expr)
            }
            Token { kind: Null, .. } => {
                it.next();
                Ok(FilterExpression::Null)
            }
            Token { kind: True, .. } => {
                it.next();
                Ok(FilterExpression::True)
            }
            Token {
                kind: Regex { pattern, flags },
                span,
            } => {
                let regex = js_regex(pattern, flags).map_err(|err| {
                    JSONPathError::syntax(format!("invalid regular expression: {}", err), span.0)
                })?;
                let expr = FilterExpression::Regex {
                    pattern: pattern.to_string(),
                    flags: flags.to_string(),
                    regex,
                };
                it.next();
                Ok(expr)
            }
            Token {
                kind: Root | Current | Keyword { .. },
                ..
            } => self.parse_path(it),
            Token { kind: LParen, .. } => self.parse_grouped_expression(it),
            Token { kind: Not, .. } => self.parse_not_expression(it),
            Token { kind, span } => Err(JSONPathError::syntax(
                format!("unexpected basic expression token {}", kind),
                span.0,
            )),
        }
    }

    fn parse_path(&self, it: &mut Tokens) -> Result<FilterExpression, JSONPathError> {
        let token = it.next().unwrap_or(EOQ_TOKEN);
        let base = match &token.kind {
            Root => PathBase::Root,
            Current => PathBase::Current,
            Keyword { name } => match name.as_ref() {
                "property" => PathBase::Property,
                "parentProperty" => PathBase::ParentProperty,
                "parent" => PathBase::Parent,
                "path" => PathBase::Path,
                "root" => PathBase::Root,
                _ => {
                    return Err(JSONPathError::syntax(
                        format!("unknown context variable '@{}'", name),
                        token.span.0,
                    ))
                }
            },
            kind => {
                return Err(JSONPathError::syntax(
                    format!("expected a path, found {}", kind),
                    token.span.0,
                ))
            }
        };

        let mut accessors = Vec::new();

        loop {
            match it.peek().unwrap_or(&EOQ_TOKEN) {
                Token {
                    kind: Name { value },
                    ..
                } => {
                    accessors.push(Accessor::Name {
                        name: value.to_string(),
                    });
                    it.next();
                }
                Token { kind: Wild, .. } => {
                    accessors.push(Accessor::Wild);
                    it.next();
                }
                Token {
                    kind: Method { name },
                    ..
                } => {
                    let name = name.to_string();
                    it.next();
                    let args = self.parse_method_arguments(it)?;
                    accessors.push(Accessor::Method { name, args });
                }
                Token { kind: LBracket, .. } => {
                    it.next();
                    accessors.push(self.parse_bracketed_accessor(it)?);
                }
                _ => break,
            }
        }

        Ok(FilterExpression::Path { base, accessors })
    }

    fn parse_bracketed_accessor(&self, it: &mut Tokens) -> Result<Accessor, JSONPathError> {
        let token = it.next().unwrap_or(EOQ_TOKEN);
        let accessor = match &token.kind {
            Index { value } => Accessor::Index {
                index: value.parse::<i64>().map_err(|_| {
                    JSONPathError::syntax(format!("invalid index '{}'", value), token.span.0)
                })?,
            },
            SingleQuoteString { value } | DoubleQuoteString { value } => Accessor::Name {
                name: unescape_string(value, token.span.0)?,
            },
            Wild => Accessor::Wild,
            Filter => Accessor::Filter {
                expression: Box::new(self.parse_filter_expression(it, PRECEDENCE_LOWEST)?),
            },
            kind => {
                return Err(JSONPathError::syntax(
                    format!("unexpected {} in bracket", kind),
                    token.span.0,
                ))
            }
        };

        match it.next().unwrap_or(EOQ_TOKEN) {
            Token { kind: RBracket, .. } => Ok(accessor),
            token => Err(JSONPathError::syntax(
                format!("expected ']', found {}", token.kind),
                token.span.0,
            )),
        }
    }

    fn parse_method_arguments(
        &self,
        it: &mut Tokens,
    ) -> Result<Vec<FilterExpression>, JSONPathError> {
        let mut arguments: Vec<FilterExpression> = Vec::new();

        loop {
            match it.peek().unwrap_or(&EOQ_TOKEN) {
                Token { kind: RParen, .. } => {
                    it.next(); // eat closing paren
                    return Ok(arguments);
                }
                Token { kind: Eoq, span } => {
                    return Err(JSONPathError::syntax(
                        String::from("unclosed method call"),
                        span.0,
                    ))
                }
                _ => (),
            }

            arguments.push(self.parse_filter_expression(it, PRECEDENCE_LOWEST)?);

            match it.peek().unwrap_or(&EOQ_TOKEN) {
                Token { kind: Comma, .. } => {
                    it.next(); // eat comma
                }
                Token { kind: RParen, .. } => (),
                Token { kind, span } => {
                    return Err(JSONPathError::syntax(
                        format!("expected ',' or ')', found {}", kind),
                        span.0,
                    ))
                }
            }
        }
    }

    fn parse_filter_expression(
        &self,
        it: &mut Tokens,
        precedence: u8,
    ) -> Result<FilterExpression, JSONPathError> {
        let mut left = self.parse_basic_expression(it)?;

        loop {
            let peek_kind = &it.peek().unwrap_or(&EOQ_TOKEN).kind;
            if matches!(peek_kind, Eoq | RBracket)
                || self.precedence(peek_kind) < precedence
                || !matches!(
                    peek_kind,
                    Eq | StrictEq | Ne | StrictNe | Ge | Gt | Le | Lt | And | Or
                )
            {
                break;
            }

            left = self.parse_infix_expression(it, left)?;
        }

        Ok(left)
    }

    fn precedence(&self, kind: &TokenType) -> u8 {
        match kind {
            And => PRECEDENCE_LOGICAL_AND,
            Eq | StrictEq | Ne | StrictNe | Ge | Gt | Le | Lt => PRECEDENCE_RELATIONAL,
            Or => PRECEDENCE_LOGICAL_OR,
            _ => PRECEDENCE_LOWEST,
        }
    }
}

fn property(name: &str) -> AstNode {
    AstNode::new(NodeKind::Property {
        name: name.to_string(),
    })
}

/// Wrap `node` for each `~` or `^` found at `path[consumed..]`.
fn wrap_suffixes(mut node: AstNode, path: &str, mut consumed: usize) -> (AstNode, usize) {
    loop {
        match path[consumed..].chars().next() {
            Some('~') => node = AstNode::wrap(NodeKind::PropertyNames, node),
            Some('^') => node = AstNode::wrap(NodeKind::Parent, node),
            _ => return (node, consumed),
        }
        consumed += 1;
    }
}

/// Find the `]` matching the `[` at the start of `path`, skipping brackets
/// inside quoted strings and regex literals.
fn find_closing_bracket(path: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut regex = false;
    let mut class = false;
    let mut escaped = false;
    let mut prev: Option<char> = None;

    for (i, ch) in path.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        if regex {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if class {
                class = ch != ']';
            } else if ch == '[' {
                class = true;
            } else if ch == '/' {
                regex = false;
                prev = Some(ch);
            }
            continue;
        }

        match ch {
            '\'' | '"' => quote = Some(ch),
            // A slash opens a regex literal only where an operand can start.
            '/' if matches!(prev, Some('(' | ',' | '=' | '!' | '<' | '>' | '&' | '|')) => {
                regex = true
            }
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => (),
        }

        if !ch.is_whitespace() {
            prev = Some(ch);
        }
    }

    None
}

/// Split `content` on `sep` where it is not inside quotes, brackets or
/// parentheses.
fn split_top_level(content: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in content.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' => quote = Some(ch),
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            _ if ch == sep && depth == 0 => {
                parts.push(&content[start..i]);
                start = i + ch.len_utf8();
            }
            _ => (),
        }
    }

    parts.push(&content[start..]);
    parts
}

/// If `content` is exactly one quoted string, return its unescaped value.
fn unquote(content: &str, offset: usize) -> Result<Option<String>, JSONPathError> {
    let quote = match content.chars().next() {
        Some(q @ ('\'' | '"')) => q,
        _ => return Ok(None),
    };

    let mut escaped = false;
    for (i, ch) in content.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            if i + ch.len_utf8() == content.len() {
                return unescape_string(&content[1..i], offset + 1).map(Some);
            }
            return Ok(None);
        }
    }

    Ok(None)
}

fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}

fn parse_index(s: &str, offset: usize) -> Result<AstNode, JSONPathError> {
    let index = s
        .parse::<i64>()
        .map_err(|_| JSONPathError::syntax(format!("index out of range '{}'", s), offset))?;
    Ok(AstNode::new(NodeKind::Index { index }))
}

fn parse_slice(s: &str, offset: usize) -> Result<AstNode, JSONPathError> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();

    if parts.len() > 3 {
        return Err(JSONPathError::syntax(
            format!("too many colons in slice '{}'", s),
            offset,
        ));
    }

    let bound = |part: Option<&&str>| -> Result<Option<i64>, JSONPathError> {
        match part {
            None => Ok(None),
            Some(p) if p.is_empty() => Ok(None),
            Some(p) if is_integer(p) => p.parse::<i64>().map(Some).map_err(|_| {
                JSONPathError::syntax(format!("slice bound out of range '{}'", p), offset)
            }),
            Some(p) => Err(JSONPathError::syntax(
                format!("invalid slice bound '{}'", p),
                offset,
            )),
        }
    };

    Ok(AstNode::new(NodeKind::Slice {
        start: bound(parts.first())?,
        end: bound(parts.get(1))?,
        step: bound(parts.get(2))?,
    }))
}

/// Replace escape sequences in a quoted name or string literal.
///
/// Unknown escapes stand for the escaped character itself.
pub fn unescape_string(value: &str, token_index: usize) -> Result<String, JSONPathError> {
    let chars = value.chars().collect::<Vec<char>>();
    let length = chars.len();
    let mut rv = String::new();
    let mut index: usize = 0;

    while index < length {
        let start_index = token_index + index; // for error reporting

        match chars[index] {
            '\\' => {
                if index + 1 >= length {
                    return Err(JSONPathError::syntax(
                        String::from("invalid escape"),
                        start_index,
                    ));
                }

                index += 1;

                match chars[index] {
                    'b' => rv.push('\x08'),
                    'f' => rv.push('\x0C'),
                    'n' => rv.push('\n'),
                    'r' => rv.push('\r'),
                    't' => rv.push('\t'),
                    'u' => {
                        let (unescaped, consumed) = decode_hex_escape(&chars[index + 1..])
                            .ok_or_else(|| {
                                JSONPathError::syntax(
                                    String::from("invalid \\uXXXX escape"),
                                    start_index,
                                )
                            })?;
                        rv.push(unescaped);
                        index += consumed;
                    }
                    ch => rv.push(ch),
                }
            }
            c => rv.push(c),
        }

        index += 1;
    }

    Ok(rv)
}

/// Decode the digits of a `\uXXXX` escape, and a following low surrogate if
/// there is one. Returns the character and the number of chars consumed.
fn decode_hex_escape(chars: &[char]) -> Option<(char, usize)> {
    let hex = |digits: &[char]| -> Option<u32> {
        if digits.len() != 4 {
            return None;
        }
        u32::from_str_radix(&digits.iter().collect::<String>(), 16).ok()
    };

    let codepoint = hex(chars.get(..4)?)?;

    if (0xD800..=0xDBFF).contains(&codepoint) {
        if chars.get(4..6) == Some(&['\\', 'u'][..]) {
            let low_surrogate = hex(chars.get(6..10)?)?;
            let codepoint = 0x10000 + (((codepoint & 0x03FF) << 10) | (low_surrogate & 0x03FF));
            return char::from_u32(codepoint).map(|ch| (ch, 10));
        }
        return None;
    }

    char::from_u32(codepoint).map(|ch| (ch, 4))
}
