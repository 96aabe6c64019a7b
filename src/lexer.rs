use crate::{
    errors::JSONPathError,
    token::{Token, TokenType, EOQ},
};

use std::str::CharIndices;

enum State {
    Error,
    EndOfExpression,
    LexExpression,
    LexPath,
    LexInsideBracket,
    LexInsideSingleQuotedString,
    LexInsideDoubleQuotedString,
    LexInsideSingleQuotedBracketString,
    LexInsideDoubleQuotedBracketString,
    LexRegex,
}

/// A filter predicate tokenizer, producing a vector of tokens.
///
/// The lexer sees the text following a `?` in a bracketed path segment,
/// with the surrounding brackets already removed.
struct Lexer<'q> {
    query: &'q str,
    tokens: Vec<Token>,

    chars: CharIndices<'q>,
    start: usize,
    pos: usize,

    filter_depth: u32,
    paren_stack: Vec<u32>,
}

impl<'q> Lexer<'q> {
    fn new(query: &'q str) -> Self {
        Self {
            query,
            tokens: Vec::new(),
            start: 0,
            pos: 0,
            chars: query.char_indices(),
            filter_depth: 0,
            paren_stack: Vec::new(),
        }
    }

    fn run(&mut self) {
        let mut state = State::LexExpression;
        loop {
            match state {
                State::Error | State::EndOfExpression => break,
                State::LexExpression => state = lex_expression(self),
                State::LexPath => state = lex_path(self),
                State::LexInsideBracket => state = lex_inside_bracket(self),
                State::LexInsideSingleQuotedString => {
                    state = lex_string(self, '\'', State::LexExpression)
                }
                State::LexInsideDoubleQuotedString => {
                    state = lex_string(self, '"', State::LexExpression)
                }
                State::LexInsideSingleQuotedBracketString => {
                    state = lex_string(self, '\'', State::LexInsideBracket)
                }
                State::LexInsideDoubleQuotedBracketString => {
                    state = lex_string(self, '"', State::LexInsideBracket)
                }
                State::LexRegex => state = lex_regex(self),
            }
        }
    }

    fn emit(&mut self, t: TokenType) {
        self.tokens.push(Token::new(t, self.start, self.pos));
        self.start = self.pos;
    }

    fn value(&self) -> &str {
        self.query.get(self.start..self.pos).unwrap_or_default()
    }

    fn boxed_value(&self) -> Box<str> {
        self.value().to_string().into_boxed_str()
    }

    fn next(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    fn ignore(&mut self) {
        self.start = self.pos;
    }

    fn peek(&mut self) -> char {
        if let Some((_, ch)) = self.chars.clone().next() {
            ch
        } else {
            EOQ
        }
    }

    fn accept(&mut self, ch: char) -> bool {
        if self.peek() == ch {
            self.next();
            true
        } else {
            false
        }
    }

    fn accept_if(&mut self, pred: impl FnOnce(char) -> bool) -> bool {
        if pred(self.peek()) {
            self.next();
            true
        } else {
            false
        }
    }

    fn accept_run(&mut self, pred: impl Fn(char) -> bool) -> bool {
        let mut accepted = false;
        while pred(self.peek()) {
            self.next();
            accepted = true;
        }
        accepted
    }

    fn ignore_whitespace(&mut self) -> bool {
        if self.accept_run(is_whitespace_char) {
            self.ignore();
            true
        } else {
            false
        }
    }

    fn error(&mut self, msg: String) -> State {
        self.tokens.push(Token::new(
            TokenType::Error {
                msg: msg.into_boxed_str(),
            },
            self.start,
            self.pos,
        ));
        State::Error
    }
}

pub fn tokenize(query: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(query);
    lexer.run();
    lexer.tokens
}

pub fn lex(query: &str) -> Result<Vec<Token>, JSONPathError> {
    let tokens = tokenize(query);

    match tokens.last() {
        Some(Token {
            kind: TokenType::Error { msg },
            span,
        }) => Err(JSONPathError::syntax((*msg).to_string(), span.0)),
        _ => Ok(tokens),
    }
}

fn lex_expression(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    match l.peek() {
        EOQ => {
            if l.filter_depth > 0 {
                l.error(String::from("unclosed nested filter"))
            } else if !l.paren_stack.is_empty() {
                l.error(String::from("unclosed method call"))
            } else {
                l.emit(TokenType::Eoq);
                State::EndOfExpression
            }
        }
        ']' => {
            if l.filter_depth == 0 {
                l.next();
                return l.error(String::from("unexpected ']'"));
            }
            l.filter_depth -= 1;
            l.next();
            l.emit(TokenType::RBracket);
            State::LexPath
        }
        ',' => {
            l.next();
            l.emit(TokenType::Comma);
            State::LexExpression
        }
        '\'' => {
            l.next();
            State::LexInsideSingleQuotedString
        }
        '"' => {
            l.next();
            State::LexInsideDoubleQuotedString
        }
        '/' => {
            l.next();
            l.ignore(); // ignore opening slash
            State::LexRegex
        }
        '(' => {
            l.next();
            l.emit(TokenType::LParen);
            if let Some(i) = l.paren_stack.last_mut() {
                *i += 1;
            }
            State::LexExpression
        }
        ')' => {
            l.next();
            l.emit(TokenType::RParen);
            // A closing method call can be followed by more path accessors.
            match l.paren_stack.last().copied() {
                Some(1) => {
                    l.paren_stack.pop();
                    State::LexPath
                }
                Some(_) => {
                    if let Some(i) = l.paren_stack.last_mut() {
                        *i -= 1;
                    }
                    State::LexExpression
                }
                None => State::LexExpression,
            }
        }
        '$' => {
            l.next();
            l.emit(TokenType::Root);
            State::LexPath
        }
        '@' => {
            l.next();
            if l.accept_if(is_name_first) {
                l.accept_run(is_name_char);
                let name = &l.value()[1..];
                if matches!(
                    name,
                    "property" | "parentProperty" | "parent" | "path" | "root"
                ) {
                    let name = name.to_string().into_boxed_str();
                    l.emit(TokenType::Keyword { name });
                    State::LexPath
                } else {
                    let msg = format!("unknown context variable '@{}'", name);
                    l.error(msg)
                }
            } else {
                l.emit(TokenType::Current);
                State::LexPath
            }
        }
        '!' => {
            l.next();
            if l.accept('=') {
                if l.accept('=') {
                    l.emit(TokenType::StrictNe);
                } else {
                    l.emit(TokenType::Ne);
                }
            } else {
                l.emit(TokenType::Not);
            }
            State::LexExpression
        }
        '=' => {
            l.next();
            if l.accept('=') {
                if l.accept('=') {
                    l.emit(TokenType::StrictEq);
                } else {
                    l.emit(TokenType::Eq);
                }
            } else {
                return l.error(String::from("expected '==', found '='"));
            }
            State::LexExpression
        }
        '<' => {
            l.next();
            if l.accept('=') {
                l.emit(TokenType::Le);
            } else {
                l.emit(TokenType::Lt);
            }
            State::LexExpression
        }
        '>' => {
            l.next();
            if l.accept('=') {
                l.emit(TokenType::Ge);
            } else {
                l.emit(TokenType::Gt);
            }
            State::LexExpression
        }
        '&' => {
            l.next();
            if l.accept('&') {
                l.emit(TokenType::And);
            } else {
                return l.error(String::from("unexpected '&', did you mean '&&'?"));
            }
            State::LexExpression
        }
        '|' => {
            l.next();
            if l.accept('|') {
                l.emit(TokenType::Or);
            } else {
                return l.error(String::from("unexpected '|', did you mean '||'?"));
            }
            State::LexExpression
        }
        '-' => {
            // negative number
            l.next();
            lex_number(l)
        }
        _ => {
            if is_digit(l.peek()) {
                return lex_number(l);
            }

            if l.accept_if(is_name_first) {
                l.accept_run(is_name_char);
                match l.value() {
                    "true" => l.emit(TokenType::True),
                    "false" => l.emit(TokenType::False),
                    "null" => l.emit(TokenType::Null),
                    name => {
                        let msg = format!("unexpected name '{}'", name);
                        return l.error(msg);
                    }
                }
                State::LexExpression
            } else {
                l.next();
                let msg = format!("unexpected filter expression token '{}'", l.value());
                l.error(msg)
            }
        }
    }
}

fn lex_path(l: &mut Lexer) -> State {
    if l.accept('.') {
        l.ignore(); // ignore dot

        if l.accept('*') {
            l.emit(TokenType::Wild);
            State::LexPath
        } else if l.accept_if(is_name_first) {
            l.accept_run(is_name_char);
            if l.peek() == '(' {
                l.emit(TokenType::Method {
                    name: l.boxed_value(),
                });
                l.next();
                l.ignore(); // discard the left paren
                l.paren_stack.push(1);
                State::LexExpression
            } else {
                l.emit(TokenType::Name {
                    value: l.boxed_value(),
                });
                State::LexPath
            }
        } else {
            l.next();
            let msg = format!("unexpected shorthand selector '{}'", l.value());
            l.error(msg)
        }
    } else if l.accept('[') {
        l.emit(TokenType::LBracket);
        State::LexInsideBracket
    } else {
        State::LexExpression
    }
}

fn lex_inside_bracket(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    match l.peek() {
        ']' => {
            l.next();
            l.emit(TokenType::RBracket);
            State::LexPath
        }
        '*' => {
            l.next();
            l.emit(TokenType::Wild);
            State::LexInsideBracket
        }
        '?' => {
            l.next();
            l.emit(TokenType::Filter);
            l.filter_depth += 1;
            State::LexExpression
        }
        '\'' => {
            l.next();
            State::LexInsideSingleQuotedBracketString
        }
        '"' => {
            l.next();
            State::LexInsideDoubleQuotedBracketString
        }
        '-' => {
            l.next();
            if l.accept_run(is_digit) {
                l.emit(TokenType::Index {
                    value: l.boxed_value(),
                });
                State::LexInsideBracket
            } else {
                let msg = format!("expected a digit after '-', found '{}'", l.peek());
                l.error(msg)
            }
        }
        EOQ => l.error(String::from("unclosed bracket")),
        _ => {
            if l.accept_run(is_digit) {
                l.emit(TokenType::Index {
                    value: l.boxed_value(),
                });
                State::LexInsideBracket
            } else {
                let msg = format!("unexpected '{}' in bracket", l.peek());
                l.error(msg)
            }
        }
    }
}

fn lex_string(l: &mut Lexer, quote: char, next_state: State) -> State {
    l.ignore(); // ignore open quote

    loop {
        match l.peek() {
            '\\' => {
                l.next();
                if l.next().is_none() {
                    return l.error(String::from("unclosed string"));
                }
            }
            EOQ => {
                let msg = format!("unclosed string starting at index {}", l.start);
                return l.error(msg);
            }
            ch => {
                if ch == quote {
                    let value = l.boxed_value();
                    l.emit(if quote == '\'' {
                        TokenType::SingleQuoteString { value }
                    } else {
                        TokenType::DoubleQuoteString { value }
                    });
                    l.next();
                    l.ignore(); // ignore closing quote
                    return next_state;
                }
                l.next();
            }
        }
    }
}

fn lex_regex(l: &mut Lexer) -> State {
    let mut in_class = false;

    loop {
        match l.peek() {
            '\\' => {
                l.next();
                if l.next().is_none() {
                    return l.error(String::from("unclosed regular expression"));
                }
            }
            '[' => {
                in_class = true;
                l.next();
            }
            ']' => {
                in_class = false;
                l.next();
            }
            '/' if !in_class => break,
            EOQ => return l.error(String::from("unclosed regular expression")),
            _ => {
                l.next();
            }
        }
    }

    let pattern = l.boxed_value();
    l.next(); // closing slash
    let flags_start = l.pos;
    l.accept_run(|ch| ch.is_ascii_alphabetic());
    let flags = l.query[flags_start..l.pos].to_string().into_boxed_str();
    l.emit(TokenType::Regex { pattern, flags });
    State::LexExpression
}

fn lex_number(l: &mut Lexer) -> State {
    if !l.accept_run(is_digit) {
        let msg = format!("expected a digit, found '{}'", l.peek());
        return l.error(msg);
    }

    if l.accept('.') {
        if !l.accept_run(is_digit) {
            return l.error(String::from(
                "a fractional digit is required after a decimal point",
            ));
        }

        if l.accept('e') || l.accept('E') {
            l.accept_if(|ch| ch == '+' || ch == '-');
            if !l.accept_run(is_digit) {
                return l.error(String::from("at least one exponent digit is required"));
            }
        }

        l.emit(TokenType::Float {
            value: l.boxed_value(),
        });
    } else if l.accept('e') || l.accept('E') {
        l.accept_if(|ch| ch == '+' || ch == '-');
        if !l.accept_run(is_digit) {
            return l.error(String::from("at least one exponent digit is required"));
        }
        l.emit(TokenType::Float {
            value: l.boxed_value(),
        });
    } else {
        l.emit(TokenType::Int {
            value: l.boxed_value(),
        })
    }

    State::LexExpression
}

/// Reports whether `ch` can start a shorthand member name.
pub fn is_name_first(ch: char) -> bool {
    let code_point = ch as u32;
    // surrogate pair code points are not representable with char
    (0x41..=0x5A).contains(&code_point)
        || code_point == 0x5F
        || (0x61..=0x7A).contains(&code_point)
        || code_point >= 0x80
}

pub fn is_name_char(ch: char) -> bool {
    let code_point = ch as u32;
    (0x30..=0x39).contains(&code_point)
        || (0x41..=0x5A).contains(&code_point)
        || code_point == 0x5F
        || (0x61..=0x7A).contains(&code_point)
        || code_point >= 0x80
}

/// Reports whether `name` can be written as `.name` and read back unchanged.
pub fn is_shorthand_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_first) && chars.all(is_name_char)
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_whitespace_char(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\r' | '\t')
}
