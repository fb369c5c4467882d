//! Structured text (Clausewitz style `key=value` blocks)
//!
//! The game reads its data files in a simple block grammar:
//!
//! ```text
//! humans={
//! 	species_class="HUMAN"
//! 	portraits={ "aaaaaaaaaa" }
//! }
//! ```
//!
//! Field names are written unquoted, text values are quoted, numbers and
//! booleans are written bare. A block holds either `key=value` pairs or a
//! list of bare values.

use std::fmt::Write as _;

use crate::error::{ExportError, ExportResult};

/// Default nesting limit for writing and reading
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Quoted text
    Text(String),
    /// Unquoted token, written verbatim (e.g. `HUMAN`)
    Bare(String),
    Integer(i64),
    Float(f64),
    /// Written as `yes` / `no`
    Boolean(bool),
}

/// A node in a structured text document
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    /// Block of bare values, no keys
    Sequence(Vec<Value>),
    /// Block of `key=value` pairs
    Mapping(Mapping),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Text(s.into()))
    }

    pub fn bare(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Bare(s.into()))
    }

    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Text of a quoted or bare scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::Text(s)) | Value::Scalar(Scalar::Bare(s)) => Some(s),
            _ => None,
        }
    }

    fn is_block(&self) -> bool {
        !matches!(self, Value::Scalar(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(Scalar::Integer(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Scalar(Scalar::Integer(n.into()))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Scalar(Scalar::Float(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Boolean(b))
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Mapping(m)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

/// Ordered `key=value` pairs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping {
    fields: Vec<(String, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Builder form of [`Mapping::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Append a field even if the key already exists (game files repeat keys)
    fn push(&mut self, key: String, value: Value) {
        self.fields.push((key, value));
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Whitespace layout of the written text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One pair per line, tab indentation, scalar lists kept inline
    #[default]
    Pretty,
    /// Everything on a single line
    Compact,
}

/// Writer options
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub layout: Layout,
    /// Deepest block nesting accepted before giving up
    pub max_depth: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            layout: Layout::Pretty,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Encodes mappings into structured text
#[derive(Debug, Clone, Default)]
pub struct Writer {
    config: WriterConfig,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WriterConfig) -> Self {
        Self { config }
    }

    /// Shorthand for a compact single line writer
    pub fn compact() -> Self {
        Self::with_config(WriterConfig {
            layout: Layout::Compact,
            ..WriterConfig::default()
        })
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Encode a document. The top level of a file is always a set of pairs.
    pub fn encode(&self, document: &Mapping) -> ExportResult<Vec<u8>> {
        Ok(self.encode_to_string(document)?.into_bytes())
    }

    pub fn encode_to_string(&self, document: &Mapping) -> ExportResult<String> {
        let mut output = String::new();
        match self.config.layout {
            Layout::Pretty => {
                for (key, value) in document.iter() {
                    self.write_pretty_pair(&mut output, key, value, 0)?;
                }
            }
            Layout::Compact => self.write_compact_pairs(&mut output, document, 0)?,
        }
        Ok(output)
    }

    /// Encode any value. A mapping is written as a document; a scalar or a
    /// sequence is written as a single bare value (`3`, `"x"`, `{ 1 2 }`).
    pub fn encode_value(&self, value: &Value) -> ExportResult<String> {
        if let Value::Mapping(document) = value {
            return self.encode_to_string(document);
        }
        let mut output = String::new();
        match self.config.layout {
            Layout::Pretty => self.write_pretty_value(&mut output, value, 0)?,
            Layout::Compact => self.write_compact_value(&mut output, value, 0)?,
        }
        Ok(output)
    }

    fn enter(&self, depth: usize) -> ExportResult<usize> {
        let next = depth + 1;
        if next > self.config.max_depth {
            return Err(ExportError::CyclicValue {
                limit: self.config.max_depth,
            });
        }
        Ok(next)
    }

    fn write_pretty_pair(
        &self,
        output: &mut String,
        key: &str,
        value: &Value,
        depth: usize,
    ) -> ExportResult<()> {
        indent(output, depth);
        output.push_str(key);
        output.push('=');
        self.write_pretty_value(output, value, depth)?;
        output.push('\n');
        Ok(())
    }

    fn write_pretty_value(
        &self,
        output: &mut String,
        value: &Value,
        depth: usize,
    ) -> ExportResult<()> {
        match value {
            Value::Scalar(scalar) => write_scalar(output, scalar)?,
            Value::Sequence(items) => {
                let inner = self.enter(depth)?;
                if items.is_empty() {
                    output.push_str("{ }");
                } else if items.iter().any(Value::is_block) {
                    output.push_str("{\n");
                    for item in items {
                        indent(output, inner);
                        self.write_pretty_value(output, item, inner)?;
                        output.push('\n');
                    }
                    indent(output, depth);
                    output.push('}');
                } else {
                    output.push('{');
                    for item in items {
                        output.push(' ');
                        self.write_pretty_value(output, item, inner)?;
                    }
                    output.push_str(" }");
                }
            }
            Value::Mapping(mapping) => {
                let inner = self.enter(depth)?;
                if mapping.is_empty() {
                    output.push_str("{ }");
                } else {
                    output.push_str("{\n");
                    for (key, value) in mapping.iter() {
                        self.write_pretty_pair(output, key, value, inner)?;
                    }
                    indent(output, depth);
                    output.push('}');
                }
            }
        }
        Ok(())
    }

    fn write_compact_pairs(
        &self,
        output: &mut String,
        mapping: &Mapping,
        depth: usize,
    ) -> ExportResult<()> {
        for (i, (key, value)) in mapping.iter().enumerate() {
            if i > 0 {
                output.push(' ');
            }
            output.push_str(key);
            output.push('=');
            self.write_compact_value(output, value, depth)?;
        }
        Ok(())
    }

    fn write_compact_value(
        &self,
        output: &mut String,
        value: &Value,
        depth: usize,
    ) -> ExportResult<()> {
        match value {
            Value::Scalar(scalar) => write_scalar(output, scalar)?,
            Value::Sequence(items) => {
                let inner = self.enter(depth)?;
                output.push('{');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        output.push(' ');
                    }
                    self.write_compact_value(output, item, inner)?;
                }
                output.push('}');
            }
            Value::Mapping(mapping) => {
                let inner = self.enter(depth)?;
                output.push('{');
                self.write_compact_pairs(output, mapping, inner)?;
                output.push('}');
            }
        }
        Ok(())
    }
}

fn indent(output: &mut String, depth: usize) {
    for _ in 0..depth {
        output.push('\t');
    }
}

/// Integral floats keep a `.0` so they read back as floats.
/// NaN and the infinities have no spelling in the format.
fn write_scalar(output: &mut String, scalar: &Scalar) -> ExportResult<()> {
    match scalar {
        Scalar::Text(s) => {
            output.push('"');
            for c in s.chars() {
                if c == '"' || c == '\\' {
                    output.push('\\');
                }
                output.push(c);
            }
            output.push('"');
        }
        Scalar::Bare(s) => output.push_str(s),
        Scalar::Integer(n) => {
            let _ = write!(output, "{}", n);
        }
        Scalar::Float(n) => {
            if !n.is_finite() {
                return Err(ExportError::NonFiniteNumber { value: *n });
            }
            let text = n.to_string();
            output.push_str(&text);
            if !text.contains('.') {
                output.push_str(".0");
            }
        }
        Scalar::Boolean(b) => output.push_str(if *b { "yes" } else { "no" }),
    }
    Ok(())
}

/// Encode with the default pretty layout
pub fn encode(document: &Mapping) -> ExportResult<Vec<u8>> {
    Writer::new().encode(document)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Equals,
    Quoted(String),
    Bare(String),
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> ExportError {
        ExportError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> ExportResult<Option<(Token, usize)>> {
        loop {
            match self.chars.peek().copied() {
                None => return Ok(None),
                Some('\n') => {
                    self.line += 1;
                    self.chars.next();
                }
                Some(c) if c.is_whitespace() => {
                    self.chars.next();
                }
                Some('#') => {
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                Some(_) => break,
            }
        }

        let line = self.line;
        let token = match self.chars.next() {
            Some('{') => Token::Open,
            Some('}') => Token::Close,
            Some('=') => Token::Equals,
            Some('"') => {
                let mut text = String::new();
                loop {
                    match self.chars.next() {
                        None => return Err(self.error("unterminated string")),
                        Some('"') => break,
                        Some('\\') => match self.chars.next() {
                            Some(c) => text.push(c),
                            None => return Err(self.error("unterminated string")),
                        },
                        Some(c) => {
                            if c == '\n' {
                                self.line += 1;
                            }
                            text.push(c);
                        }
                    }
                }
                Token::Quoted(text)
            }
            Some(first) => {
                let mut text = String::from(first);
                while let Some(&c) = self.chars.peek() {
                    if c.is_whitespace() || matches!(c, '{' | '}' | '=' | '"' | '#') {
                        break;
                    }
                    text.push(c);
                    self.chars.next();
                }
                Token::Bare(text)
            }
            None => return Ok(None),
        };
        Ok(Some((token, line)))
    }
}

/// Reads structured text back into a [`Mapping`]
struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    max_depth: usize,
}

impl Parser {
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |(_, line)| *line)
    }

    fn error(&self, message: impl Into<String>) -> ExportError {
        ExportError::Parse {
            line: self.line(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Pairs until `}` (nested) or end of input (top level)
    fn parse_pairs(&mut self, depth: usize) -> ExportResult<Mapping> {
        let mut mapping = Mapping::new();
        loop {
            match self.peek() {
                None if depth == 0 => return Ok(mapping),
                None => return Err(self.error("unexpected end of input, expected '}'")),
                Some(Token::Close) if depth > 0 => return Ok(mapping),
                _ => {}
            }
            let key = match self.advance() {
                Some(Token::Bare(k)) | Some(Token::Quoted(k)) => k,
                other => return Err(self.error(format!("expected field name, found {:?}", other))),
            };
            if self.advance() != Some(Token::Equals) {
                return Err(self.error(format!("expected '=' after '{}'", key)));
            }
            let value = self.parse_value(depth)?;
            mapping.push(key, value);
        }
    }

    fn parse_value(&mut self, depth: usize) -> ExportResult<Value> {
        match self.advance() {
            Some(Token::Quoted(s)) => Ok(Value::text(s)),
            Some(Token::Bare(s)) => Ok(parse_bare(s)),
            Some(Token::Open) => {
                let inner = depth + 1;
                if inner > self.max_depth {
                    return Err(ExportError::CyclicValue {
                        limit: self.max_depth,
                    });
                }
                let is_mapping = matches!(
                    (self.peek(), self.peek_at(1)),
                    (Some(Token::Bare(_)) | Some(Token::Quoted(_)), Some(Token::Equals))
                );
                let value = if is_mapping {
                    Value::Mapping(self.parse_pairs(inner)?)
                } else {
                    let mut items = Vec::new();
                    while !matches!(self.peek(), Some(Token::Close) | None) {
                        items.push(self.parse_value(inner)?);
                    }
                    Value::Sequence(items)
                };
                match self.advance() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(self.error("unexpected end of input, expected '}'")),
                }
            }
            other => Err(self.error(format!("expected value, found {:?}", other))),
        }
    }
}

fn parse_bare(token: String) -> Value {
    if let Ok(n) = token.parse::<i64>() {
        return Value::Scalar(Scalar::Integer(n));
    }
    if token.contains('.') {
        if let Ok(n) = token.parse::<f64>() {
            return Value::Scalar(Scalar::Float(n));
        }
    }
    match token.as_str() {
        "yes" => Value::Scalar(Scalar::Boolean(true)),
        "no" => Value::Scalar(Scalar::Boolean(false)),
        _ => Value::Scalar(Scalar::Bare(token)),
    }
}

/// Parse structured text into a document
///
/// A block whose first item is followed by `=` is read as a mapping,
/// anything else as a sequence. Repeated keys are all kept.
pub fn parse(input: &str) -> ExportResult<Mapping> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        max_depth: DEFAULT_MAX_DEPTH,
    };
    parser.parse_pairs(0)
}
