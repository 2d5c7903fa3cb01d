//! Docblock type-expression parser.
//!
//! Turns informal type annotations such as `array{id: int, name?: string}`,
//! `array<string, AddressDTO>`, `?UserDTO[]` or `Role|null` into a
//! normalized [`TypeNode`] tree.
//!
//! The parser is a hand-written recursive-descent scanner over a byte
//! cursor. It never fails: anything it cannot recognize, including
//! unbalanced brackets and trailing garbage, degrades to `any` and is
//! reported as a [`ParseWarning`].

use crate::mapper::{self, Primitive};
use std::fmt;

/// Maximum nesting of brackets accepted before the input is treated as malformed.
const MAX_NESTING: usize = 64;

/// Keywords that introduce a shaped record or a generic collection.
const COLLECTION_KEYWORDS: [&str; 5] = [
    "array",
    "list",
    "non-empty-array",
    "non-empty-list",
    "iterable",
];

/// Normalized type representation of one annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNode {
    /// Primitive from the fixed table.
    Primitive(Primitive),
    /// Reference to another entity, as written (short or qualified).
    Named(String),
    /// Homogeneous ordered collection.
    Array(Box<TypeNode>),
    /// Shaped record with ordered, unique keys.
    Record(Vec<RecordEntry>),
    /// Two-parameter key/value collection.
    Dictionary(Box<TypeNode>, Box<TypeNode>),
    /// Nullable wrapper; never nested and never around `any`.
    Nullable(Box<TypeNode>),
    /// Union of two or more non-null alternatives.
    Union(Vec<TypeNode>),
}

/// One entry of a shaped record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    /// Entry key.
    pub key: String,
    /// Entry type.
    pub ty: TypeNode,
    /// Whether the key may be absent.
    pub optional: bool,
}

impl RecordEntry {
    /// Creates a new record entry.
    #[must_use]
    pub fn new(key: impl Into<String>, ty: TypeNode, optional: bool) -> Self {
        Self {
            key: key.into(),
            ty,
            optional,
        }
    }
}

impl TypeNode {
    /// The fallback type.
    pub const ANY: Self = Self::Primitive(Primitive::Any);

    /// Creates a named reference.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Creates an array of `item`.
    #[must_use]
    pub fn array(item: Self) -> Self {
        Self::Array(Box::new(item))
    }

    /// Creates a dictionary from `key` to `value`.
    #[must_use]
    pub fn dictionary(key: Self, value: Self) -> Self {
        Self::Dictionary(Box::new(key), Box::new(value))
    }

    /// Wraps `inner` as nullable, applying the normalization rules.
    ///
    /// `Nullable(Nullable(x))` collapses to `Nullable(x)`; `any` and `null`
    /// are returned unchanged.
    #[must_use]
    pub fn nullable(inner: Self) -> Self {
        match inner {
            Self::Nullable(_) | Self::Primitive(Primitive::Any | Primitive::Null) => inner,
            other => Self::Nullable(Box::new(other)),
        }
    }

    /// Builds a union, extracting `null` members into a nullable wrapper.
    ///
    /// Nested unions are flattened, duplicates removed and `any` absorbs
    /// every other member.
    #[must_use]
    pub fn union(members: Vec<Self>) -> Self {
        let mut nullable = false;
        let mut flat: Vec<Self> = Vec::with_capacity(members.len());

        fn push(flat: &mut Vec<TypeNode>, nullable: &mut bool, member: TypeNode) {
            match member {
                TypeNode::Primitive(Primitive::Null) => *nullable = true,
                TypeNode::Nullable(inner) => {
                    *nullable = true;
                    push(flat, nullable, *inner);
                }
                TypeNode::Union(inner) => {
                    for member in inner {
                        push(flat, nullable, member);
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }

        for member in members {
            push(&mut flat, &mut nullable, member);
        }

        if flat.contains(&Self::ANY) {
            return Self::ANY;
        }

        let node = match flat.len() {
            0 => Self::Primitive(Primitive::Null),
            1 => flat.remove(0),
            _ => Self::Union(flat),
        };

        if nullable { Self::nullable(node) } else { node }
    }

    /// Returns true if the node already encodes nullability.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        matches!(
            self,
            Self::Nullable(_) | Self::Primitive(Primitive::Null | Primitive::Any)
        )
    }

    /// Visits every named leaf in the tree, depth first, in source order.
    pub fn for_each_named<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Self::Primitive(_) => {}
            Self::Named(name) => f(name),
            Self::Array(item) | Self::Nullable(item) => item.for_each_named(f),
            Self::Dictionary(key, value) => {
                key.for_each_named(f);
                value.for_each_named(f);
            }
            Self::Record(entries) => {
                for entry in entries {
                    entry.ty.for_each_named(f);
                }
            }
            Self::Union(members) => {
                for member in members {
                    member.for_each_named(f);
                }
            }
        }
    }

    /// Renders the node as a TypeScript type expression.
    #[must_use]
    pub fn to_typescript(&self) -> String {
        mapper::render_type(self)
    }
}

/// Non-fatal problem found while parsing an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// A shaped record declared the same key twice; the last one wins.
    DuplicateKey {
        /// Redeclared key.
        key: String,
    },
    /// The annotation was not recognized and degraded to `any`.
    Malformed {
        /// Original annotation text.
        input: String,
        /// Byte offset where parsing gave up.
        position: usize,
        /// What the parser expected.
        reason: String,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { key } => write!(f, "duplicate record key '{key}'"),
            Self::Malformed {
                input,
                position,
                reason,
            } => write!(
                f,
                "malformed annotation '{input}' at offset {position}: {reason}"
            ),
        }
    }
}

/// Result of parsing an annotation together with its warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// Parsed type, `any` when the input was malformed.
    pub node: TypeNode,
    /// Warnings collected while parsing.
    pub warnings: Vec<ParseWarning>,
}

/// Parses an annotation, falling back to `any` on malformed input.
#[must_use]
pub fn parse(annotation: &str) -> TypeNode {
    parse_with_diagnostics(annotation).node
}

/// Parses an annotation and reports warnings instead of discarding them.
#[must_use]
pub fn parse_with_diagnostics(annotation: &str) -> Parsed {
    let mut parser = Parser::new(annotation);
    let outcome = parser.parse_root();
    let mut warnings = parser.warnings;

    let node = match outcome {
        Ok(node) => node,
        Err(Malformed { position, reason }) => {
            tracing::debug!(annotation, position, reason, "annotation degraded to any");
            // Warnings from a partially parsed record no longer apply.
            warnings.clear();
            warnings.push(ParseWarning::Malformed {
                input: annotation.to_string(),
                position,
                reason: reason.to_string(),
            });
            TypeNode::ANY
        }
    };

    Parsed { node, warnings }
}

/// Internal failure marker; converted into a warning at the root.
#[derive(Debug)]
struct Malformed {
    position: usize,
    reason: &'static str,
}

type PResult<T> = Result<T, Malformed>;

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    nesting: usize,
    warnings: Vec<ParseWarning>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            nesting: 0,
            warnings: Vec::new(),
        }
    }

    fn parse_root(&mut self) -> PResult<TypeNode> {
        self.skip_ws();
        if self.at_end() {
            return Err(self.malformed("empty annotation"));
        }
        let node = self.parse_type()?;
        self.skip_ws();
        if !self.at_end() {
            return Err(self.malformed("unexpected trailing input"));
        }
        Ok(node)
    }

    /// type := '?' type | union
    fn parse_type(&mut self) -> PResult<TypeNode> {
        self.skip_ws();
        if self.eat(b'?') {
            let inner = self.nested(Self::parse_type)?;
            return Ok(TypeNode::nullable(inner));
        }
        self.parse_union()
    }

    /// union := postfix ('|' member)*
    fn parse_union(&mut self) -> PResult<TypeNode> {
        let first = self.parse_postfix()?;
        self.skip_ws();
        if self.peek() != Some(b'|') {
            return Ok(first);
        }

        let mut members = vec![first];
        while self.eat(b'|') {
            members.push(self.parse_union_member()?);
            self.skip_ws();
        }
        Ok(TypeNode::union(members))
    }

    /// member := '?' postfix | postfix
    fn parse_union_member(&mut self) -> PResult<TypeNode> {
        self.skip_ws();
        if self.eat(b'?') {
            let inner = self.nested(Self::parse_postfix)?;
            return Ok(TypeNode::nullable(inner));
        }
        self.parse_postfix()
    }

    /// postfix := atom ('[' ']')*
    fn parse_postfix(&mut self) -> PResult<TypeNode> {
        let mut node = self.parse_atom()?;
        loop {
            let checkpoint = self.pos;
            self.skip_ws();
            if self.eat(b'[') {
                self.skip_ws();
                if self.eat(b']') {
                    node = TypeNode::array(node);
                    continue;
                }
                return Err(self.malformed("expected ']'"));
            }
            self.pos = checkpoint;
            return Ok(node);
        }
    }

    /// atom := record | '(' type ')' | identifier [record | generic-args]
    fn parse_atom(&mut self) -> PResult<TypeNode> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.nested(Self::parse_record),
            Some(b'(') => {
                self.bump();
                let inner = self.nested(Self::parse_type)?;
                self.skip_ws();
                if !self.eat(b')') {
                    return Err(self.malformed("expected ')'"));
                }
                Ok(inner)
            }
            Some(c) if is_ident_start(c) => {
                let ident = self.read_identifier();
                self.parse_after_identifier(ident)
            }
            Some(_) => Err(self.malformed("expected a type")),
            None => Err(self.malformed("unexpected end of annotation")),
        }
    }

    fn parse_after_identifier(&mut self, ident: &'a str) -> PResult<TypeNode> {
        let is_collection = COLLECTION_KEYWORDS.contains(&ident);
        let checkpoint = self.pos;
        self.skip_ws();

        match self.peek() {
            Some(b'{') if is_collection && ident != "iterable" => self.nested(Self::parse_record),
            Some(b'<') => {
                let args = self.nested(Self::parse_generic_args)?;
                if is_collection {
                    collection_from_args(args).ok_or_else(|| self.malformed("too many type arguments"))
                } else {
                    // Ranges such as int<0, max> keep their base type; other
                    // generic classes are referenced by their base name.
                    Ok(resolve_identifier(ident))
                }
            }
            _ => {
                self.pos = checkpoint;
                if is_collection {
                    Ok(TypeNode::Primitive(Primitive::UntypedArray))
                } else {
                    Ok(resolve_identifier(ident))
                }
            }
        }
    }

    /// record := '{' (entry (',' entry)* ','?)? '}'
    fn parse_record(&mut self) -> PResult<TypeNode> {
        if !self.eat(b'{') {
            return Err(self.malformed("expected '{'"));
        }

        let mut entries: Vec<RecordEntry> = Vec::new();
        let mut implicit_index = 0usize;

        loop {
            self.skip_ws();
            if self.eat(b'}') {
                break;
            }

            let entry = match self.try_entry_key() {
                Some((key, optional)) => RecordEntry::new(key, self.parse_type()?, optional),
                None => {
                    // Positional entry: `array{int, string}`.
                    let ty = self.parse_type()?;
                    let entry = RecordEntry::new(implicit_index.to_string(), ty, false);
                    implicit_index += 1;
                    entry
                }
            };

            match entries.iter_mut().find(|existing| existing.key == entry.key) {
                Some(existing) => {
                    self.warnings.push(ParseWarning::DuplicateKey {
                        key: entry.key.clone(),
                    });
                    *existing = entry;
                }
                None => entries.push(entry),
            }

            self.skip_ws();
            if self.eat(b',') {
                continue;
            }
            if self.eat(b'}') {
                break;
            }
            return Err(self.malformed("expected ',' or '}'"));
        }

        Ok(TypeNode::Record(entries))
    }

    /// Reads `key:` / `key?:` / `key ?:`; restores the cursor when absent.
    fn try_entry_key(&mut self) -> Option<(String, bool)> {
        let checkpoint = self.pos;
        let key = match self.peek() {
            Some(quote @ (b'\'' | b'"')) => {
                self.bump();
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.bump();
                }
                let key = &self.src[start..self.pos];
                if !self.eat(quote) {
                    self.pos = checkpoint;
                    return None;
                }
                key
            }
            Some(c) if is_key_char(c) => {
                let start = self.pos;
                while self.peek().is_some_and(is_key_char) {
                    self.bump();
                }
                &self.src[start..self.pos]
            }
            _ => return None,
        };

        self.skip_ws();
        let optional = self.eat(b'?');
        self.skip_ws();
        if self.eat(b':') {
            Some((key.to_string(), optional))
        } else {
            self.pos = checkpoint;
            None
        }
    }

    /// generic-args := '<' type (',' type)* '>'
    fn parse_generic_args(&mut self) -> PResult<Vec<TypeNode>> {
        if !self.eat(b'<') {
            return Err(self.malformed("expected '<'"));
        }
        let mut args = vec![self.parse_generic_arg()?];
        loop {
            self.skip_ws();
            if self.eat(b',') {
                args.push(self.parse_generic_arg()?);
                continue;
            }
            if self.eat(b'>') {
                return Ok(args);
            }
            return Err(self.malformed("expected ',' or '>'"));
        }
    }

    /// Integer range bounds (`int<0, max>`, `int<-1, 5>`) are accepted as `any`.
    fn parse_generic_arg(&mut self) -> PResult<TypeNode> {
        self.skip_ws();
        if self
            .peek()
            .is_some_and(|c| c == b'-' || c.is_ascii_digit())
        {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
            return Ok(TypeNode::ANY);
        }
        self.parse_type()
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.nesting >= MAX_NESTING {
            return Err(self.malformed("nesting too deep"));
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    fn read_identifier(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.bump();
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn malformed(&self, reason: &'static str) -> Malformed {
        Malformed {
            position: self.pos,
            reason,
        }
    }
}

fn collection_from_args(mut args: Vec<TypeNode>) -> Option<TypeNode> {
    match args.len() {
        1 => Some(TypeNode::array(args.remove(0))),
        2 => {
            let value = args.remove(1);
            let key = args.remove(0);
            Some(TypeNode::dictionary(key, value))
        }
        _ => None,
    }
}

fn resolve_identifier(ident: &str) -> TypeNode {
    let bare = ident.trim_start_matches(mapper::NAMESPACE_SEPARATORS);
    if mapper::is_date_time(bare) {
        return TypeNode::Primitive(Primitive::String);
    }
    match Primitive::from_name(bare) {
        Some(primitive) => TypeNode::Primitive(primitive),
        None => TypeNode::Named(mapper::normalize_qualified(bare)),
    }
}

const fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'\\'
}

const fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'\\' | b'.' | b'-')
}

const fn is_key_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'$')
}
