/*!
 The Objective-C type encoding grammar embedded in a `typedstream`.

 Every group of values in the stream is preceded by a type encoding string such as `i`, `@`,
 `{_NSRange=II}` or `[16c]`. This module parses those strings into [`TypeDescriptor`] trees.
*/

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use crate::error::typedstream::TypedStreamError;

/// Default limit for nested types, values, and objects
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Describes the shape of a single value stored in the `typedstream`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// A C99 `bool`, stored as a single byte
    Bool,
    /// An integer `width` bytes wide; `char` types are stored as a single raw byte
    Integer { width: usize, signed: bool },
    /// An [`f32`] (`width` 4) or [`f64`] (`width` 8)
    Float { width: usize },
    /// A `char *`, shared by reference in the stream
    CString,
    /// A unique `NXAtom` string
    Atom,
    /// A selector name
    Selector,
    /// A length-prefixed run of raw bytes
    Bytes,
    /// A class object
    Class,
    /// An instance of a class
    Object,
    /// A fixed-size C array
    Array {
        element: Box<TypeDescriptor>,
        count: usize,
    },
    /// A C struct; fields are stored in order without padding
    Struct {
        name: Option<String>,
        fields: Vec<StructField>,
    },
    /// A pointer; the stream holds the pointee
    Pointer(Box<TypeDescriptor>),
}

/// A single member of a [`TypeDescriptor::Struct`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    /// The field name, if the encoding carried one
    pub name: Option<String>,
    pub field_type: TypeDescriptor,
}

impl TypeDescriptor {
    /// A signed integer of the given width in bytes
    pub fn signed(width: usize) -> Self {
        Self::Integer {
            width,
            signed: true,
        }
    }

    /// An unsigned integer of the given width in bytes
    pub fn unsigned(width: usize) -> Self {
        Self::Integer {
            width,
            signed: false,
        }
    }

    /// Structural equality that ignores struct and field names, used to compare the type a
    /// caller asks for against the one found in the stream
    pub fn matches(&self, other: &TypeDescriptor) -> bool {
        match (self, other) {
            (
                Self::Array { element, count },
                Self::Array {
                    element: other_element,
                    count: other_count,
                },
            ) => count == other_count && element.matches(other_element),
            (Self::Struct { fields, .. }, Self::Struct { fields: other_fields, .. }) => {
                fields.len() == other_fields.len()
                    && fields
                        .iter()
                        .zip(other_fields)
                        .all(|(a, b)| a.field_type.matches(&b.field_type))
            }
            (Self::Pointer(a), Self::Pointer(b)) => a.matches(b),
            (a, b) => a == b,
        }
    }

    /// The fewest bytes a value of this type occupies in the stream
    ///
    /// Empty arrays and structs without fields count as one byte so element counts of nested
    /// arrays stay bounded.
    pub(crate) fn min_size(&self) -> usize {
        match self {
            Self::Array { element, count } => element.min_size().saturating_mul(*count).max(1),
            Self::Struct { fields, .. } => fields
                .iter()
                .fold(0, |size: usize, field| {
                    size.saturating_add(field.field_type.min_size())
                })
                .max(1),
            Self::Pointer(pointee) => pointee.min_size(),
            _ => 1,
        }
    }

    /// The Rust name of an integer type, for error messages
    pub(crate) fn integer_name(width: usize, signed: bool) -> &'static str {
        match (width, signed) {
            (1, true) => "i8",
            (1, false) => "u8",
            (2, true) => "i16",
            (2, false) => "u16",
            (4, true) => "i32",
            (4, false) => "u32",
            (_, true) => "i64",
            (_, false) => "u64",
        }
    }
}

/// Renders the canonical encoding of a type, i.e. `l` is rendered as `i`
impl Display for TypeDescriptor {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            TypeDescriptor::Bool => write!(fmt, "B"),
            TypeDescriptor::Integer { width, signed } => {
                let letter = match width {
                    1 => 'c',
                    2 => 's',
                    4 => 'i',
                    _ => 'q',
                };
                if *signed {
                    write!(fmt, "{letter}")
                } else {
                    write!(fmt, "{}", letter.to_ascii_uppercase())
                }
            }
            TypeDescriptor::Float { width: 4 } => write!(fmt, "f"),
            TypeDescriptor::Float { .. } => write!(fmt, "d"),
            TypeDescriptor::CString => write!(fmt, "*"),
            TypeDescriptor::Atom => write!(fmt, "%"),
            TypeDescriptor::Selector => write!(fmt, ":"),
            TypeDescriptor::Bytes => write!(fmt, "+"),
            TypeDescriptor::Class => write!(fmt, "#"),
            TypeDescriptor::Object => write!(fmt, "@"),
            TypeDescriptor::Array { element, count } => write!(fmt, "[{count}{element}]"),
            TypeDescriptor::Struct { name, fields } => {
                write!(fmt, "{{{}=", name.as_deref().unwrap_or("?"))?;
                for field in fields {
                    write!(fmt, "{}", field.field_type)?;
                }
                write!(fmt, "}}")
            }
            TypeDescriptor::Pointer(pointee) => write!(fmt, "^{pointee}"),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = TypedStreamError;

    /// Parse an encoding that describes exactly one type
    fn from_str(encoding: &str) -> Result<Self, Self::Err> {
        let mut types = parse_type_encoding(encoding, DEFAULT_MAX_DEPTH)?;
        if types.len() != 1 {
            return Err(TypedStreamError::MalformedTypeGrammar(format!(
                "expected a single type in {encoding:?}, found {}",
                types.len()
            )));
        }
        types
            .pop()
            .ok_or_else(|| TypedStreamError::MalformedTypeGrammar(encoding.to_string()))
    }
}

/// Render a list of types the way they appear in the stream
pub(crate) fn encoding_of(types: &[TypeDescriptor]) -> String {
    types.iter().map(ToString::to_string).collect()
}

/// Parse a type encoding that may describe several consecutive types, i.e. `iI`
pub fn parse_type_encoding(
    encoding: &str,
    max_depth: usize,
) -> Result<Vec<TypeDescriptor>, TypedStreamError> {
    let mut parser = TypeParser {
        encoding,
        input: encoding.as_bytes(),
        idx: 0,
        depth: 0,
        max_depth,
    };
    let mut types = vec![];
    while parser.idx < parser.input.len() {
        types.push(parser.parse_type()?);
    }
    if types.is_empty() {
        return Err(parser.malformed("empty type encoding"));
    }
    Ok(types)
}

/// Recursive-descent parser over the bytes of a single type encoding
struct TypeParser<'a> {
    encoding: &'a str,
    input: &'a [u8],
    idx: usize,
    depth: usize,
    max_depth: usize,
}

impl TypeParser<'_> {
    fn malformed(&self, why: &str) -> TypedStreamError {
        TypedStreamError::MalformedTypeGrammar(format!(
            "{why} at offset {} in {:?}",
            self.idx, self.encoding
        ))
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.idx).copied()
    }

    fn next(&mut self) -> Result<u8, TypedStreamError> {
        let byte = self
            .peek()
            .ok_or_else(|| self.malformed("unexpected end of encoding"))?;
        self.idx += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<(), TypedStreamError> {
        if self.next()? != expected {
            self.idx -= 1;
            return Err(self.malformed(&format!("expected {:?}", expected as char)));
        }
        Ok(())
    }

    fn parse_type(&mut self) -> Result<TypeDescriptor, TypedStreamError> {
        if self.depth >= self.max_depth {
            return Err(TypedStreamError::NestingTooDeep(self.max_depth));
        }
        self.depth += 1;
        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Result<TypeDescriptor, TypedStreamError> {
        // Method qualifiers (const, in, inout, out, bycopy, byref, oneway) do not change the layout
        while matches!(
            self.peek(),
            Some(b'r' | b'n' | b'N' | b'o' | b'O' | b'R' | b'V')
        ) {
            self.idx += 1;
        }

        match self.next()? {
            b'B' => Ok(TypeDescriptor::Bool),
            b'c' => Ok(TypeDescriptor::signed(1)),
            b'C' => Ok(TypeDescriptor::unsigned(1)),
            b's' => Ok(TypeDescriptor::signed(2)),
            b'S' => Ok(TypeDescriptor::unsigned(2)),
            b'i' | b'l' => Ok(TypeDescriptor::signed(4)),
            b'I' | b'L' => Ok(TypeDescriptor::unsigned(4)),
            b'q' => Ok(TypeDescriptor::signed(8)),
            b'Q' => Ok(TypeDescriptor::unsigned(8)),
            b'f' => Ok(TypeDescriptor::Float { width: 4 }),
            b'd' => Ok(TypeDescriptor::Float { width: 8 }),
            b'*' => Ok(TypeDescriptor::CString),
            b'%' => Ok(TypeDescriptor::Atom),
            b':' => Ok(TypeDescriptor::Selector),
            b'+' => Ok(TypeDescriptor::Bytes),
            b'#' => Ok(TypeDescriptor::Class),
            b'@' => Ok(TypeDescriptor::Object),
            b'^' => Ok(TypeDescriptor::Pointer(Box::new(self.parse_type()?))),
            b'[' => self.parse_array(),
            b'{' => self.parse_struct(),
            _ => {
                self.idx -= 1;
                Err(self.malformed("unknown type"))
            }
        }
    }

    /// `[` was consumed; parse `count element ]`
    fn parse_array(&mut self) -> Result<TypeDescriptor, TypedStreamError> {
        let start = self.idx;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.idx += 1;
        }
        let count = self.encoding[start..self.idx]
            .parse::<usize>()
            .map_err(|_| self.malformed("invalid array length"))?;
        let element = self.parse_type()?;
        self.expect(b']')?;
        Ok(TypeDescriptor::Array {
            element: Box::new(element),
            count,
        })
    }

    /// `{` was consumed; parse `name = fields }` or `name }`
    fn parse_struct(&mut self) -> Result<TypeDescriptor, TypedStreamError> {
        let start = self.idx;
        while !matches!(self.peek(), Some(b'=' | b'}') | None) {
            self.idx += 1;
        }
        let name = match &self.encoding[start..self.idx] {
            "" | "?" => None,
            name => Some(name.to_string()),
        };

        let mut fields = vec![];
        if self.next()? == b'=' {
            while self.peek() != Some(b'}') {
                let field_name = self.parse_field_name()?;
                fields.push(StructField {
                    name: field_name,
                    field_type: self.parse_type()?,
                });
            }
            self.expect(b'}')?;
        }
        Ok(TypeDescriptor::Struct { name, fields })
    }

    /// Struct fields may be preceded by a quoted name, i.e. `{CGPoint="x"d"y"d}`
    fn parse_field_name(&mut self) -> Result<Option<String>, TypedStreamError> {
        if self.peek() != Some(b'"') {
            return Ok(None);
        }
        self.idx += 1;
        let start = self.idx;
        while self.next()? != b'"' {}
        Ok(Some(self.encoding[start..self.idx - 1].to_string()))
    }
}
