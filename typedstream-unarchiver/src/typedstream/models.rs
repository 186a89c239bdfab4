/*!
 Data structures produced while decoding a `typedstream`.
*/

use crate::typedstream::types::TypeDescriptor;

/// Byte order of multi-byte numbers, declared by the archive signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// `streamtyped`, written on Intel and Apple Silicon
    Little,
    /// `typedstream`, written on NeXT and PowerPC hardware
    Big,
}

/// The validated header at the start of every archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub streamer_version: u8,
    pub byte_order: ByteOrder,
    pub system_version: i64,
}

/// A class name and the version it was archived with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    /// The name of the class
    pub name: String,
    /// The encoded version of the class
    pub version: u64,
}

impl Class {
    pub(crate) fn new(name: String, version: u64) -> Self {
        Self { name, version }
    }
}

/// A class stored in the `typedstream`, with its inheritance chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    pub class: Class,
    /// Superclasses, nearest first
    pub ancestors: Vec<Class>,
    /// Index of the direct superclass in the [`ReferenceTable`](crate::typedstream::table::ReferenceTable)
    pub superclass: Option<ClassRef>,
    /// Name used to look up the decode routine; the archived name unless substituted
    pub dispatch_name: String,
}

/// Handle to a class in the reference table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassRef(pub usize);

/// Handle to an object in the reference table
///
/// Two back-references to the same archived object resolve to the same handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub usize);

/// An object stored in the `typedstream`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub class: ClassRef,
    /// The result of the decode routine, or `None` while the object is still being decoded
    pub value: Option<Value>,
}

/// Rust structures containing data stored in the `typedstream`
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A nil object, class, string, or selector
    Nil,
    Bool(bool),
    /// Signed integer types are coerced into this container
    SignedInteger(i64),
    /// Unsigned integer types are coerced into this container
    UnsignedInteger(u64),
    /// Floating point numbers
    Float(f32),
    /// Double precision floats
    Double(f64),
    /// C strings and atoms
    String(String),
    /// A selector name
    Selector(String),
    /// Raw bytes, from `char` arrays or length-prefixed data
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Struct fields, in declaration order
    Struct(Vec<Value>),
    Pointer(Box<Value>),
    Class(ClassRef),
    Object(ObjectRef),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SignedInteger(value) => Some(*value),
            Value::UnsignedInteger(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UnsignedInteger(value) => Some(*value),
            Value::SignedInteger(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(f64::from(*value)),
            Value::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) | Value::Selector(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Value::Object(object) => Some(*object),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Visit every object handle reachable from this value without following handles
    pub(crate) fn objects(&self, out: &mut Vec<ObjectRef>) {
        match self {
            Value::Object(object) => out.push(*object),
            Value::Array(values) | Value::Struct(values) => {
                values.iter().for_each(|value| value.objects(out))
            }
            Value::Pointer(pointee) => pointee.objects(out),
            _ => {}
        }
    }
}

/// The kinds of entries that share the back-reference index space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    CString,
    Class,
    Object,
}

impl EntryKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            EntryKind::CString => "C string",
            EntryKind::Class => "class",
            EntryKind::Object => "object",
        }
    }
}

/// Types of data that can be archived into the reference table
#[derive(Debug, Clone, PartialEq)]
pub enum Archivable {
    /// A `char *` value
    CString(String),
    /// A class, usually part of an inheritance hierarchy
    Class(ClassRecord),
    /// An instance of a class
    Object(ObjectRecord),
    /// A placeholder, only used when reserving a spot in the reference table before the entry's
    /// payload is read. Objects and classes are numbered in the order they start in the stream,
    /// not the order they finish, so the slot must exist before anything nested is read.
    Placeholder(EntryKind),
}

/// One value group: a type encoding and a value for each type in it
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Offset of the group's type encoding in the stream
    pub offset: usize,
    pub types: Vec<TypeDescriptor>,
    pub values: Vec<Value>,
}

/// The payload of an object read without a decode routine
#[derive(Debug, Clone, PartialEq)]
pub struct RawObject {
    pub class: ClassRef,
    pub groups: Vec<Group>,
    /// Offset of the object's end marker
    pub end: usize,
}
