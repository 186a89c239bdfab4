/*!
 Contains logic to decode values from a `typedstream` in a single pass.

 Logic referenced from `typedstream` source located at:
   - [`typedstream.h`](https://opensource.apple.com/source/gcc/gcc-1493/libobjc/objc/typedstream.h.auto.html)
   - [`archive.c`](https://opensource.apple.com/source/gcc/gcc-5484/libobjc/archive.c.auto.html)
   - [`objc/typedstream.m`](https://archive.org/details/darwin_0.1)
*/

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::{
    error::typedstream::TypedStreamError,
    typedstream::{
        coder::Coder,
        cursor::{Cursor, END, EMPTY, REFERENCE_BASE, START},
        models::{
            Archivable, Class, ClassRecord, ClassRef, EntryKind, Group, Header, ObjectRecord,
            ObjectRef, RawObject, Value,
        },
        registry::{ClassRegistry, DecodableRegistry},
        table::{ReferenceTable, SharedStrings},
        types::{encoding_of, parse_type_encoding, TypeDescriptor, DEFAULT_MAX_DEPTH},
    },
};

/// Contains logic and data used to decode data from a `typedstream`
///
/// Objects are handed to the decode routine registered for their class as soon as they are
/// encountered; with [`TypedStreamReader::read_document`] they are instead collected as raw
/// [`Group`]s for later use.
#[derive(Debug)]
pub struct TypedStreamReader<'a> {
    /// Position in the `typedstream` we want to decode
    cursor: Cursor<'a>,
    header: Header,
    /// Type encodings, class names, and selectors seen so far
    strings: SharedStrings,
    /// C strings, classes, and objects seen so far
    table: ReferenceTable,
    classes: ClassRegistry,
    routines: DecodableRegistry,
    /// When set, object payloads are stored here instead of being dispatched
    collected: Option<BTreeMap<usize, RawObject>>,
    /// Number of objects currently being decoded by a routine
    open_objects: usize,
    /// Set once any decode call fails; the stream position can no longer be trusted
    failed: bool,
    depth: usize,
    max_depth: usize,
}

impl<'a> TypedStreamReader<'a> {
    /// Validate the header and prepare to decode the rest of the stream
    pub fn new(stream: &'a [u8]) -> Result<Self, TypedStreamError> {
        Self::with_registries(
            stream,
            ClassRegistry::default(),
            DecodableRegistry::default(),
            DEFAULT_MAX_DEPTH,
        )
    }

    pub fn with_registries(
        stream: &'a [u8],
        classes: ClassRegistry,
        routines: DecodableRegistry,
        max_depth: usize,
    ) -> Result<Self, TypedStreamError> {
        let mut cursor = Cursor::new(stream);
        let header = cursor.read_header()?;
        Ok(Self {
            cursor,
            header,
            strings: SharedStrings::default(),
            table: ReferenceTable::default(),
            classes,
            routines,
            collected: None,
            open_objects: 0,
            failed: false,
            depth: 0,
            max_depth,
        })
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn routines_mut(&mut self) -> &mut DecodableRegistry {
        &mut self.routines
    }

    pub(crate) fn decode_class_name(&mut self, archived: &str, local: &str) {
        self.classes.decode_class_name(archived, local);
        self.table.set_dispatch_name(archived, local);
    }

    pub(crate) fn into_table(self) -> ReferenceTable {
        self.table
    }

    /// Read every value group in the stream without invoking any decode routines
    pub(crate) fn read_document(
        mut self,
    ) -> Result<(Vec<Group>, ReferenceTable, BTreeMap<usize, RawObject>), TypedStreamError> {
        self.collected = Some(BTreeMap::new());
        let mut groups = vec![];
        while !self.cursor.is_at_end() {
            groups.push(self.read_group()?);
        }
        Ok((groups, self.table, self.collected.unwrap_or_default()))
    }

    /// Run `f` one nesting level deeper, failing once the configured limit is reached
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, TypedStreamError>,
    ) -> Result<T, TypedStreamError> {
        if self.depth >= self.max_depth {
            return Err(TypedStreamError::NestingTooDeep(self.max_depth));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Finish reading a back-reference number whose head byte was already consumed
    fn read_reference(&mut self, head: u8, offset: usize) -> Result<usize, TypedStreamError> {
        let number = self.cursor.integer_from_head(head, offset, true)?;
        usize::try_from(number - REFERENCE_BASE)
            .map_err(|_| TypedStreamError::UnknownStreamMarker(head, offset))
    }

    /// Read a string that can be referenced later, i.e. a type encoding or class name
    fn read_shared_string(&mut self) -> Result<Option<String>, TypedStreamError> {
        let offset = self.cursor.position();
        match self.cursor.read_byte()? {
            EMPTY => Ok(None),
            START => {
                let length = self.cursor.read_length()?;
                let string = self.cursor.read_string(length)?;
                self.strings.push(string.clone());
                Ok(Some(string))
            }
            head => {
                let index = self.read_reference(head, offset)?;
                Ok(Some(self.strings.resolve(index)?.to_string()))
            }
        }
    }

    /// Read a `char *`, which is stored in the reference table
    fn read_cstring(&mut self) -> Result<Value, TypedStreamError> {
        let offset = self.cursor.position();
        match self.cursor.read_byte()? {
            EMPTY => Ok(Value::Nil),
            START => {
                let index = self.table.reserve(EntryKind::CString);
                match self.read_shared_string()? {
                    Some(string) => {
                        self.table.fill(index, Archivable::CString(string.clone()));
                        Ok(Value::String(string))
                    }
                    None => Err(TypedStreamError::UnknownStreamMarker(EMPTY, offset + 1)),
                }
            }
            head => {
                let index = self.read_reference(head, offset)?;
                Ok(Value::String(self.table.resolve_cstring(index)?.to_string()))
            }
        }
    }

    /// Read a class and its inheritance chain, registering every newly defined class
    fn read_class(&mut self) -> Result<Option<ClassRef>, TypedStreamError> {
        let offset = self.cursor.position();
        match self.cursor.read_byte()? {
            EMPTY => Ok(None),
            START => {
                let name_offset = self.cursor.position();
                let name = self
                    .read_shared_string()?
                    .ok_or(TypedStreamError::UnknownStreamMarker(EMPTY, name_offset))?;
                let version = self.cursor.read_variable_int(true)?;
                let version = u64::try_from(version)
                    .map_err(|_| TypedStreamError::IntegerOutOfRange(version, "u64"))?;

                let index = self.table.reserve(EntryKind::Class);
                let superclass = self.nested(|reader| reader.read_class())?;

                let mut ancestors = vec![];
                if let Some(parent) = superclass.and_then(|parent| self.table.class(parent)) {
                    ancestors.push(parent.class.clone());
                    ancestors.extend(parent.ancestors.iter().cloned());
                }

                let dispatch_name = self.classes.dispatch_name(&name);
                debug!("Registered class {name} v{version} at {index}, dispatching to {dispatch_name}");
                self.table.fill(
                    index,
                    Archivable::Class(ClassRecord {
                        class: Class::new(name, version),
                        ancestors,
                        superclass,
                        dispatch_name,
                    }),
                );
                Ok(Some(ClassRef(index)))
            }
            head => {
                let index = self.read_reference(head, offset)?;
                self.table.resolve_class(index).map(Some)
            }
        }
    }

    /// Read an object into the table and emit its handle, or emit the handle of an already-seen object
    fn read_object(&mut self) -> Result<Value, TypedStreamError> {
        let offset = self.cursor.position();
        match self.cursor.read_byte()? {
            EMPTY => Ok(Value::Nil),
            START => {
                // Reserve the slot first so references to this object from inside its own
                // payload resolve to it instead of recursing
                let index = self.table.reserve(EntryKind::Object);
                let class = self
                    .read_class()?
                    .ok_or(TypedStreamError::UnregisteredClassVersion(index))?;
                self.table.fill(
                    index,
                    Archivable::Object(ObjectRecord { class, value: None }),
                );

                if self.collected.is_some() {
                    self.collect_object(index, class)?;
                } else {
                    self.dispatch_object(index, class)?;
                }
                Ok(Value::Object(ObjectRef(index)))
            }
            head => {
                let index = self.read_reference(head, offset)?;
                self.table.resolve_object(index).map(Value::Object)
            }
        }
    }

    /// Hand an object's payload to the decode routine registered for its class
    fn dispatch_object(&mut self, index: usize, class: ClassRef) -> Result<(), TypedStreamError> {
        let dispatch_name = self
            .table
            .class(class)
            .map(|record| record.dispatch_name.clone())
            .ok_or(TypedStreamError::UnregisteredClassVersion(class.0))?;
        let routine = self.routines.get(&dispatch_name)?;
        debug!("Decoding object {index} with {dispatch_name}");

        self.open_objects += 1;
        let value = self.nested(|reader| routine.decode_from(reader));
        self.open_objects -= 1;
        let value = value?;
        // A routine that ignored an error left the cursor somewhere inside the payload
        if self.failed {
            return Err(TypedStreamError::SessionFailed);
        }

        let end = self.cursor.position();
        if self.cursor.read_byte()? != END {
            return Err(TypedStreamError::MissingEndOfObject(end));
        }

        self.table.fill(
            index,
            Archivable::Object(ObjectRecord {
                class,
                value: Some(value),
            }),
        );
        Ok(())
    }

    /// Store an object's payload as raw groups
    fn collect_object(&mut self, index: usize, class: ClassRef) -> Result<(), TypedStreamError> {
        let mut groups = vec![];
        while self.cursor.peek_byte()? != END {
            groups.push(self.nested(|reader| reader.read_group())?);
        }
        let end = self.cursor.position();
        self.cursor.read_byte()?;

        if let Some(collected) = self.collected.as_mut() {
            collected.insert(index, RawObject { class, groups, end });
        }
        Ok(())
    }

    /// Read a value group's type encoding
    fn read_encoding(&mut self) -> Result<Vec<TypeDescriptor>, TypedStreamError> {
        let offset = self.cursor.position();
        let encoding = self
            .read_shared_string()?
            .ok_or(TypedStreamError::UnknownStreamMarker(EMPTY, offset))?;
        parse_type_encoding(&encoding, self.max_depth)
    }

    /// Read a value group whose types are taken from the stream
    pub(crate) fn read_group(&mut self) -> Result<Group, TypedStreamError> {
        let offset = self.cursor.position();
        let types = self.read_encoding()?;
        trace!("Reading {} at {offset:x}", encoding_of(&types));
        let values = types
            .iter()
            .map(|value_type| self.read_value(value_type))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Group {
            offset,
            types,
            values,
        })
    }

    /// Given a [`TypeDescriptor`], look at the stream and decode the data it describes
    pub(crate) fn read_value(
        &mut self,
        value_type: &TypeDescriptor,
    ) -> Result<Value, TypedStreamError> {
        match value_type {
            TypeDescriptor::Bool => Ok(Value::Bool(self.cursor.read_byte()? != 0)),
            TypeDescriptor::Integer {
                width: 1,
                signed: true,
            } => Ok(Value::SignedInteger(self.cursor.read_byte()? as i8 as i64)),
            TypeDescriptor::Integer {
                width: 1,
                signed: false,
            } => Ok(Value::UnsignedInteger(self.cursor.read_byte()? as u64)),
            TypeDescriptor::Integer { width, signed } => {
                let value = self.cursor.read_variable_int(*signed)?;
                integer_value(value, *width, *signed)
            }
            TypeDescriptor::Float { width: 4 } => Ok(Value::Float(self.cursor.read_float()?)),
            TypeDescriptor::Float { .. } => Ok(Value::Double(self.cursor.read_double()?)),
            TypeDescriptor::CString => self.read_cstring(),
            TypeDescriptor::Atom => Ok(self
                .read_shared_string()?
                .map(Value::String)
                .unwrap_or(Value::Nil)),
            TypeDescriptor::Selector => Ok(self
                .read_shared_string()?
                .map(Value::Selector)
                .unwrap_or(Value::Nil)),
            TypeDescriptor::Bytes => {
                let length = self.cursor.read_length()?;
                Ok(Value::Bytes(self.cursor.read_raw(length)?.to_vec()))
            }
            TypeDescriptor::Class => Ok(self
                .read_class()?
                .map(Value::Class)
                .unwrap_or(Value::Nil)),
            TypeDescriptor::Object => self.nested(|reader| reader.read_object()),
            TypeDescriptor::Array { element, count } => {
                // Bound the element count by the bytes left before reading anything
                let needed = element.min_size().saturating_mul(*count);
                if needed > self.cursor.remaining() {
                    return Err(TypedStreamError::UnexpectedEndOfStream(
                        self.cursor.position().saturating_add(needed),
                        self.cursor.len(),
                    ));
                }
                self.read_array(element, *count)
            }
            TypeDescriptor::Struct { fields, .. } => self.nested(|reader| {
                fields
                    .iter()
                    .map(|field| reader.read_value(&field.field_type))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Struct)
            }),
            TypeDescriptor::Pointer(pointee) => self.nested(|reader| {
                Ok(Value::Pointer(Box::new(reader.read_value(pointee)?)))
            }),
        }
    }

    /// Read the next value group, checking its encoding against the requested types
    fn read_requested(
        &mut self,
        types: &[TypeDescriptor],
    ) -> Result<Vec<Value>, TypedStreamError> {
        if self.open_objects == 0 && self.cursor.is_at_end() {
            return Err(TypedStreamError::PastEndOfStream);
        }

        let offset = self.cursor.position();
        let found = self.read_encoding()?;
        if found.len() != types.len()
            || !found.iter().zip(types).all(|(found, wanted)| found.matches(wanted))
        {
            return Err(TypedStreamError::TypeMismatch {
                expected: encoding_of(types),
                found: encoding_of(&found),
            });
        }
        trace!("Decoding {} at {offset:x}", encoding_of(types));

        types
            .iter()
            .map(|value_type| self.read_value(value_type))
            .collect()
    }

    fn read_array(
        &mut self,
        element: &TypeDescriptor,
        count: usize,
    ) -> Result<Value, TypedStreamError> {
        match element {
            // Character arrays are stored as raw bytes
            TypeDescriptor::Integer { width: 1, .. } => {
                Ok(Value::Bytes(self.cursor.read_raw(count)?.to_vec()))
            }
            element => self.nested(|reader| {
                let mut values = vec![];
                for _ in 0..count {
                    values.push(reader.read_value(element)?);
                }
                Ok(Value::Array(values))
            }),
        }
    }
}

/// Check that an integer fits the declared width and wrap it in the matching container
pub(crate) fn integer_value(
    value: i64,
    width: usize,
    signed: bool,
) -> Result<Value, TypedStreamError> {
    let bits = (width * 8).min(64) as u32;
    let out_of_range = || {
        TypedStreamError::IntegerOutOfRange(value, TypeDescriptor::integer_name(width, signed))
    };
    if signed {
        let min = i64::MIN >> (64 - bits);
        let max = i64::MAX >> (64 - bits);
        if value < min || value > max {
            return Err(out_of_range());
        }
        Ok(Value::SignedInteger(value))
    } else {
        let max = u64::MAX >> (64 - bits);
        u64::try_from(value)
            .ok()
            .filter(|value| *value <= max)
            .map(Value::UnsignedInteger)
            .ok_or_else(out_of_range)
    }
}

impl Coder for TypedStreamReader<'_> {
    fn decode_values_of_types(
        &mut self,
        types: &[TypeDescriptor],
    ) -> Result<Vec<Value>, TypedStreamError> {
        if self.failed {
            return Err(TypedStreamError::SessionFailed);
        }
        let result = self.read_requested(types);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn is_at_end(&self) -> bool {
        self.cursor.is_at_end()
    }

    fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    fn table(&self) -> &ReferenceTable {
        &self.table
    }
}
