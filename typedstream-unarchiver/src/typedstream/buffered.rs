/*!
 A backend that reads the whole archive up front and serves decode calls from memory.

 Because every value in a `typedstream` is preceded by its type encoding, the stream can be parsed
 without knowing anything about the classes it contains. The result, an [`ArchiveDocument`], is
 useful on its own for inspecting unknown archives.
*/

use std::collections::{BTreeMap, VecDeque};

use log::debug;

use crate::{
    error::typedstream::TypedStreamError,
    typedstream::{
        coder::Coder,
        cursor::END,
        models::{Archivable, Group, Header, ObjectRecord, ObjectRef, RawObject, Value},
        parser::TypedStreamReader,
        registry::{ClassRegistry, DecodableRegistry},
        table::ReferenceTable,
        types::{encoding_of, TypeDescriptor, DEFAULT_MAX_DEPTH},
    },
};

/// The generic content of an archive: its top-level value groups, the reference table, and the
/// payload of every object
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveDocument {
    pub header: Header,
    /// Length of the archive in bytes
    pub len: usize,
    pub groups: Vec<Group>,
    /// C strings and classes, plus an [`ObjectRecord`] without a value for every object
    pub table: ReferenceTable,
    /// Object payloads keyed by reference table index
    pub objects: BTreeMap<usize, RawObject>,
}

impl ArchiveDocument {
    /// Parse an entire archive without invoking any decode routines
    pub fn parse(stream: &[u8], max_depth: usize) -> Result<Self, TypedStreamError> {
        Self::parse_with_classes(stream, ClassRegistry::default(), max_depth)
    }

    pub(crate) fn parse_with_classes(
        stream: &[u8],
        classes: ClassRegistry,
        max_depth: usize,
    ) -> Result<Self, TypedStreamError> {
        let reader = TypedStreamReader::with_registries(
            stream,
            classes,
            DecodableRegistry::default(),
            max_depth,
        )?;
        let header = reader.header();
        let (groups, table, objects) = reader.read_document()?;
        debug!(
            "Parsed {} groups, {} table entries, {} objects",
            groups.len(),
            table.len(),
            objects.len()
        );
        Ok(Self {
            header,
            len: stream.len(),
            groups,
            table,
            objects,
        })
    }
}

/// Value groups that have not been handed out yet, for the top level or one object
#[derive(Debug)]
struct Frame {
    groups: VecDeque<Group>,
    /// Offset just past the last group
    end: usize,
}

impl Frame {
    fn offset(&self) -> usize {
        self.groups
            .front()
            .map(|group| group.offset)
            .unwrap_or(self.end)
    }
}

/// Serves decode calls from an [`ArchiveDocument`]
///
/// Objects are handed to their decode routine the first time a decoded value refers to them, in
/// the same order a single-pass decode would, so both produce identical reference tables.
#[derive(Debug)]
pub struct BufferedReader {
    header: Header,
    len: usize,
    table: ReferenceTable,
    /// Payloads of objects that have not been decoded yet
    pending: BTreeMap<usize, RawObject>,
    /// The top level, then one frame per object being decoded
    frames: Vec<Frame>,
    classes: ClassRegistry,
    routines: DecodableRegistry,
    /// Set once any decode call fails
    failed: bool,
    depth: usize,
    max_depth: usize,
}

impl BufferedReader {
    pub fn new(stream: &[u8]) -> Result<Self, TypedStreamError> {
        Self::with_registries(
            stream,
            ClassRegistry::default(),
            DecodableRegistry::default(),
            DEFAULT_MAX_DEPTH,
        )
    }

    pub fn with_registries(
        stream: &[u8],
        classes: ClassRegistry,
        routines: DecodableRegistry,
        max_depth: usize,
    ) -> Result<Self, TypedStreamError> {
        let document = ArchiveDocument::parse_with_classes(stream, classes.clone(), max_depth)?;
        Ok(Self::from_document(document, classes, routines, max_depth))
    }

    pub fn from_document(
        document: ArchiveDocument,
        classes: ClassRegistry,
        routines: DecodableRegistry,
        max_depth: usize,
    ) -> Self {
        let mut table = document.table;
        classes
            .iter()
            .for_each(|(archived, local)| table.set_dispatch_name(archived, local));
        Self {
            header: document.header,
            len: document.len,
            table,
            pending: document.objects,
            frames: vec![Frame {
                groups: document.groups.into(),
                end: document.len,
            }],
            classes,
            routines,
            failed: false,
            depth: 0,
            max_depth,
        }
    }

    pub fn header(&self) -> Header {
        self.header
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

    /// Decode every object a value refers to that has not been decoded yet
    fn materialize_value(&mut self, value: &Value) -> Result<(), TypedStreamError> {
        let mut objects = vec![];
        value.objects(&mut objects);
        objects
            .into_iter()
            .try_for_each(|object| self.materialize(object))
    }

    /// Hand an object's payload to the decode routine registered for its class
    ///
    /// An object that is already in progress is left alone; its handle is all a cycle needs.
    fn materialize(&mut self, object: ObjectRef) -> Result<(), TypedStreamError> {
        let Some(raw) = self.pending.remove(&object.0) else {
            return Ok(());
        };
        let dispatch_name = self
            .table
            .class(raw.class)
            .map(|record| record.dispatch_name.clone())
            .ok_or(TypedStreamError::UnregisteredClassVersion(raw.class.0))?;
        let routine = self.routines.get(&dispatch_name)?;
        debug!("Decoding object {} with {dispatch_name}", object.0);

        self.frames.push(Frame {
            groups: raw.groups.into(),
            end: raw.end,
        });
        let value = self.nested(|reader| routine.decode_from(reader));
        let frame = self.frames.pop();
        let value = value?;
        if self.failed {
            return Err(TypedStreamError::SessionFailed);
        }

        if let Some(leftover) = frame.and_then(|frame| frame.groups.front().map(|group| group.offset)) {
            return Err(TypedStreamError::MissingEndOfObject(leftover));
        }

        self.table.fill(
            object.0,
            Archivable::Object(ObjectRecord {
                class: raw.class,
                value: Some(value),
            }),
        );
        Ok(())
    }

    /// Hand out the next value group of the current frame, checking it against the requested types
    fn next_group(&mut self, types: &[TypeDescriptor]) -> Result<Vec<Value>, TypedStreamError> {
        let in_object = self.frames.len() > 1;
        let frame = self
            .frames
            .last_mut()
            .ok_or(TypedStreamError::PastEndOfStream)?;
        let group = match frame.groups.pop_front() {
            Some(group) => group,
            // Reading past an object's payload runs into its end marker
            None if in_object => {
                return Err(TypedStreamError::UnknownStreamMarker(END, frame.end))
            }
            None => return Err(TypedStreamError::PastEndOfStream),
        };

        if group.types.len() != types.len()
            || !group
                .types
                .iter()
                .zip(types)
                .all(|(found, wanted)| found.matches(wanted))
        {
            return Err(TypedStreamError::TypeMismatch {
                expected: encoding_of(types),
                found: encoding_of(&group.types),
            });
        }

        for value in &group.values {
            self.materialize_value(value)?;
        }
        Ok(group.values)
    }
}

impl Coder for BufferedReader {
    fn decode_values_of_types(
        &mut self,
        types: &[TypeDescriptor],
    ) -> Result<Vec<Value>, TypedStreamError> {
        if self.failed {
            return Err(TypedStreamError::SessionFailed);
        }
        let result = self.next_group(types);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn is_at_end(&self) -> bool {
        self.frames.len() == 1 && self.frames.iter().all(|frame| frame.groups.is_empty())
    }

    fn remaining(&self) -> usize {
        self.frames
            .last()
            .map(|frame| self.len - frame.offset())
            .unwrap_or(0)
    }

    fn table(&self) -> &ReferenceTable {
        &self.table
    }
}
