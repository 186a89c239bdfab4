/*!
 Append-only tables that back-references in the `typedstream` resolve against.
*/

use crate::{
    error::typedstream::TypedStreamError,
    typedstream::models::{
        Archivable, ClassRecord, ClassRef, EntryKind, ObjectRecord, ObjectRef,
    },
};

/// As we parse the `typedstream`, build a table of seen C strings, classes, and objects to
/// reference in the future
///
/// The first time an entry is seen, it is present in the stream literally, but afterwards it is
/// only referenced by index in order of appearance. Indexes never change once assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    entries: Vec<Archivable>,
}

impl ReferenceTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Archivable> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Archivable> {
        self.entries.iter()
    }

    /// Get a class by handle
    pub fn class(&self, class: ClassRef) -> Option<&ClassRecord> {
        match self.entries.get(class.0) {
            Some(Archivable::Class(record)) => Some(record),
            _ => None,
        }
    }

    /// Get an object by handle; its value is `None` if decoding has not finished
    pub fn object(&self, object: ObjectRef) -> Option<&ObjectRecord> {
        match self.entries.get(object.0) {
            Some(Archivable::Object(record)) => Some(record),
            _ => None,
        }
    }

    /// The class of an object, once its class has been read
    pub fn class_of(&self, object: ObjectRef) -> Option<&ClassRecord> {
        self.object(object).and_then(|record| self.class(record.class))
    }

    /// The archived version of the first class seen with the given name
    pub fn version_for_class_name(&self, name: &str) -> Option<u64> {
        self.entries.iter().find_map(|entry| match entry {
            Archivable::Class(record) if record.class.name == name => Some(record.class.version),
            _ => None,
        })
    }

    /// Reserve the next index for an entry whose payload is about to be read
    pub(crate) fn reserve(&mut self, kind: EntryKind) -> usize {
        self.entries.push(Archivable::Placeholder(kind));
        self.entries.len() - 1
    }

    /// Replace the entry at a reserved index
    pub(crate) fn fill(&mut self, index: usize, entry: Archivable) {
        if let Some(slot) = self.entries.get_mut(index) {
            *slot = entry;
        }
    }

    pub(crate) fn set_dispatch_name(&mut self, archived: &str, local: &str) {
        self.entries.iter_mut().for_each(|entry| {
            if let Archivable::Class(record) = entry {
                if record.class.name == archived {
                    record.dispatch_name = local.to_string();
                }
            }
        });
    }

    /// Resolve a back-reference index
    pub fn resolve(&self, index: usize) -> Result<&Archivable, TypedStreamError> {
        self.entries
            .get(index)
            .ok_or(TypedStreamError::DanglingBackReference(index, self.entries.len()))
    }

    /// Resolve a back-reference to a C string
    pub(crate) fn resolve_cstring(&self, index: usize) -> Result<&str, TypedStreamError> {
        match self.resolve(index)? {
            Archivable::CString(string) => Ok(string),
            _ => Err(TypedStreamError::InvalidReference(
                index,
                EntryKind::CString.name(),
            )),
        }
    }

    /// Resolve a back-reference to a class that has been completely read
    pub(crate) fn resolve_class(&self, index: usize) -> Result<ClassRef, TypedStreamError> {
        match self.resolve(index)? {
            Archivable::Class(_) => Ok(ClassRef(index)),
            _ => Err(TypedStreamError::UnregisteredClassVersion(index)),
        }
    }

    /// Resolve a back-reference to an object, which may still be in progress
    pub(crate) fn resolve_object(&self, index: usize) -> Result<ObjectRef, TypedStreamError> {
        match self.resolve(index)? {
            Archivable::Object(_) | Archivable::Placeholder(EntryKind::Object) => {
                Ok(ObjectRef(index))
            }
            _ => Err(TypedStreamError::InvalidReference(
                index,
                EntryKind::Object.name(),
            )),
        }
    }
}

/// Table of strings shared by reference: type encodings, class names, and selectors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub(crate) fn push(&mut self, string: String) {
        self.strings.push(string);
    }

    pub fn resolve(&self, index: usize) -> Result<&str, TypedStreamError> {
        self.strings
            .get(index)
            .map(String::as_str)
            .ok_or(TypedStreamError::DanglingBackReference(index, self.strings.len()))
    }
}
