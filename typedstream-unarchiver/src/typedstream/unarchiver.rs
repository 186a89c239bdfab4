/*!
 The public entry point for decoding an archive.

 ```no_run
 use typedstream_unarchiver::typedstream::{
     coder::Coder,
     unarchiver::{Unarchiver, UnarchiverOptions},
 };

 let bytes = std::fs::read("archive").unwrap();
 let options = UnarchiverOptions::default()
     .decode_class_name("LegacyDuration", "Duration")
     .register("Duration", |coder: &mut dyn Coder| {
         coder.decode_value_of_type(&"d".parse()?)
     });
 let mut unarchiver = Unarchiver::new(&bytes, options).unwrap();
 let root = unarchiver.decode_object().unwrap();
 ```
*/

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    error::typedstream::TypedStreamError,
    typedstream::{
        buffered::BufferedReader,
        coder::Coder,
        models::{ClassRecord, ClassRef, Header, ObjectRecord, ObjectRef, Value},
        parser::TypedStreamReader,
        registry::{ClassRegistry, DecodableRegistry},
        table::ReferenceTable,
        types::{TypeDescriptor, DEFAULT_MAX_DEPTH},
    },
};

/// Interchangeable decoder implementations; both produce identical object graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Decode directly from the byte stream as values are requested
    #[default]
    Streaming,
    /// Parse the whole archive up front, then serve values from memory
    Buffered,
}

impl Backend {
    /// Given user's input, return a variant if the input matches one
    pub fn from_cli(backend: &str) -> Option<Self> {
        match backend.to_lowercase().as_str() {
            "streaming" => Some(Self::Streaming),
            "buffered" => Some(Self::Buffered),
            _ => None,
        }
    }
}

impl Display for Backend {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Backend::Streaming => write!(fmt, "streaming"),
            Backend::Buffered => write!(fmt, "buffered"),
        }
    }
}

/// Settings for a decode session
#[derive(Debug, Clone)]
pub struct UnarchiverOptions {
    pub backend: Backend,
    /// Maximum nesting of types, values, and objects
    pub max_depth: usize,
    pub classes: ClassRegistry,
    pub routines: DecodableRegistry,
}

impl Default for UnarchiverOptions {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            classes: ClassRegistry::default(),
            routines: DecodableRegistry::default(),
        }
    }
}

impl UnarchiverOptions {
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Decode instances archived as `archived` with the routine registered for `local`
    pub fn decode_class_name(mut self, archived: &str, local: &str) -> Self {
        self.classes.decode_class_name(archived, local);
        self
    }

    /// Register the routine that decodes instances dispatched to `name`
    pub fn register<F>(mut self, name: &str, routine: F) -> Self
    where
        F: Fn(&mut dyn Coder) -> Result<Value, TypedStreamError> + Send + Sync + 'static,
    {
        self.routines.register(name, routine);
        self
    }
}

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been decoded yet
    Created,
    Decoding,
    /// Every byte has been consumed
    AtEnd,
    /// A decode failed; the rest of the stream cannot be trusted
    Failed,
}

enum Reader<'a> {
    Streaming(TypedStreamReader<'a>),
    Buffered(BufferedReader),
}

/// A decode session over one archive
pub struct Unarchiver<'a> {
    data: &'a [u8],
    backend: Backend,
    reader: Reader<'a>,
    started: bool,
    failed: bool,
}

impl<'a> Unarchiver<'a> {
    /// Validate the header and prepare a session with the selected backend
    pub fn new(data: &'a [u8], options: UnarchiverOptions) -> Result<Self, TypedStreamError> {
        let reader = match options.backend {
            Backend::Streaming => Reader::Streaming(TypedStreamReader::with_registries(
                data,
                options.classes,
                options.routines,
                options.max_depth,
            )?),
            Backend::Buffered => Reader::Buffered(BufferedReader::with_registries(
                data,
                options.classes,
                options.routines,
                options.max_depth,
            )?),
        };
        Ok(Self {
            data,
            backend: options.backend,
            reader,
            started: false,
            failed: false,
        })
    }

    /// The archive this session decodes
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn header(&self) -> Header {
        match &self.reader {
            Reader::Streaming(reader) => reader.header(),
            Reader::Buffered(reader) => reader.header(),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.failed {
            SessionState::Failed
        } else if self.coder().is_at_end() {
            SessionState::AtEnd
        } else if self.started {
            SessionState::Decoding
        } else {
            SessionState::Created
        }
    }

    fn coder(&self) -> &dyn Coder {
        match &self.reader {
            Reader::Streaming(reader) => reader,
            Reader::Buffered(reader) => reader,
        }
    }

    fn coder_mut(&mut self) -> &mut dyn Coder {
        match &mut self.reader {
            Reader::Streaming(reader) => reader,
            Reader::Buffered(reader) => reader,
        }
    }

    /// Decode instances archived as `archived` with the routine registered for `local`
    ///
    /// Only allowed before the first decode call.
    pub fn decode_class_name(&mut self, archived: &str, local: &str) -> Result<(), TypedStreamError> {
        if self.started {
            return Err(TypedStreamError::DecodeInProgress);
        }
        match &mut self.reader {
            Reader::Streaming(reader) => reader.decode_class_name(archived, local),
            Reader::Buffered(reader) => reader.decode_class_name(archived, local),
        }
        Ok(())
    }

    /// Register the routine that decodes instances dispatched to `name`
    ///
    /// Only allowed before the first decode call.
    pub fn register<F>(&mut self, name: &str, routine: F) -> Result<(), TypedStreamError>
    where
        F: Fn(&mut dyn Coder) -> Result<Value, TypedStreamError> + Send + Sync + 'static,
    {
        if self.started {
            return Err(TypedStreamError::DecodeInProgress);
        }
        match &mut self.reader {
            Reader::Streaming(reader) => reader.routines_mut().register(name, routine),
            Reader::Buffered(reader) => reader.routines_mut().register(name, routine),
        }
        Ok(())
    }

    /// Get an object by handle
    pub fn object(&self, object: ObjectRef) -> Option<&ObjectRecord> {
        self.table().object(object)
    }

    /// Get a class by handle
    pub fn class(&self, class: ClassRef) -> Option<&ClassRecord> {
        self.table().class(class)
    }

    /// End the session, keeping the decoded graph
    pub fn into_table(self) -> ReferenceTable {
        match self.reader {
            Reader::Streaming(reader) => reader.into_table(),
            Reader::Buffered(reader) => reader.into_table(),
        }
    }
}

impl Coder for Unarchiver<'_> {
    fn decode_values_of_types(
        &mut self,
        types: &[TypeDescriptor],
    ) -> Result<Vec<Value>, TypedStreamError> {
        if self.failed {
            return Err(TypedStreamError::SessionFailed);
        }
        if self.coder().is_at_end() {
            return Err(TypedStreamError::PastEndOfStream);
        }
        self.started = true;
        let result = self.coder_mut().decode_values_of_types(types);
        self.failed = result.is_err();
        result
    }

    fn is_at_end(&self) -> bool {
        self.coder().is_at_end()
    }

    fn remaining(&self) -> usize {
        self.coder().remaining()
    }

    fn table(&self) -> &ReferenceTable {
        self.coder().table()
    }
}

/// The root object of an archive and the graph it refers to
#[derive(Debug, Clone, PartialEq)]
pub struct UnarchivedGraph {
    pub root: Value,
    pub table: ReferenceTable,
}

impl UnarchivedGraph {
    /// The decoded value of the root object, if the root is an object
    pub fn root_value(&self) -> Option<&Value> {
        self.root
            .as_object()
            .and_then(|root| self.table.object(root))
            .and_then(|record| record.value.as_ref())
    }
}

/// Decode the root object of an archive in one call
pub fn unarchive_root_object(
    data: &[u8],
    options: UnarchiverOptions,
) -> Result<UnarchivedGraph, TypedStreamError> {
    let mut unarchiver = Unarchiver::new(data, options)?;
    let root = unarchiver.decode_object()?;
    Ok(UnarchivedGraph {
        root,
        table: unarchiver.into_table(),
    })
}
