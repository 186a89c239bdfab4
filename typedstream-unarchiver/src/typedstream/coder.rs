/*!
 The decode contract shared by every backend, and the capability host applications implement to
 decode the fields of their own classes.
*/

use crate::{
    error::typedstream::TypedStreamError,
    typedstream::{
        models::Value,
        table::ReferenceTable,
        types::{parse_type_encoding, TypeDescriptor, DEFAULT_MAX_DEPTH},
    },
};

/// Sequential access to the values in a `typedstream`
///
/// Values must be requested in exactly the order they were archived: back-references are
/// positional, so there is no random access.
pub trait Coder {
    /// Decode one value group containing a value for each of `types`
    fn decode_values_of_types(
        &mut self,
        types: &[TypeDescriptor],
    ) -> Result<Vec<Value>, TypedStreamError>;

    /// `true` once the whole stream has been consumed
    fn is_at_end(&self) -> bool;

    /// The number of bytes that have not been decoded yet
    fn remaining(&self) -> usize;

    /// Classes, C strings, and objects decoded so far
    fn table(&self) -> &ReferenceTable;

    /// Decode a single value of the given type
    fn decode_value_of_type(
        &mut self,
        value_type: &TypeDescriptor,
    ) -> Result<Value, TypedStreamError> {
        let values = self.decode_values_of_types(std::slice::from_ref(value_type))?;
        let found = values.len();
        let mut values = values.into_iter();
        match (values.next(), values.next()) {
            (Some(value), None) => Ok(value),
            _ => Err(TypedStreamError::TypeMismatch {
                expected: value_type.to_string(),
                found: format!("{found} values"),
            }),
        }
    }

    /// Decode a value group described by an encoding string such as `"iI"`
    fn decode_encoding(&mut self, encoding: &str) -> Result<Vec<Value>, TypedStreamError> {
        let types = parse_type_encoding(encoding, DEFAULT_MAX_DEPTH)?;
        self.decode_values_of_types(&types)
    }

    /// Decode an object, returning [`Value::Object`] or [`Value::Nil`]
    fn decode_object(&mut self) -> Result<Value, TypedStreamError> {
        self.decode_value_of_type(&TypeDescriptor::Object)
    }

    /// The version a class was archived with, if the class has been seen
    fn version_for_class_name(&self, name: &str) -> Option<u64> {
        self.table().version_for_class_name(name)
    }
}

/// Decode logic for the instances of one class
///
/// The routine pulls the object's fields from the [`Coder`] in the order they were archived and
/// returns whatever [`Value`] represents the object. Errors are passed to the caller unmodified.
pub trait Decodable: Send + Sync {
    fn decode_from(&self, coder: &mut dyn Coder) -> Result<Value, TypedStreamError>;
}

impl<F> Decodable for F
where
    F: Fn(&mut dyn Coder) -> Result<Value, TypedStreamError> + Send + Sync,
{
    fn decode_from(&self, coder: &mut dyn Coder) -> Result<Value, TypedStreamError> {
        self(coder)
    }
}
