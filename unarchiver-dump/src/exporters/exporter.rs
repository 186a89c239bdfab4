use typedstream_unarchiver::typedstream::{
    models::{ClassRef, ObjectRef, Value},
    table::ReferenceTable,
    types::TypeDescriptor,
};

use crate::app::runtime::Config;

/// Defines behavior for rendering a parsed archive
pub trait Exporter<'a> {
    /// Create a new exporter with references to the cached data
    fn new(config: &'a Config) -> Self;
    /// Render the whole archive
    fn render(&self) -> String;
}

/// The type encoding of a value group, as written in the archive
pub fn encoding(types: &[TypeDescriptor]) -> String {
    types.iter().map(ToString::to_string).collect()
}

/// Every object handle a value contains, in order
pub fn object_refs(value: &Value, out: &mut Vec<ObjectRef>) {
    match value {
        Value::Object(object) => out.push(*object),
        Value::Array(values) | Value::Struct(values) => {
            values.iter().for_each(|value| object_refs(value, out))
        }
        Value::Pointer(pointee) => object_refs(pointee, out),
        _ => {}
    }
}

/// A class with its inheritance chain, i.e. `NSMutableString v1 : NSString v1 : NSObject v0`
pub fn class_label(table: &ReferenceTable, class: ClassRef) -> String {
    match table.class(class) {
        Some(record) => std::iter::once(&record.class)
            .chain(record.ancestors.iter())
            .map(|class| format!("{} v{}", class.name, class.version))
            .collect::<Vec<_>>()
            .join(" : "),
        None => format!("<unknown class #{}>", class.0),
    }
}
