use base64::{prelude::BASE64_STANDARD, Engine};
use json::{from, object, JsonValue};

use typedstream_unarchiver::typedstream::models::{Archivable, ByteOrder, Group, RawObject, Value};

use crate::{
    app::runtime::Config,
    exporters::exporter::{encoding, Exporter},
};

pub struct JSON<'a> {
    /// Data that is setup from the application's runtime
    pub config: &'a Config,
}

impl<'a> Exporter<'a> for JSON<'a> {
    fn new(config: &'a Config) -> Self {
        JSON { config }
    }

    fn render(&self) -> String {
        let document = &self.config.document;
        let byte_order = match document.header.byte_order {
            ByteOrder::Little => "little",
            ByteOrder::Big => "big",
        };

        let mut objects = object! {};
        for (index, raw) in &document.objects {
            objects[index.to_string()] = self.format_object(raw);
        }

        let mut out = object! {
            header: object! {
                streamer_version: document.header.streamer_version,
                byte_order: byte_order,
                system_version: document.header.system_version,
            },
            length: document.len,
            groups: JsonValue::Array(document.groups.iter().map(|group| self.format_group(group)).collect()),
            objects: objects,
        };

        if self.config.options.include_table {
            out["table"] = JsonValue::Array(
                document
                    .table
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| self.format_entry(index, entry))
                    .collect(),
            );
        }
        out.pretty(2)
    }
}

impl JSON<'_> {
    fn format_group(&self, group: &Group) -> JsonValue {
        object! {
            offset: group.offset,
            encoding: encoding(&group.types),
            values: self.format_values(&group.values),
        }
    }

    fn format_object(&self, raw: &RawObject) -> JsonValue {
        object! {
            class: raw.class.0,
            end: raw.end,
            groups: JsonValue::Array(raw.groups.iter().map(|group| self.format_group(group)).collect()),
        }
    }

    fn format_values(&self, values: &[Value]) -> JsonValue {
        JsonValue::Array(values.iter().map(|value| self.format_value(value)).collect())
    }

    fn format_value(&self, value: &Value) -> JsonValue {
        match value {
            Value::Nil => JsonValue::Null,
            Value::Bool(value) => from(*value),
            Value::SignedInteger(value) => from(*value),
            Value::UnsignedInteger(value) => from(*value),
            Value::Float(value) => from(*value),
            Value::Double(value) => from(*value),
            Value::String(text) => from(text.as_str()),
            Value::Selector(name) => object! { selector: name.as_str() },
            Value::Bytes(bytes) => object! { bytes: BASE64_STANDARD.encode(bytes) },
            Value::Array(values) => self.format_values(values),
            Value::Struct(values) => object! { fields: self.format_values(values) },
            Value::Pointer(pointee) => object! { pointer: self.format_value(pointee) },
            Value::Class(class) => object! { class: class.0 },
            Value::Object(object) => object! { object: object.0 },
        }
    }

    fn format_entry(&self, index: usize, entry: &Archivable) -> JsonValue {
        match entry {
            Archivable::CString(text) => object! {
                index: index,
                kind: "cstring",
                value: text.as_str(),
            },
            Archivable::Class(record) => object! {
                index: index,
                kind: "class",
                name: record.class.name.as_str(),
                version: record.class.version,
                superclass: record.superclass.map(|superclass| superclass.0),
                decoded_as: record.dispatch_name.as_str(),
            },
            Archivable::Object(record) => object! {
                index: index,
                kind: "object",
                class: record.class.0,
            },
            Archivable::Placeholder(kind) => object! {
                index: index,
                kind: "placeholder",
                of: format!("{kind:?}"),
            },
        }
    }
}
