use std::collections::BTreeSet;

use typedstream_unarchiver::typedstream::models::{
    Archivable, ByteOrder, Group, ObjectRef, Value,
};

use crate::{
    app::runtime::Config,
    exporters::exporter::{class_label, encoding, object_refs, Exporter},
};

const INDENT: &str = "    ";

pub struct TXT<'a> {
    /// Data that is setup from the application's runtime
    pub config: &'a Config,
}

impl<'a> Exporter<'a> for TXT<'a> {
    fn new(config: &'a Config) -> Self {
        TXT { config }
    }

    fn render(&self) -> String {
        let document = &self.config.document;
        let byte_order = match document.header.byte_order {
            ByteOrder::Little => "little endian",
            ByteOrder::Big => "big endian",
        };
        let mut out = format!(
            "typedstream v{}, {byte_order}, system version {}, {} bytes\n",
            document.header.streamer_version, document.header.system_version, document.len
        );

        // Each object's payload is printed once, where it is first referenced
        let mut printed = BTreeSet::new();
        for group in &document.groups {
            self.format_group(group, 0, &mut printed, &mut out);
        }

        if self.config.options.include_table {
            out.push_str("\nReference table:\n");
            for (index, entry) in document.table.iter().enumerate() {
                out.push_str(&format!("{index:>6}  {}\n", self.format_entry(entry)));
            }
        }
        out
    }
}

impl TXT<'_> {
    fn format_group(
        &self,
        group: &Group,
        indent: usize,
        printed: &mut BTreeSet<usize>,
        out: &mut String,
    ) {
        let pad = INDENT.repeat(indent);
        out.push_str(&format!(
            "{pad}{} @ {:#x}\n",
            encoding(&group.types),
            group.offset
        ));
        for value in &group.values {
            out.push_str(&format!("{pad}{INDENT}{}\n", self.format_value(value)));

            let mut objects = vec![];
            object_refs(value, &mut objects);
            for object in objects {
                self.format_object(object, indent + 2, printed, out);
            }
        }
    }

    fn format_object(
        &self,
        object: ObjectRef,
        indent: usize,
        printed: &mut BTreeSet<usize>,
        out: &mut String,
    ) {
        if !printed.insert(object.0) {
            return;
        }
        let Some(raw) = self.config.document.objects.get(&object.0) else {
            return;
        };
        out.push_str(&format!(
            "{}object #{} {}\n",
            INDENT.repeat(indent),
            object.0,
            class_label(&self.config.document.table, raw.class)
        ));
        for group in &raw.groups {
            self.format_group(group, indent + 1, printed, out);
        }
    }

    fn format_value(&self, value: &Value) -> String {
        match value {
            Value::Nil => "nil".to_string(),
            Value::Bool(value) => value.to_string(),
            Value::SignedInteger(value) => value.to_string(),
            Value::UnsignedInteger(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Double(value) => value.to_string(),
            Value::String(text) => format!("{text:?}"),
            Value::Selector(name) => format!("@selector({name})"),
            Value::Bytes(bytes) => format!(
                "<{}>",
                bytes
                    .iter()
                    .map(|byte| format!("{byte:02x}"))
                    .collect::<String>()
            ),
            Value::Array(values) => format!("[{}]", self.format_values(values)),
            Value::Struct(values) => format!("{{{}}}", self.format_values(values)),
            Value::Pointer(pointee) => format!("^{}", self.format_value(pointee)),
            Value::Class(class) => format!(
                "class #{} {}",
                class.0,
                class_label(&self.config.document.table, *class)
            ),
            Value::Object(object) => format!("object #{}", object.0),
        }
    }

    fn format_values(&self, values: &[Value]) -> String {
        values
            .iter()
            .map(|value| self.format_value(value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn format_entry(&self, entry: &Archivable) -> String {
        match entry {
            Archivable::CString(text) => format!("C string {text:?}"),
            Archivable::Class(record) => {
                let superclass = record
                    .superclass
                    .map(|superclass| format!(", superclass #{}", superclass.0))
                    .unwrap_or_default();
                format!(
                    "class {} v{}{superclass}, decoded as {}",
                    record.class.name, record.class.version, record.dispatch_name
                )
            }
            Archivable::Object(record) => format!(
                "object of class #{} {}",
                record.class.0,
                class_label(&self.config.document.table, record.class)
            ),
            Archivable::Placeholder(kind) => format!("unfinished {kind:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use typedstream_unarchiver::typedstream::buffered::ArchiveDocument;

    use crate::{
        app::{
            options::{ExportType, Options},
            runtime::Config,
        },
        exporters::{exporter::Exporter, txt::TXT},
    };

    const STRING_HELLO: &[u8] =
        include_bytes!("../../../typedstream-unarchiver/test_data/typedstream/StringHello");

    fn fake_config(include_table: bool) -> Config {
        Config {
            options: Options {
                archive_path: PathBuf::from("StringHello"),
                export_type: ExportType::Txt,
                include_table,
                max_depth: 16,
            },
            document: ArchiveDocument::parse(STRING_HELLO, 16).unwrap(),
        }
    }

    #[test]
    fn can_render_string() {
        let config = fake_config(false);
        let exporter = TXT::new(&config);

        let expected = concat!(
            "typedstream v4, little endian, system version 1000, 55 bytes\n",
            "@ @ 0x10\n",
            "    object #0\n",
            "        object #0 NSString v1 : NSObject v0\n",
            "            + @ 0x2d\n",
            "                <48656c6c6f>\n",
        );
        assert_eq!(exporter.render(), expected);
    }

    #[test]
    fn can_render_table() {
        let config = fake_config(true);
        let exporter = TXT::new(&config);
        let rendered = exporter.render();

        assert!(rendered.contains("\nReference table:\n"));
        assert!(rendered.contains("     0  object of class #1 NSString v1 : NSObject v0\n"));
        assert!(rendered.contains("     1  class NSString v1, superclass #2, decoded as NSString\n"));
        assert!(rendered.contains("     2  class NSObject v0, decoded as NSObject\n"));
    }
}
