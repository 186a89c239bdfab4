use std::{
    fs,
    io::{stdout, Write},
};

use typedstream_unarchiver::typedstream::buffered::ArchiveDocument;

use crate::{
    app::{
        error::RuntimeError,
        options::{ExportType, Options},
    },
    exporters::{exporter::Exporter, json::JSON, txt::TXT},
};

/// Stores the application state and handles application lifecycle
pub struct Config {
    /// App configuration options
    pub options: Options,
    /// The parsed archive
    pub document: ArchiveDocument,
}

impl Config {
    /// Read and parse the archive the options point to
    pub fn new(options: Options) -> Result<Config, RuntimeError> {
        let bytes = fs::read(&options.archive_path)
            .map_err(|why| RuntimeError::ReadError(why, options.archive_path.clone()))?;
        let document = ArchiveDocument::parse(&bytes, options.max_depth)
            .map_err(RuntimeError::ArchiveError)?;
        Ok(Config { options, document })
    }

    /// Print the archive in the requested format
    pub fn start(&self) -> Result<(), RuntimeError> {
        let output = match self.options.export_type {
            ExportType::Txt => TXT::new(self).render(),
            ExportType::Json => JSON::new(self).render(),
        };
        let mut handle = stdout().lock();
        writeln!(handle, "{output}").map_err(RuntimeError::WriteError)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::app::{
        error::RuntimeError,
        options::{ExportType, Options},
        runtime::Config,
    };

    fn options(path: &str) -> Options {
        Options {
            archive_path: PathBuf::from(path),
            export_type: ExportType::Txt,
            include_table: false,
            max_depth: 16,
        }
    }

    #[test]
    fn can_load_archive() {
        let config =
            Config::new(options("../typedstream-unarchiver/test_data/typedstream/StringHello"))
                .unwrap();
        assert_eq!(config.document.groups.len(), 1);
        assert_eq!(config.document.table.len(), 3);
    }

    #[test]
    fn cant_load_missing_archive() {
        assert!(matches!(
            Config::new(options("does/not/exist")),
            Err(RuntimeError::ReadError(_, _))
        ));
    }

    #[test]
    fn cant_load_invalid_archive() {
        assert!(matches!(
            Config::new(options("Cargo.toml")),
            Err(RuntimeError::ArchiveError(_))
        ));
    }
}
