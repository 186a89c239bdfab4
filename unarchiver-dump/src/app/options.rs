use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use clap::{crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches, Command};

use typedstream_unarchiver::typedstream::types::DEFAULT_MAX_DEPTH;

use crate::app::error::RuntimeError;

/// Option constants
pub const OPTION_PATH: &str = "path";
pub const OPTION_FORMAT: &str = "format";
pub const OPTION_TABLE: &str = "table";
pub const OPTION_MAX_DEPTH: &str = "max-depth";

// Other CLI Text
pub const SUPPORTED_FILE_TYPES: &str = "txt, json";
pub const ABOUT: &str = concat!(
    "The `unarchiver-dump` binary prints the contents of a typedstream archive\n",
    "written by NeXTSTEP's NXTypedStream or Foundation's NSArchiver.\n",
    "No decode routines are needed: every value is printed with its type encoding."
);

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    /// Indented plain text
    Txt,
    /// A single JSON document
    Json,
}

impl ExportType {
    /// Given user's input, return a variant if the input matches one
    pub fn from_cli(format: &str) -> Option<Self> {
        match format.to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl Display for ExportType {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExportType::Txt => write!(fmt, "txt"),
            ExportType::Json => write!(fmt, "json"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Options {
    /// Path to the archive we are going to dump
    pub archive_path: PathBuf,
    /// The output format
    pub export_type: ExportType,
    /// If true, also print every entry in the reference table
    pub include_table: bool,
    /// Maximum nesting of types, values, and objects
    pub max_depth: usize,
}

impl Options {
    pub fn from_args(args: &ArgMatches) -> Result<Self, RuntimeError> {
        let archive_path: Option<&String> = args.get_one(OPTION_PATH);
        let export_type: Option<&String> = args.get_one(OPTION_FORMAT);
        let include_table = args.get_flag(OPTION_TABLE);
        let max_depth: Option<&String> = args.get_one(OPTION_MAX_DEPTH);

        let archive_path = archive_path.ok_or_else(|| {
            RuntimeError::InvalidOptions(format!("Option --{OPTION_PATH} is required"))
        })?;

        let export_type = match export_type {
            Some(format) => ExportType::from_cli(format).ok_or_else(|| {
                RuntimeError::InvalidOptions(format!(
                    "{format} is not a valid export type! Must be one of <{SUPPORTED_FILE_TYPES}>"
                ))
            })?,
            None => ExportType::Txt,
        };

        let max_depth = match max_depth {
            Some(depth) => depth
                .parse::<usize>()
                .ok()
                .filter(|depth| *depth > 0)
                .ok_or_else(|| {
                    RuntimeError::InvalidOptions(format!(
                        "{depth} is not a valid nesting depth! Must be a positive integer"
                    ))
                })?,
            None => DEFAULT_MAX_DEPTH,
        };

        Ok(Options {
            archive_path: PathBuf::from(archive_path),
            export_type,
            include_table,
            max_depth,
        })
    }
}

/// Build the command line interface
pub fn get_command() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about(format!("{}\n\n{ABOUT}", crate_description!()))
        .arg_required_else_help(true)
        .arg(
            Arg::new(OPTION_PATH)
            .short('p')
            .long(OPTION_PATH)
            .help("Specify the path to a typedstream archive\n")
            .display_order(0)
            .value_name("path/to/archive"),
        )
        .arg(
            Arg::new(OPTION_FORMAT)
            .short('f')
            .long(OPTION_FORMAT)
            .help("Specify a single output format\nIf omitted, the archive is printed as txt\n")
            .display_order(1)
            .value_name(SUPPORTED_FILE_TYPES),
        )
        .arg(
            Arg::new(OPTION_TABLE)
            .short('t')
            .long(OPTION_TABLE)
            .help("Also print every C string, class, and object in the reference table\n")
            .action(ArgAction::SetTrue)
            .display_order(2),
        )
        .arg(
            Arg::new(OPTION_MAX_DEPTH)
            .short('m')
            .long(OPTION_MAX_DEPTH)
            .help(format!("Maximum nesting of types, values, and objects\nIf omitted, the default is {DEFAULT_MAX_DEPTH}\n"))
            .display_order(3)
            .value_name("depth"),
        )
}
