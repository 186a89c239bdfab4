#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

use std::process::ExitCode;

mod app;
mod exporters;

use app::{
    options::{get_command, Options},
    runtime::Config,
};

fn main() -> ExitCode {
    // Get args from command line
    let args = get_command().get_matches();
    // Create application options
    let options = Options::from_args(&args);

    // Create app state and start
    match options {
        Ok(options) => match Config::new(options) {
            Ok(app) => match app.start() {
                Ok(()) => ExitCode::SUCCESS,
                Err(why) => {
                    eprintln!("Unable to dump archive: {why}");
                    ExitCode::FAILURE
                }
            },
            Err(why) => {
                eprintln!("Unable to read archive: {why}");
                ExitCode::FAILURE
            }
        },
        Err(why) => {
            eprintln!("{why}");
            ExitCode::FAILURE
        }
    }
}
