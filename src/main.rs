use std::{path::PathBuf, process::ExitCode};

use crate::shell::{run_script, start_shell};

mod disk;
mod fs;
mod shell;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(script) => match run_script(&script) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: Cannot run command file {}: {}", script.display(), e);
                ExitCode::FAILURE
            }
        },
        None => {
            start_shell();
            ExitCode::SUCCESS
        }
    }
}
