//! Log destination choice for the jobscout binary.
//!
//! File output goes to `./jobscout.log` in the current working directory.

use std::path::PathBuf;

use jobscout_logging::LogSinks;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

const LOG_FILE: &str = "./jobscout.log";

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum LogDestination {
    /// Write to ./jobscout.log in current directory.
    #[default]
    File,
    /// Write to the terminal (stderr).
    Terminal,
    /// Write to both file and terminal.
    Both,
}

impl LogDestination {
    pub fn sinks(self) -> LogSinks {
        let file = || Some(PathBuf::from(LOG_FILE));
        match self {
            LogDestination::File => LogSinks {
                terminal: false,
                file: file(),
            },
            LogDestination::Terminal => LogSinks {
                terminal: true,
                file: None,
            },
            LogDestination::Both => LogSinks {
                terminal: true,
                file: file(),
            },
        }
    }
}

/// Initialize the global logger. Later calls are ignored.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    jobscout_logging::initialize(&destination.sinks(), level);
}
