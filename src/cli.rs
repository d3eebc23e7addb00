// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

use crate::cmd::check::check_folder;
use crate::cmd::history::print_history;
use crate::cmd::record::record_review;
use crate::cmd::schedule::print_schedule;
use crate::config::StoreConfig;
use crate::error::Fallible;
use crate::types::outcome::Outcome;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record the outcome of a card review.
    Record {
        /// The card's checksum.
        checksum: String,
        /// How the review went.
        outcome: Outcome,
        /// Optional path to the workspace folder.
        directory: Option<String>,
        /// The card's recall interval in days.
        #[arg(long, default_value_t = 0)]
        recall: u32,
        /// Toggle the card's archived state before recording.
        #[arg(long)]
        archive: bool,
    },
    /// Print when a card is next due.
    Schedule {
        /// The card's checksum.
        checksum: String,
        /// Optional path to the workspace folder.
        directory: Option<String>,
    },
    /// Print a folder's review history as JSON.
    History {
        /// Optional path to the workspace folder.
        directory: Option<String>,
        /// Only print the history of this card.
        #[arg(long)]
        checksum: Option<String>,
    },
    /// Check that a folder's review logs can be read.
    Check {
        /// Optional path to the workspace folder.
        directory: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => StoreConfig::from_path(path)?,
        None => StoreConfig::default(),
    };
    match cli.command {
        Command::Record {
            checksum,
            outcome,
            directory,
            recall,
            archive,
        } => record_review(config, directory, checksum, outcome, recall, archive).await,
        Command::Schedule {
            checksum,
            directory,
        } => print_schedule(config, directory, checksum).await,
        Command::History {
            directory,
            checksum,
        } => print_history(config, directory, checksum).await,
        Command::Check { directory } => check_folder(config, directory).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_record() {
        let cli = Cli::parse_from([
            "recall",
            "record",
            "abc",
            "struggled",
            "./deck",
            "--recall",
            "4",
            "--archive",
        ]);
        match cli.command {
            Command::Record {
                checksum,
                outcome,
                directory,
                recall,
                archive,
            } => {
                assert_eq!(checksum, "abc");
                assert_eq!(outcome, Outcome::Struggled);
                assert_eq!(directory, Some("./deck".to_string()));
                assert_eq!(recall, 4);
                assert!(archive);
            }
            _ => panic!("expected the record command"),
        }
    }
}
