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

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::history::schedule::SchedulePolicy;

/// Settings for the history store. Every field has a default, so an empty
/// file is a valid configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct StoreConfig {
    /// The name of the reserved subdirectory that holds a folder's logs.
    pub log_dir: String,
    /// Prefix of each daily log file name.
    pub file_prefix: String,
    /// Extension of each daily log file name, without the dot.
    pub file_extension: String,
    /// How long closing a folder may wait for its writer to drain. Must be
    /// positive: rows still queued when it runs out are lost.
    pub close_timeout_ms: u64,
    /// How the next review date is derived from a card's history.
    pub policy: SchedulePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_dir: ".recall".to_string(),
            file_prefix: "recall-".to_string(),
            file_extension: "csv".to_string(),
            close_timeout_ms: 5000,
            policy: SchedulePolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn from_toml(content: &str) -> Fallible<Self> {
        let config: StoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            return fail("config file does not exist.");
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Fallible<()> {
        if self.log_dir.is_empty() || self.log_dir.contains(['/', '\\']) {
            return fail("log-dir must be a single, non-empty directory name.");
        }
        if self.file_prefix.is_empty() {
            return fail("file-prefix must not be empty.");
        }
        if self.file_extension.is_empty() || self.file_extension.contains('.') {
            return fail("file-extension must be non-empty and must not contain a dot.");
        }
        if self.close_timeout_ms == 0 {
            return fail("close-timeout-ms must be greater than zero.");
        }
        Ok(())
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    /// The reserved log directory of a workspace folder.
    pub fn log_dir_of(&self, folder: &Path) -> PathBuf {
        folder.join(&self.log_dir)
    }

    /// The name of the log file for the given day.
    pub fn log_file_name(&self, date: NaiveDate) -> String {
        format!(
            "{}{}.{}",
            self.file_prefix,
            date.format("%Y-%m-%d"),
            self.file_extension
        )
    }

    /// Whether a file name follows the log naming convention.
    pub fn is_log_file_name(&self, name: &str) -> bool {
        let suffix = format!(".{}", self.file_extension);
        name.len() > self.file_prefix.len() + suffix.len()
            && name.starts_with(&self.file_prefix)
            && name.ends_with(&suffix)
    }
}
