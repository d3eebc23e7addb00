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
use std::time::Instant;

use tokio::task::JoinHandle;
use walkdir::WalkDir;

use crate::config::StoreConfig;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::history::codec::decode_rows;
use crate::history::index::FolderIndex;
use crate::history::index::HistoryIndex;
use crate::types::review::LogRow;

/// Start loading a folder's history in the background. The returned index
/// settles when every log file has been read.
pub fn spawn_load(config: StoreConfig, log_dir: PathBuf) -> (FolderIndex, JoinHandle<()>) {
    let (resolver, index) = FolderIndex::pending();
    let handle = tokio::spawn(async move {
        let result = load_history(&config, &log_dir).await;
        resolver.resolve(result);
    });
    (index, handle)
}

/// Read every log file in `log_dir` and fold them into an index. Files are
/// read concurrently, but folded in file name order, which for dated log
/// files is chronological.
pub async fn load_history(config: &StoreConfig, log_dir: &Path) -> Fallible<HistoryIndex> {
    let start = Instant::now();
    let files = find_log_files(config, log_dir).await?;
    let tasks: Vec<JoinHandle<Fallible<Vec<LogRow>>>> = files
        .iter()
        .cloned()
        .map(|path| tokio::spawn(read_log_file(path)))
        .collect();
    let mut rows = Vec::new();
    for task in tasks {
        rows.extend(task.await??);
    }
    let row_count = rows.len();
    let index = HistoryIndex::fold(rows);
    let duration = start.elapsed().as_millis();
    log::debug!(
        "Loaded {row_count} reviews of {} cards from {} files in {}, in {duration}ms.",
        index.len(),
        files.len(),
        log_dir.display()
    );
    Ok(index)
}

/// Find the log files in a folder's log directory, as sorted absolute paths.
/// A missing directory has no logs.
pub async fn find_log_files(config: &StoreConfig, log_dir: &Path) -> Fallible<Vec<PathBuf>> {
    let config = config.clone();
    let log_dir = log_dir.to_path_buf();
    tokio::task::spawn_blocking(move || list_log_files(&config, &log_dir)).await?
}

fn list_log_files(config: &StoreConfig, log_dir: &Path) -> Fallible<Vec<PathBuf>> {
    if !log_dir.exists() {
        return Ok(Vec::new());
    }
    let log_dir = log_dir.canonicalize()?;
    let mut files = Vec::new();
    for entry in WalkDir::new(&log_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if config.is_log_file_name(name) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

async fn read_log_file(path: PathBuf) -> Fallible<Vec<LogRow>> {
    let content = tokio::fs::read(&path).await?;
    decode_rows(&content)
        .map_err(|e| ErrorReport::new(format!("{}: {}", path.display(), e.message())))
}
