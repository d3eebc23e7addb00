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
use std::time::Duration;

use chrono::NaiveDate;
use tokio::fs::File;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::StoreConfig;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::history::codec::encode_row;
use crate::history::index::FolderIndex;
use crate::types::review::LogRow;

/// The single writer of a folder's review logs.
///
/// Rows are handed to a background task through a channel, so appending
/// never waits on the file system, and rows reach the log in the order they
/// were appended. The task holds rows back until the folder's index has
/// settled (or the writer is closed), so the loader never reads a log this
/// session is still writing to.
///
/// Each row goes to the daily file named after the UTC date of its own
/// timestamp. Files are opened in append mode and never truncated.
pub struct FolderLogWriter {
    tx: mpsc::UnboundedSender<LogRow>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl FolderLogWriter {
    pub fn spawn(config: StoreConfig, log_dir: PathBuf, index: FolderIndex) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run(config, log_dir, index, rx, shutdown_rx));
        Self {
            tx,
            shutdown,
            handle,
        }
    }

    /// Queue a row for writing. Fails only if the writer task has gone away;
    /// write errors are logged by the task itself.
    pub fn append(&self, row: LogRow) -> Fallible<()> {
        self.tx
            .send(row)
            .map_err(|e| {
                ErrorReport::new(format!(
                    "review log writer is closed, dropped review of {}",
                    e.0.checksum
                ))
            })
    }

    /// Write out everything queued so far and stop. Waits at most `timeout`
    /// for the queue to drain, then gives up on the remaining rows.
    pub async fn close(self, timeout: Duration) {
        let Self {
            tx,
            shutdown,
            mut handle,
        } = self;
        let _ = shutdown.send(());
        drop(tx);
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!("Review log writer failed: {e}"),
            Err(_) => {
                log::error!("Timed out closing review log writer; pending reviews were not saved.");
                handle.abort();
            }
        }
    }
}

async fn run(
    config: StoreConfig,
    log_dir: PathBuf,
    index: FolderIndex,
    mut rx: mpsc::UnboundedReceiver<LogRow>,
    mut shutdown: oneshot::Receiver<()>,
) {
    if let Err(e) = tokio::fs::create_dir_all(&log_dir).await {
        log::error!("Failed to create log directory {}: {e}", log_dir.display());
    }
    tokio::select! {
        _ = index.wait() => {}
        _ = &mut shutdown => {}
    }
    let mut sink = LogSink {
        config,
        log_dir,
        current: None,
    };
    while let Some(row) = rx.recv().await {
        match sink.write(&row).await {
            Ok(()) => log::debug!("Recorded review of {}.", row.checksum),
            Err(e) => log::error!("Failed to record review of {}: {e}", row.checksum),
        }
    }
}

struct LogSink {
    config: StoreConfig,
    log_dir: PathBuf,
    /// The open log file and the day it belongs to.
    current: Option<(NaiveDate, File)>,
}

impl LogSink {
    async fn write(&mut self, row: &LogRow) -> Fallible<()> {
        let line = encode_row(row)?;
        let date = row.record.timestamp.utc_date()?;
        let file = self.file_for(date).await?;
        let result = write_line(file, &line).await;
        if result.is_err() {
            // Reopen on the next write.
            self.current = None;
        }
        result
    }

    async fn file_for(&mut self, date: NaiveDate) -> Fallible<&mut File> {
        if self.current.as_ref().map(|(day, _)| *day) != Some(date) {
            self.current = None;
            let path = self.log_dir.join(self.config.log_file_name(date));
            log::debug!("Opening review log {}", path.display());
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            self.current = Some((date, file));
        }
        match self.current.as_mut() {
            Some((_, file)) => Ok(file),
            None => Err(ErrorReport::new("no open review log")),
        }
    }
}

async fn write_line(file: &mut File, line: &[u8]) -> Fallible<()> {
    file.write_all(line).await?;
    file.flush().await?;
    file.sync_data().await?;
    Ok(())
}
