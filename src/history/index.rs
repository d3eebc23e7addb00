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

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::checksum::Checksum;
use crate::types::review::LogRow;
use crate::types::review::ReviewRecord;

/// A folder's review history, grouped by card. Within a card, records are
/// kept in the order they were read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryIndex {
    cards: HashMap<Checksum, Vec<ReviewRecord>>,
}

impl HistoryIndex {
    /// Group a flat sequence of rows by checksum, preserving their order.
    pub fn fold(rows: impl IntoIterator<Item = LogRow>) -> Self {
        let mut cards: HashMap<Checksum, Vec<ReviewRecord>> = HashMap::new();
        for LogRow { checksum, record } in rows {
            cards.entry(checksum).or_default().push(record);
        }
        Self { cards }
    }

    /// The history of a card, or `None` if it was never reviewed.
    pub fn get(&self, checksum: &Checksum) -> Option<&[ReviewRecord]> {
        self.cards.get(checksum).map(|records| records.as_slice())
    }

    /// The number of cards with at least one review.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// All reviewed checksums, sorted.
    pub fn checksums(&self) -> Vec<&Checksum> {
        let mut checksums: Vec<&Checksum> = self.cards.keys().collect();
        checksums.sort();
        checksums
    }
}

#[derive(Clone)]
enum LoadState {
    Pending,
    Ready(Arc<HistoryIndex>),
    Failed(ErrorReport),
}

impl LoadState {
    fn settled(&self) -> Option<Fallible<Arc<HistoryIndex>>> {
        match self {
            LoadState::Pending => None,
            LoadState::Ready(index) => Some(Ok(index.clone())),
            LoadState::Failed(err) => Some(Err(err.clone())),
        }
    }
}

/// A folder's history index, which settles exactly once when loading
/// finishes. Cloning is cheap; every clone observes the same outcome.
#[derive(Clone)]
pub struct FolderIndex {
    rx: watch::Receiver<LoadState>,
}

/// The write half of a [`FolderIndex`], owned by the loader.
pub struct IndexResolver {
    tx: watch::Sender<LoadState>,
}

impl FolderIndex {
    pub fn pending() -> (IndexResolver, FolderIndex) {
        let (tx, rx) = watch::channel(LoadState::Pending);
        (IndexResolver { tx }, FolderIndex { rx })
    }

    /// The outcome of loading, or `None` if it is still in progress.
    pub fn try_get(&self) -> Option<Fallible<Arc<HistoryIndex>>> {
        self.rx.borrow().settled()
    }

    /// Wait for loading to finish. If the loader goes away without settling
    /// the index, that is reported as an error.
    pub async fn wait(&self) -> Fallible<Arc<HistoryIndex>> {
        let mut rx = self.rx.clone();
        let state = rx
            .wait_for(|state| state.settled().is_some())
            .await
            .map_err(|_| ErrorReport::new("history load was abandoned"))?;
        match state.settled() {
            Some(result) => result,
            None => Err(ErrorReport::new("history load was abandoned")),
        }
    }
}

impl IndexResolver {
    pub fn resolve(self, result: Fallible<HistoryIndex>) {
        let state = match result {
            Ok(index) => LoadState::Ready(Arc::new(index)),
            Err(err) => LoadState::Failed(err),
        };
        self.tx.send_replace(state);
    }
}
