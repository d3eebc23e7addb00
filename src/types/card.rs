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

use crate::types::checksum::Checksum;
use crate::types::timestamp::Timestamp;

/// Recall values above this mark a card as archived. The offset is added to,
/// and removed from, the card's real recall interval.
pub const ARCHIVE_RECALL: u32 = 10_000;

/// A card as seen by the history store. The identity fields are owned by the
/// card provider; the schedule fields are written back by the store.
#[derive(Clone, Debug)]
pub struct Card {
    /// The card's content fingerprint.
    checksum: Checksum,
    /// The workspace folder the card lives under.
    root_path: PathBuf,
    /// Days until the card is next due. Zero for a new card.
    recall: u32,
    /// When the card is next due, if it has ever been scheduled.
    next_review_at: Option<Timestamp>,
}

impl Card {
    pub fn new(checksum: Checksum, root_path: PathBuf, recall: u32) -> Self {
        Self {
            checksum,
            root_path,
            recall,
            next_review_at: None,
        }
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn recall(&self) -> u32 {
        self.recall
    }

    pub fn next_review_at(&self) -> Option<Timestamp> {
        self.next_review_at
    }

    pub fn set_schedule(&mut self, next_review_at: Timestamp, recall: u32) {
        self.next_review_at = Some(next_review_at);
        self.recall = recall;
    }

    pub fn is_archived(&self) -> bool {
        self.recall > ARCHIVE_RECALL
    }

    pub fn toggle_archived(&mut self) {
        if self.is_archived() {
            self.recall -= ARCHIVE_RECALL;
        } else {
            self.recall = self.recall.saturating_add(ARCHIVE_RECALL);
        }
    }

    /// A forgotten card is never kept archived.
    pub fn unarchive(&mut self) {
        if self.is_archived() {
            self.recall -= ARCHIVE_RECALL;
        }
    }
}
