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

use serde::Serialize;

use crate::types::checksum::Checksum;
use crate::types::timestamp::Timestamp;

/// The outcome of a single review, as recorded in a folder's history.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct ReviewRecord {
    /// When the review happened.
    pub timestamp: Timestamp,
    /// Whether the card was remembered.
    pub success: bool,
    /// The card's recall interval, in days, at the time of the review.
    pub recall: u32,
}

impl ReviewRecord {
    /// The date this record projects the next review to.
    pub fn next_review_at(&self) -> Timestamp {
        self.timestamp.plus_days(self.recall)
    }
}

/// One row of a review log: a record tagged with the card it belongs to.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LogRow {
    pub checksum: Checksum,
    pub record: ReviewRecord,
}
