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

use serde::Deserialize;
use serde::Serialize;

use crate::types::review::ReviewRecord;
use crate::types::timestamp::Timestamp;

/// When a card is next due, and the recall interval that got it there.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub next_review_at: Timestamp,
    pub recall: u32,
}

/// How a card's schedule is derived from its history. Every record projects
/// a next review date of `timestamp + recall days`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulePolicy {
    /// Take the latest projected date across the whole history, even when
    /// an older record projects further than a newer one. On ties the first
    /// record in history order wins.
    #[default]
    LatestProjection,
    /// Take the projection of the most recent review. On ties the last
    /// record in history order wins.
    MostRecentReview,
}

impl SchedulePolicy {
    /// Compute a schedule from a card's history. Returns `None` if the
    /// history is empty.
    pub fn schedule(self, history: &[ReviewRecord]) -> Option<Schedule> {
        let chosen = match self {
            SchedulePolicy::LatestProjection => {
                let mut best: Option<&ReviewRecord> = None;
                for record in history {
                    match best {
                        Some(b) if record.next_review_at() <= b.next_review_at() => {}
                        _ => best = Some(record),
                    }
                }
                best
            }
            SchedulePolicy::MostRecentReview => {
                let mut best: Option<&ReviewRecord> = None;
                for record in history {
                    match best {
                        Some(b) if record.timestamp < b.timestamp => {}
                        _ => best = Some(record),
                    }
                }
                best
            }
        }?;
        Some(Schedule {
            next_review_at: chosen.next_review_at(),
            recall: chosen.recall,
        })
    }
}
