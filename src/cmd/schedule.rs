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

use serde::Serialize;

use crate::cmd::resolve_folder;
use crate::config::StoreConfig;
use crate::error::Fallible;
use crate::history::store::HistoryStore;
use crate::types::card::Card;
use crate::types::checksum::Checksum;
use crate::types::timestamp::Timestamp;

pub async fn print_schedule(
    config: StoreConfig,
    directory: Option<String>,
    checksum: String,
) -> Fallible<()> {
    let folder = resolve_folder(directory)?;
    let store = HistoryStore::new(config);
    let checksum = Checksum::new(checksum);
    let export = get_schedule_export(&store, &folder, checksum, Timestamp::now()).await;
    store.close_all().await;
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ScheduleExport {
    checksum: Checksum,
    /// Whether the card has never been reviewed.
    new: bool,
    next_review_at: Option<Timestamp>,
    next_review_date: Option<String>,
    recall: Option<u32>,
    due: bool,
}

async fn get_schedule_export(
    store: &HistoryStore,
    folder: &Path,
    checksum: Checksum,
    now: Timestamp,
) -> ScheduleExport {
    store.add_folder(folder).await;
    let mut card = Card::new(checksum, folder.to_path_buf(), 0);
    match store.get_schedule(&mut card).await {
        Some(schedule) => ScheduleExport {
            checksum: card.checksum().clone(),
            new: false,
            next_review_at: Some(schedule.next_review_at),
            next_review_date: Some(schedule.next_review_at.to_string()),
            recall: Some(schedule.recall),
            due: schedule.next_review_at <= now,
        },
        None => ScheduleExport {
            checksum: card.checksum().clone(),
            new: true,
            next_review_at: None,
            next_review_date: None,
            recall: None,
            due: true,
        },
    }
}
