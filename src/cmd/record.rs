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

use crate::cmd::resolve_folder;
use crate::config::StoreConfig;
use crate::error::Fallible;
use crate::history::store::HistoryStore;
use crate::types::card::Card;
use crate::types::checksum::Checksum;
use crate::types::outcome::Outcome;

pub async fn record_review(
    config: StoreConfig,
    directory: Option<String>,
    checksum: String,
    outcome: Outcome,
    recall: u32,
    archive: bool,
) -> Fallible<()> {
    let folder = resolve_folder(directory)?;
    let store = HistoryStore::new(config);
    store.add_folder(&folder).await;
    let mut card = Card::new(Checksum::new(checksum), folder, recall);
    if archive {
        card.toggle_archived();
    }
    if outcome == Outcome::Forgot {
        card.unarchive();
    }
    store.record_review(&card, outcome.is_success());
    store.close_all().await;
    println!("Recorded {outcome} for {}.", card.checksum());
    if card.is_archived() {
        println!("The card is archived.");
    }
    Ok(())
}
