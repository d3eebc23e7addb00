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

use crate::cmd::resolve_folder;
use crate::config::StoreConfig;
use crate::error::Fallible;
use crate::history::index::HistoryIndex;
use crate::history::store::HistoryStore;
use crate::types::checksum::Checksum;
use crate::types::review::ReviewRecord;

pub async fn print_history(
    config: StoreConfig,
    directory: Option<String>,
    checksum: Option<String>,
) -> Fallible<()> {
    let folder = resolve_folder(directory)?;
    let store = HistoryStore::new(config);
    let index = store.add_folder(&folder).await.unwrap_or_default();
    store.close_all().await;
    let export = HistoryExport {
        folder: folder.display().to_string(),
        cards: get_card_history(&index, checksum.map(Checksum::new).as_ref()),
    };
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryExport {
    folder: String,
    cards: Vec<CardHistoryExport>,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct CardHistoryExport {
    checksum: Checksum,
    reviews: Vec<ReviewRecord>,
}

fn get_card_history(index: &HistoryIndex, only: Option<&Checksum>) -> Vec<CardHistoryExport> {
    index
        .checksums()
        .into_iter()
        .filter(|checksum| only.is_none_or(|only| only == *checksum))
        .map(|checksum| CardHistoryExport {
            checksum: checksum.clone(),
            reviews: index.get(checksum).unwrap_or_default().to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::review::LogRow;
    use crate::types::timestamp::Timestamp;

    fn row(checksum: &str, timestamp: i64) -> LogRow {
        LogRow {
            checksum: Checksum::new(checksum),
            record: ReviewRecord {
                timestamp: Timestamp::from_millis(timestamp),
                success: true,
                recall: 1,
            },
        }
    }

    #[test]
    fn test_card_history() {
        let index = HistoryIndex::fold(vec![row("b", 2), row("a", 1), row("b", 3)]);
        let cards = get_card_history(&index, None);
        let checksums: Vec<&str> = cards.iter().map(|c| c.checksum.as_str()).collect();
        assert_eq!(checksums, vec!["a", "b"]);
        assert_eq!(cards[1].reviews.len(), 2);

        let only = Checksum::new("b");
        let cards = get_card_history(&index, Some(&only));
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].checksum, only);
    }

    #[test]
    fn test_json_shape() -> Fallible<()> {
        let index = HistoryIndex::fold(vec![row("a", 5)]);
        let export = HistoryExport {
            folder: "/deck".to_string(),
            cards: get_card_history(&index, None),
        };
        let json = serde_json::to_string(&export)?;
        assert_eq!(
            json,
            r#"{"folder":"/deck","cards":[{"checksum":"a","reviews":[{"timestamp":5,"success":true,"recall":1}]}]}"#
        );
        Ok(())
    }
}
