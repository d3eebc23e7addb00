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
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::StoreConfig;
use crate::history::index::FolderIndex;
use crate::history::index::HistoryIndex;
use crate::history::loader::spawn_load;
use crate::history::schedule::Schedule;
use crate::history::writer::FolderLogWriter;
use crate::types::card::Card;
use crate::types::review::LogRow;
use crate::types::review::ReviewRecord;
use crate::types::timestamp::Timestamp;

/// Review history for a set of workspace folders.
///
/// Each folder that has been added owns one log writer and one history
/// index. Nothing in here fails the caller: file system and decode errors are
/// logged, and a folder whose history could not be loaded is treated as
/// having none.
pub struct HistoryStore {
    config: StoreConfig,
    folders: Mutex<HashMap<PathBuf, FolderHistory>>,
}

struct FolderHistory {
    index: FolderIndex,
    loader: JoinHandle<()>,
    writer: FolderLogWriter,
}

impl FolderHistory {
    async fn close(self, timeout: Duration) {
        self.loader.abort();
        self.writer.close(timeout).await;
    }
}

impl HistoryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            folders: Mutex::new(HashMap::new()),
        }
    }

    /// Start tracking a folder: spawn its writer and start loading its
    /// history in the background. Returns `false` if the folder was already
    /// added.
    pub fn register_folder(&self, folder: &Path) -> bool {
        let mut folders = self.acquire();
        if folders.contains_key(folder) {
            return false;
        }
        log::debug!("Adding folder {}", folder.display());
        let log_dir = self.config.log_dir_of(folder);
        let (index, loader) = spawn_load(self.config.clone(), log_dir.clone());
        let writer = FolderLogWriter::spawn(self.config.clone(), log_dir, index.clone());
        folders.insert(
            folder.to_path_buf(),
            FolderHistory {
                index,
                loader,
                writer,
            },
        );
        true
    }

    /// Add a folder and wait for its history to load. Returns `None` if the
    /// folder was already added.
    pub async fn add_folder(&self, folder: &Path) -> Option<Arc<HistoryIndex>> {
        if !self.register_folder(folder) {
            return None;
        }
        let index = self.folder_index(folder)?;
        Some(resolve(folder, &index).await)
    }

    /// The index of an added folder, which may not have settled yet.
    pub fn folder_index(&self, folder: &Path) -> Option<FolderIndex> {
        self.acquire().get(folder).map(|history| history.index.clone())
    }

    /// The folders currently open, sorted.
    pub fn folders(&self) -> Vec<PathBuf> {
        let mut folders: Vec<PathBuf> = self.acquire().keys().cloned().collect();
        folders.sort();
        folders
    }

    /// Record a review of `card`, timestamped now.
    pub fn record_review(&self, card: &Card, success: bool) {
        self.record_review_at(card, success, Timestamp::now());
    }

    /// Record a review of `card` with the card's current recall interval.
    ///
    /// The row is queued immediately, so reviews are logged in call order,
    /// but it is only written once the folder's history has loaded.
    pub fn record_review_at(&self, card: &Card, success: bool, reviewed_at: Timestamp) {
        let folders = self.acquire();
        let Some(history) = folders.get(card.root_path()) else {
            log::warn!("Folder not initialized: {}", card.root_path().display());
            return;
        };
        let row = LogRow {
            checksum: card.checksum().clone(),
            record: ReviewRecord {
                timestamp: reviewed_at,
                success,
                recall: card.recall(),
            },
        };
        if let Err(e) = history.writer.append(row) {
            log::error!("{e}");
        }
    }

    /// Look up a card's schedule in its folder's history, and write it back
    /// onto the card. Returns `None`, leaving the card untouched, if the card
    /// has no history or its folder was never added.
    ///
    /// The history is a snapshot taken when the folder was added: reviews
    /// recorded since then are not reflected here.
    pub async fn get_schedule(&self, card: &mut Card) -> Option<Schedule> {
        let Some(index) = self.folder_index(card.root_path()) else {
            log::warn!("Folder not initialized: {}", card.root_path().display());
            return None;
        };
        let history = resolve(card.root_path(), &index).await;
        let records = history.get(card.checksum())?;
        let schedule = self.config.policy.schedule(records)?;
        card.set_schedule(schedule.next_review_at, schedule.recall);
        Some(schedule)
    }

    /// Flush and close a folder's log. Returns `false` if the folder was not
    /// open.
    pub async fn close_folder(&self, folder: &Path) -> bool {
        let history = self.acquire().remove(folder);
        match history {
            Some(history) => {
                log::debug!("Closing folder {}", folder.display());
                history.close(self.config.close_timeout()).await;
                true
            }
            None => {
                log::warn!("Folder not initialized: {}", folder.display());
                false
            }
        }
    }

    /// Close every open folder.
    pub async fn close_all(&self) {
        let folders: Vec<(PathBuf, FolderHistory)> = self.acquire().drain().collect();
        for (folder, history) in folders {
            log::debug!("Closing folder {}", folder.display());
            history.close(self.config.close_timeout()).await;
        }
    }

    fn acquire(&self) -> MutexGuard<'_, HashMap<PathBuf, FolderHistory>> {
        self.folders.lock().unwrap()
    }
}

/// Wait for a folder's index. A failed load is logged and treated as an
/// empty history.
async fn resolve(folder: &Path, index: &FolderIndex) -> Arc<HistoryIndex> {
    let result = match index.try_get() {
        Some(result) => result,
        None => {
            log::debug!("Waiting for the review history of {}", folder.display());
            index.wait().await
        }
    };
    match result {
        Ok(history) => history,
        Err(e) => {
            log::error!("Failed to load review history of {}: {e}", folder.display());
            Arc::new(HistoryIndex::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::create_dir_all;
    use std::fs::read_to_string;
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;
    use crate::error::Fallible;
    use crate::history::schedule::SchedulePolicy;
    use crate::types::checksum::Checksum;

    const DAY: i64 = 24 * 3600 * 1000;
    // 2024-03-01T12:00:00Z
    const NOON: i64 = 1_709_294_400_000;

    fn card(folder: &Path, checksum: &str, recall: u32) -> Card {
        Card::new(Checksum::new(checksum), folder.to_path_buf(), recall)
    }

    fn store() -> HistoryStore {
        HistoryStore::new(StoreConfig::default())
    }

    #[tokio::test]
    async fn test_add_empty_folder() -> Fallible<()> {
        let dir = tempdir()?;
        let store = store();
        let index = store.add_folder(dir.path()).await.unwrap();
        assert!(index.is_empty());
        assert_eq!(store.folders(), vec![dir.path().to_path_buf()]);
        store.close_all().await;
        assert!(dir.path().join(".recall").is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_folder_is_idempotent() -> Fallible<()> {
        let dir = tempdir()?;
        let store = store();
        assert!(store.add_folder(dir.path()).await.is_some());
        assert!(store.add_folder(dir.path()).await.is_none());
        assert_eq!(store.folders().len(), 1);
        store.close_all().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_record_and_reload() -> Fallible<()> {
        let dir = tempdir()?;
        let store = store();
        store.add_folder(dir.path()).await;
        let a = card(dir.path(), "a", 1);
        let b = card(dir.path(), "b", 4);
        store.record_review_at(&a, true, Timestamp::from_millis(NOON));
        store.record_review_at(&b, false, Timestamp::from_millis(NOON + 1));
        store.record_review_at(&a, false, Timestamp::from_millis(NOON + 2));
        assert!(store.close_folder(dir.path()).await);

        let store = self::store();
        let index = store.add_folder(dir.path()).await.unwrap();
        let a_history = index.get(&Checksum::new("a")).unwrap();
        assert_eq!(
            a_history,
            &[
                ReviewRecord {
                    timestamp: Timestamp::from_millis(NOON),
                    success: true,
                    recall: 1,
                },
                ReviewRecord {
                    timestamp: Timestamp::from_millis(NOON + 2),
                    success: false,
                    recall: 1,
                },
            ]
        );
        let b_history = index.get(&Checksum::new("b")).unwrap();
        assert_eq!(b_history.len(), 1);
        assert_eq!(b_history[0].recall, 4);
        assert!(!b_history[0].success);
        store.close_all().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_record_on_unknown_folder() -> Fallible<()> {
        let dir = tempdir()?;
        let store = store();
        store.record_review(&card(dir.path(), "a", 1), true);
        assert!(!dir.path().join(".recall").exists());
        assert!(store.folders().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_schedule_on_unknown_folder() -> Fallible<()> {
        let dir = tempdir()?;
        let store = store();
        let mut card = card(dir.path(), "a", 1);
        assert_eq!(store.get_schedule(&mut card).await, None);
        assert_eq!(card.next_review_at(), None);
        assert!(!dir.path().join(".recall").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_schedule_without_history() -> Fallible<()> {
        let dir = tempdir()?;
        let store = store();
        store.add_folder(dir.path()).await;
        let mut card = card(dir.path(), "new", 0);
        assert_eq!(store.get_schedule(&mut card).await, None);
        assert_eq!(card.next_review_at(), None);
        assert_eq!(card.recall(), 0);
        store.close_all().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_schedule_prefers_latest_projection() -> Fallible<()> {
        let dir = tempdir()?;
        let log_dir = dir.path().join(".recall");
        create_dir_all(&log_dir)?;
        let t = NOON;
        write(
            log_dir.join("recall-2024-03-01.csv"),
            format!("abc,{t},1,3\nabc,{},0,10\n", t - 100_000),
        )?;
        let store = store();
        store.add_folder(dir.path()).await;
        let mut card = card(dir.path(), "abc", 0);
        let schedule = store.get_schedule(&mut card).await.unwrap();
        // t - 100000ms + 10d is later than t + 3d.
        let expected = Timestamp::from_millis(t - 100_000 + 10 * DAY);
        assert_eq!(schedule.next_review_at, expected);
        assert_eq!(schedule.recall, 10);
        assert_eq!(card.next_review_at(), Some(expected));
        assert_eq!(card.recall(), 10);
        store.close_all().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_schedule_waits_for_pending_load() -> Fallible<()> {
        let dir = tempdir()?;
        let log_dir = dir.path().join(".recall");
        create_dir_all(&log_dir)?;
        write(log_dir.join("recall-2024-03-01.csv"), format!("abc,{NOON},1,2\n"))?;
        let store = store();
        assert!(store.register_folder(dir.path()));
        let mut card = card(dir.path(), "abc", 0);
        let schedule = store.get_schedule(&mut card).await.unwrap();
        assert_eq!(schedule.next_review_at, Timestamp::from_millis(NOON + 2 * DAY));
        // Settled now, so the second lookup does not wait.
        assert!(store.folder_index(dir.path()).unwrap().try_get().is_some());
        assert_eq!(store.get_schedule(&mut card).await, Some(schedule));
        store.close_all().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_schedule_with_most_recent_policy() -> Fallible<()> {
        let dir = tempdir()?;
        let log_dir = dir.path().join(".recall");
        create_dir_all(&log_dir)?;
        let t = NOON;
        write(
            log_dir.join("recall-2024-03-01.csv"),
            format!("abc,{t},1,3\nabc,{},0,10\n", t - 100_000),
        )?;
        let config = StoreConfig {
            policy: SchedulePolicy::MostRecentReview,
            ..StoreConfig::default()
        };
        let store = HistoryStore::new(config);
        store.add_folder(dir.path()).await;
        let mut card = card(dir.path(), "abc", 0);
        let schedule = store.get_schedule(&mut card).await.unwrap();
        assert_eq!(schedule.next_review_at, Timestamp::from_millis(t + 3 * DAY));
        assert_eq!(card.recall(), 3);
        store.close_all().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_schedule_is_a_snapshot() -> Fallible<()> {
        let dir = tempdir()?;
        let store = store();
        store.add_folder(dir.path()).await;
        let mut card = card(dir.path(), "abc", 5);
        store.record_review_at(&card, true, Timestamp::from_millis(NOON));
        assert_eq!(store.get_schedule(&mut card).await, None);
        store.close_all().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_history_degrades_to_empty() -> Fallible<()> {
        let dir = tempdir()?;
        let log_dir = dir.path().join(".recall");
        create_dir_all(&log_dir)?;
        write(log_dir.join("recall-2024-03-01.csv"), "abc,not-a-number,1,3\n")?;
        let store = store();
        let index = store.add_folder(dir.path()).await.unwrap();
        assert!(index.is_empty());
        let mut card = card(dir.path(), "abc", 0);
        assert_eq!(store.get_schedule(&mut card).await, None);
        // The error is still observable through the folder's index.
        let folder_index = store.folder_index(dir.path()).unwrap();
        assert!(folder_index.wait().await.is_err());
        // Reviews are still recorded.
        store.record_review_at(&card, true, Timestamp::from_millis(NOON + DAY));
        store.close_all().await;
        let content = read_to_string(log_dir.join("recall-2024-03-02.csv"))?;
        assert_eq!(content, format!("abc,{},1,0\n", NOON + DAY));
        Ok(())
    }

    #[tokio::test]
    async fn test_reviews_before_load_keep_call_order() -> Fallible<()> {
        let dir = tempdir()?;
        let store = store();
        assert!(store.register_folder(dir.path()));
        let first = card(dir.path(), "first", 1);
        let second = card(dir.path(), "second", 2);
        store.record_review_at(&first, true, Timestamp::from_millis(NOON));
        store.record_review_at(&second, false, Timestamp::from_millis(NOON - 1));
        let index = store.folder_index(dir.path()).unwrap();
        index.wait().await?;
        store.close_all().await;
        let content = read_to_string(dir.path().join(".recall").join("recall-2024-03-01.csv"))?;
        assert_eq!(
            content,
            format!("first,{NOON},1,1\nsecond,{},0,2\n", NOON - 1)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_close_before_load() -> Fallible<()> {
        let dir = tempdir()?;
        let store = store();
        store.register_folder(dir.path());
        store.record_review_at(&card(dir.path(), "a", 1), true, Timestamp::from_millis(NOON));
        tokio::time::timeout(Duration::from_secs(10), store.close_folder(dir.path()))
            .await
            .map_err(|_| crate::error::ErrorReport::new("close hung"))?;
        assert!(store.folders().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_use_after_close_is_a_no_op() -> Fallible<()> {
        let dir = tempdir()?;
        let store = store();
        store.add_folder(dir.path()).await;
        assert!(store.close_folder(dir.path()).await);
        assert!(!store.close_folder(dir.path()).await);
        let mut card = card(dir.path(), "a", 1);
        store.record_review(&card, true);
        assert_eq!(store.get_schedule(&mut card).await, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_folders_are_independent() -> Fallible<()> {
        let one = tempdir()?;
        let two = tempdir()?;
        let store = store();
        store.add_folder(one.path()).await;
        store.add_folder(two.path()).await;
        store.record_review_at(&card(one.path(), "a", 1), true, Timestamp::from_millis(NOON));
        assert!(store.close_folder(one.path()).await);
        store.record_review_at(&card(two.path(), "b", 2), true, Timestamp::from_millis(NOON));
        store.close_all().await;
        let one_log = read_to_string(one.path().join(".recall").join("recall-2024-03-01.csv"))?;
        let two_log = read_to_string(two.path().join(".recall").join("recall-2024-03-01.csv"))?;
        assert_eq!(one_log, format!("a,{NOON},1,1\n"));
        assert_eq!(two_log, format!("b,{NOON},1,2\n"));
        Ok(())
    }
}
