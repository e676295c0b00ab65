use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use swindle_core::game::settlement::{StatisticsError, StatisticsRecord, StatisticsStore};

/// Per-version win/loss counters kept in a JSON file. The file is rewritten
/// after every recorded game so an interrupted run keeps what it tallied.
#[derive(Debug)]
pub struct JsonStatisticsStore {
    path: PathBuf,
    records: BTreeMap<u32, StatisticsRecord>,
}

impl JsonStatisticsStore {
    /// Opens `path`, treating a missing file as an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StatisticsError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|err| unavailable(&path, err))?;
            let rows: Vec<StatisticsRecord> =
                serde_json::from_str(&text).map_err(|err| unavailable(&path, err))?;
            rows.into_iter().map(|row| (row.version, row)).collect()
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, version: u32) -> Option<&StatisticsRecord> {
        self.records.get(&version)
    }

    pub fn records(&self) -> impl Iterator<Item = &StatisticsRecord> {
        self.records.values()
    }

    fn persist(&self) -> Result<(), StatisticsError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|err| unavailable(&self.path, err))?;
        }
        let rows: Vec<&StatisticsRecord> = self.records.values().collect();
        let json = serde_json::to_vec_pretty(&rows).map_err(|err| unavailable(&self.path, err))?;
        fs::write(&self.path, json).map_err(|err| unavailable(&self.path, err))
    }
}

impl StatisticsStore for JsonStatisticsStore {
    fn record_game_outcome(
        &mut self,
        ai_version: u32,
        opponent_won: bool,
    ) -> Result<(), StatisticsError> {
        let mut updated = self
            .records
            .get(&ai_version)
            .copied()
            .unwrap_or_else(|| StatisticsRecord::new(ai_version));
        updated.tally(opponent_won);
        let previous = self.records.insert(ai_version, updated);
        if let Err(err) = self.persist() {
            match previous {
                Some(row) => self.records.insert(ai_version, row),
                None => self.records.remove(&ai_version),
            };
            return Err(err);
        }
        Ok(())
    }
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> StatisticsError {
    StatisticsError::Unavailable(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_version_row_on_first_use() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("statistics.json");
        let mut store = JsonStatisticsStore::open(&path).expect("open");
        assert!(store.record(2).is_none());

        store.record_game_outcome(2, true).expect("record");
        store.record_game_outcome(2, false).expect("record");
        store.record_game_outcome(2, true).expect("record");

        let row = store.record(2).expect("row");
        assert_eq!(row.game_count, 3);
        assert_eq!(row.bot_win_count, 2);
        assert!(path.exists());
    }

    #[test]
    fn reopening_continues_the_tally() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("statistics.json");
        {
            let mut store = JsonStatisticsStore::open(&path).expect("open");
            store.record_game_outcome(1, false).expect("record");
            store.record_game_outcome(2, true).expect("record");
        }

        let mut store = JsonStatisticsStore::open(&path).expect("reopen");
        store.record_game_outcome(2, true).expect("record");
        let versions: Vec<u32> = store.records().map(|row| row.version).collect();
        assert_eq!(versions, vec![1, 2]);
        assert_eq!(store.record(1).map(|row| row.game_count), Some(1));
        assert_eq!(store.record(2).map(|row| row.bot_win_count), Some(2));
    }

    #[test]
    fn corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("statistics.json");
        fs::write(&path, "not json").expect("seed");
        let err = JsonStatisticsStore::open(&path).expect_err("corrupt");
        assert!(matches!(err, StatisticsError::Unavailable(_)));
    }

    #[test]
    fn failed_write_leaves_counters_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        // a directory where the file should be makes every write fail
        let path = dir.path().join("statistics.json");
        fs::create_dir_all(&path).expect("block path");
        let mut store = JsonStatisticsStore {
            path: path.clone(),
            records: BTreeMap::new(),
        };
        let err = store.record_game_outcome(2, true).expect_err("write fails");
        assert!(matches!(err, StatisticsError::Unavailable(_)));
        assert!(store.record(2).is_none());
    }
}
