//! Persistent action-value table keyed by signature string.
//!
//! On disk the table is a single JSON object mapping each key to four
//! numbers in action order (left, right, up, down). An empty object is the
//! cold-start table.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::state::Signature;

pub type ActionValues = [f64; 4];

/// Value of every action in a signature the table has never stored.
pub const DEFAULT_VALUES: ActionValues = [0.0; 4];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QTable {
    values: AHashMap<String, ActionValues>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, signature: &Signature) -> bool {
        self.values.contains_key(&signature.key())
    }

    /// Stored values, or [`DEFAULT_VALUES`] without inserting anything.
    pub fn get(&self, signature: &Signature) -> ActionValues {
        self.get_key(&signature.key())
    }

    pub fn get_key(&self, key: &str) -> ActionValues {
        self.values.get(key).copied().unwrap_or(DEFAULT_VALUES)
    }

    /// Overwrite one action's value, creating the entry on first write.
    pub fn update(&mut self, signature: &Signature, action: usize, value: f64) {
        self.values
            .entry(signature.key())
            .or_insert(DEFAULT_VALUES)[action] = value;
    }

    pub fn max_value(&self, signature: &Signature) -> f64 {
        self.get(signature)
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Highest-valued action; ties go to the lowest index.
    pub fn best_action(&self, signature: &Signature) -> usize {
        let qs = self.get(signature);
        let mut best = 0;
        for (i, &q) in qs.iter().enumerate().skip(1) {
            if q > qs[best] {
                best = i;
            }
        }
        best
    }

    pub fn load<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Read a table file. A missing or malformed file is an error; callers
    /// wanting a cold start must write `{}` first.
    pub fn load_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::QTableIo {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::load(BufReader::new(file))?;
        info!(path = %path.display(), states = table.len(), "loaded q-table");
        Ok(table)
    }

    /// Write the table next to `path` and rename it into place, so readers
    /// see either the old file or the complete new one.
    pub fn save_path(&self, path: &Path) -> Result<()> {
        let tmp = staging_path(path);
        let io_err = |source| Error::QTableIo {
            path: tmp.clone(),
            source,
        };

        let written = File::create(&tmp).map_err(io_err).and_then(|file| {
            let mut writer = BufWriter::new(file);
            self.save(&mut writer)?;
            writer.flush().map_err(io_err)?;
            writer.get_ref().sync_all().map_err(io_err)
        });
        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "q-table save failed, existing file untouched");
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        fs::rename(&tmp, path).map_err(|source| Error::QTableIo {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), states = self.len(), "saved q-table");
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Horizontal, Occupancy, Vertical};
    use tempfile::TempDir;

    fn sig(food_x: Horizontal, food_y: Vertical) -> Signature {
        Signature {
            food_x,
            food_y,
            surroundings: [Occupancy::Free; 4],
        }
    }

    #[test]
    fn test_get_unseen_does_not_insert() {
        let table = QTable::new();
        let s = sig(Horizontal::Left, Vertical::Up);
        assert_eq!(table.get(&s), DEFAULT_VALUES);
        assert!(table.is_empty());
        assert!(!table.contains(&s));
    }

    #[test]
    fn test_update_creates_entry() {
        let mut table = QTable::new();
        let s = sig(Horizontal::Right, Vertical::Same);
        table.update(&s, 2, 7.5);
        assert_eq!(table.get(&s), [0.0, 0.0, 7.5, 0.0]);
        assert_eq!(table.len(), 1);

        table.update(&s, 0, -1.0);
        assert_eq!(table.get(&s), [-1.0, 0.0, 7.5, 0.0]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_best_action_prefers_first_on_tie() {
        let mut table = QTable::new();
        let s = sig(Horizontal::Same, Vertical::Down);
        assert_eq!(table.best_action(&s), 0);

        table.update(&s, 1, 3.0);
        table.update(&s, 3, 3.0);
        assert_eq!(table.best_action(&s), 1);
        assert_eq!(table.max_value(&s), 3.0);
    }

    #[test]
    fn test_load_empty() {
        let table = QTable::load("{}".as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_existing_format() {
        let raw = r#"{"('1', 'NA', '0000')": [1.5, -2.0, 0.25, 3]}"#;
        let table = QTable::load(raw.as_bytes()).unwrap();
        let s = sig(Horizontal::Right, Vertical::Same);
        assert_eq!(table.get(&s), [1.5, -2.0, 0.25, 3.0]);
    }

    #[test]
    fn test_load_malformed() {
        for raw in ["", "[]", r#"{"k": [1, 2, 3]}"#, r#"{"k": "x"}"#] {
            assert!(
                matches!(QTable::load(raw.as_bytes()), Err(Error::QTableFormat(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = QTable::load_path(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(Error::QTableIo { .. })));
    }

    #[test]
    fn test_save_path_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("qvalues.json");

        let mut table = QTable::new();
        table.update(&sig(Horizontal::Left, Vertical::Up), 0, -74.99999999999999);
        table.update(&sig(Horizontal::Right, Vertical::Down), 3, 0.1 + 0.2);
        table.save_path(&path).unwrap();

        assert_eq!(QTable::load_path(&path).unwrap(), table);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_save_path_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("qvalues.json");
        fs::write(&path, "{}").unwrap();

        let mut table = QTable::new();
        table.update(&sig(Horizontal::Same, Vertical::Same), 1, 12.0);
        table.save_path(&path).unwrap();

        assert_eq!(QTable::load_path(&path).unwrap().len(), 1);
    }
}
