//! JSON-file request store.
//!
//! One JSON document per test request, sharded by id to keep directory fan-out bounded:
//!
//! `<root>/requests/<shard>/<id>.json` where `<shard>` is `id % 256` as two lowercase hex digits.
//!
//! Example: request 42 lives at `request_data/requests/2a/42.json`.
//!
//! Writes go to a sibling temporary file which is then renamed over the target, so readers
//! never see a partially written record. A single mutex serialises all access within the process;
//! running two processes against the same directory is not supported.

use super::{ensure_insertable, RequestStore, UpdateOutcome};
use crate::constants::{RECORD_EXTENSION, REQUESTS_DIR_NAME};
use crate::error::{StoreError, StoreResult};
use crate::request::TestRequest;
use crate::status::RequestStatus;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use testreq_types::RequestId;

#[derive(Debug)]
pub struct JsonFileRequestStore {
    requests_dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRequestStore {
    /// Open (creating if needed) a store rooted at `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageDirCreation`] if the requests directory cannot be created.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        let requests_dir = data_dir.join(REQUESTS_DIR_NAME);
        fs::create_dir_all(&requests_dir).map_err(StoreError::StorageDirCreation)?;
        Ok(Self {
            requests_dir,
            lock: Mutex::new(()),
        })
    }

    pub fn requests_dir(&self) -> &Path {
        &self.requests_dir
    }

    fn shard_dir(&self, id: RequestId) -> PathBuf {
        self.requests_dir.join(format!("{:02x}", id.get() % 256))
    }

    fn record_path(&self, id: RequestId) -> PathBuf {
        self.shard_dir(id).join(format!("{id}.{RECORD_EXTENSION}"))
    }

    fn read_record(path: &Path) -> StoreResult<Option<TestRequest>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::FileRead(e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Deserialization {
                path: path.to_path_buf(),
                source,
            })
    }

    fn write_record(&self, record: &TestRequest) -> StoreResult<()> {
        let shard = self.shard_dir(record.id);
        fs::create_dir_all(&shard).map_err(StoreError::StorageDirCreation)?;

        let json = serde_json::to_string_pretty(record).map_err(StoreError::Serialization)?;
        let target = self.record_path(record.id);
        let tmp = shard.join(format!(".{}.{RECORD_EXTENSION}.tmp", record.id));

        if let Err(e) = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, &target)) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::FileWrite(e));
        }
        Ok(())
    }

    /// Every readable record, ascending by id. Unreadable or corrupt entries are logged and
    /// skipped so one bad file cannot hide the rest.
    fn all_records(&self) -> StoreResult<Vec<TestRequest>> {
        let mut records = Vec::new();

        let shards = match fs::read_dir(&self.requests_dir) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(StoreError::FileRead(e)),
        };

        for shard in shards.flatten() {
            let shard_path = shard.path();
            if !shard_path.is_dir() {
                continue;
            }
            let entries = match fs::read_dir(&shard_path) {
                Ok(it) => it,
                Err(e) => {
                    tracing::warn!("skipping unreadable shard {}: {e}", shard_path.display());
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let is_record = path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
                    && !path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with('.'));
                if !is_record {
                    continue;
                }
                match Self::read_record(&path) {
                    Ok(Some(record)) => records.push(record),
                    Ok(None) => tracing::warn!("record vanished during scan: {}", path.display()),
                    Err(e) => tracing::warn!("skipping record {}: {e}", path.display()),
                }
            }
        }

        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}

impl RequestStore for JsonFileRequestStore {
    fn get(&self, id: RequestId) -> StoreResult<Option<TestRequest>> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Self::read_record(&self.record_path(id))
    }

    fn insert(&self, request: TestRequest) -> StoreResult<()> {
        ensure_insertable(&request)?;
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        if self.record_path(request.id).exists() {
            return Err(StoreError::Duplicate(request.id));
        }
        self.write_record(&request)
    }

    fn compare_and_update(
        &self,
        id: RequestId,
        expected: RequestStatus,
        mutation: &mut dyn FnMut(&mut TestRequest),
    ) -> StoreResult<UpdateOutcome> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(mut record) = Self::read_record(&self.record_path(id))? else {
            return Ok(UpdateOutcome::Missing);
        };
        if record.status != expected {
            return Ok(UpdateOutcome::Conflict(record));
        }

        mutation(&mut record);
        self.write_record(&record)?;
        Ok(UpdateOutcome::Applied(record))
    }

    fn query(&self, predicate: &dyn Fn(&TestRequest) -> bool) -> StoreResult<Vec<TestRequest>> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self
            .all_records()?
            .into_iter()
            .filter(|r| predicate(r))
            .collect())
    }
}
