// Durable insertion-ordered policy store with atomic rewrite.
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use warden_authz::{AccessTag, PolicyRecord};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("corrupt policy store at record {line}: {reason}")]
    Corrupt { line: usize, reason: String },
    #[error("persistence failure: {0}")]
    Persistence(#[source] std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// File-backed, insertion-ordered collection of policy records.
///
/// The store owns every record exclusively. Appends are in-memory until
/// [`PolicyStore::persist`] rewrites the backing file as a whole; the rewrite
/// goes through a sibling temp file and a rename so a crash mid-write never
/// loses previously committed records.
///
/// ```
/// use warden_authz::{AccessTag, Effect, PolicyRecord, TierLevel};
/// use warden_store::PolicyStore;
///
/// let dir = tempfile::tempdir().expect("tempdir");
/// let path = dir.path().join("policies.csv");
/// let mut store = PolicyStore::load(&path).expect("load");
/// store.append(PolicyRecord::new(
///     AccessTag::owner(TierLevel::Workspace),
///     "alice",
///     "ws1(\\..*)?$",
///     ".*",
///     ".*",
///     Effect::Allow,
/// ));
/// store.persist().expect("persist");
/// assert_eq!(PolicyStore::load(&path).expect("reload").records().len(), 1);
/// ```
#[derive(Debug)]
pub struct PolicyStore {
    path: PathBuf,
    records: Vec<PolicyRecord>,
}

impl PolicyStore {
    /// Read the persisted store, or start empty if the file does not exist.
    ///
    /// # Errors
    /// - [`StoreError::Corrupt`] if any record fails the six-field contract;
    ///   there is no partial load.
    /// - [`StoreError::Io`] for any other read failure.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };

        let mut records = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            records.push(parse_line(line).map_err(|reason| StoreError::Corrupt {
                line: index + 1,
                reason,
            })?);
        }
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record to the in-memory set. Durable only after
    /// [`PolicyStore::persist`].
    pub fn append(&mut self, record: PolicyRecord) {
        self.records.push(record);
    }

    pub fn append_all(&mut self, records: impl IntoIterator<Item = PolicyRecord>) {
        self.records.extend(records);
    }

    /// Roll the in-memory set back to `len` records. Used by callers whose
    /// persist failed, so memory and disk never diverge.
    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    /// Replace the in-memory set wholesale. Rollback hook for removal flows
    /// whose persist failed.
    pub fn restore(&mut self, records: Vec<PolicyRecord>) {
        self.records = records;
    }

    /// Remove every record the predicate selects, returning how many.
    pub fn remove_matching(&mut self, mut predicate: impl FnMut(&PolicyRecord) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|record| !predicate(record));
        before - self.records.len()
    }

    pub fn records(&self) -> &[PolicyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Owned copy of the record set, insulated from later mutation.
    pub fn snapshot(&self) -> Vec<PolicyRecord> {
        self.records.clone()
    }

    /// Atomically rewrite the backing file with the full record set.
    ///
    /// # Errors
    /// - [`StoreError::Persistence`] if the temp write or rename fails; the
    ///   previously committed file is left untouched.
    pub fn persist(&self) -> Result<()> {
        let mut contents = String::new();
        for record in &self.records {
            contents.push_str(&format_line(record));
            contents.push('\n');
        }

        let tmp = temp_path(&self.path);
        let write = |path: &Path| -> std::io::Result<()> {
            let mut file = File::create(path)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        };
        write(&tmp)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|err| {
                // Best-effort cleanup; the temp file is garbage either way.
                let _ = fs::remove_file(&tmp);
                StoreError::Persistence(err)
            })
    }
}

// Sibling temp file so the rename stays on one filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// One record per line, six comma-separated fields:
// tag, subject, resource, action, context, effect
fn parse_line(line: &str) -> std::result::Result<PolicyRecord, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [tag, subject, resource, action, context, effect] = fields.as_slice() else {
        return Err(format!("expected 6 fields, found {}", fields.len()));
    };
    let tag = AccessTag::decode(tag).map_err(|err| err.to_string())?;
    let effect = effect.parse().map_err(|err: warden_authz::AuthzError| err.to_string())?;
    Ok(PolicyRecord::new(
        tag, *subject, *resource, *action, *context, effect,
    ))
}

fn format_line(record: &PolicyRecord) -> String {
    format!(
        "{}, {}, {}, {}, {}, {}",
        record.tag.encode(),
        record.subject,
        record.resource,
        record.action,
        record.context,
        record.effect
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_authz::{AccessTag, Effect, TierLevel};

    fn record(subject: &str, resource: &str, effect: Effect) -> PolicyRecord {
        let tag = match effect {
            Effect::Allow => AccessTag::owner(TierLevel::Catalog),
            Effect::Deny => AccessTag::deny_all(TierLevel::Catalog),
        };
        PolicyRecord::new(tag, subject, resource, ".*", ".*", effect)
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PolicyStore::load(dir.path().join("absent.csv")).expect("load");
        assert!(store.is_empty());
    }

    #[test]
    fn persist_load_roundtrip_preserves_order_and_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("policies.csv");

        let mut store = PolicyStore::load(&path).expect("load");
        store.append(record("alice", "ws1\\.job_1(\\..*)?$", Effect::Allow));
        store.append(record(".*", "ws1\\.job_1(\\..*)?$", Effect::Deny));
        store.append(record("bob", "org1:b1(/.*)?$", Effect::Allow));
        store.persist().expect("persist");

        let reloaded = PolicyStore::load(&path).expect("reload");
        assert_eq!(reloaded.records(), store.records());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("policies.csv");
        fs::write(&path, "\n40, alice, ws1(\\..*)?$, .*, .*, allow\n\n").expect("write");

        let store = PolicyStore::load(&path).expect("load");
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].subject, "alice");
    }

    #[test]
    fn corrupt_field_count_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("policies.csv");
        fs::write(&path, "40, alice, ws1, .*, allow\n").expect("write");

        let err = PolicyStore::load(&path).expect_err("corrupt");
        assert!(matches!(err, StoreError::Corrupt { line: 1, .. }));
    }

    #[test]
    fn corrupt_tag_and_effect_are_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("policies.csv");

        fs::write(&path, "99, alice, ws1, .*, .*, allow\n").expect("write");
        assert!(matches!(
            PolicyStore::load(&path).expect_err("bad tag"),
            StoreError::Corrupt { .. }
        ));

        fs::write(&path, "40, alice, ws1, .*, .*, maybe\n").expect("write");
        assert!(matches!(
            PolicyStore::load(&path).expect_err("bad effect"),
            StoreError::Corrupt { .. }
        ));
    }

    #[test]
    fn truncate_rolls_back_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = PolicyStore::load(dir.path().join("policies.csv")).expect("load");
        store.append(record("alice", "ws1", Effect::Allow));
        let committed = store.len();

        store.append_all([
            record("bob", "ws2", Effect::Allow),
            record(".*", "ws2", Effect::Deny),
        ]);
        store.truncate(committed);
        assert_eq!(store.len(), committed);
        assert_eq!(store.records()[0].subject, "alice");
    }

    #[test]
    fn remove_matching_reports_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = PolicyStore::load(dir.path().join("policies.csv")).expect("load");
        store.append(record("alice", "ws1\\.job_1(\\..*)?$", Effect::Allow));
        store.append(record(".*", "ws1\\.job_1(\\..*)?$", Effect::Deny));
        store.append(record("bob", "ws1\\.job_2(\\..*)?$", Effect::Allow));

        let removed = store.remove_matching(|record| record.resource.contains("job_1"));
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].subject, "bob");
    }

    #[test]
    fn persist_failure_leaves_previous_file_intact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("policies.csv");

        let mut store = PolicyStore::load(&path).expect("load");
        store.append(record("alice", "ws1(\\..*)?$", Effect::Allow));
        store.persist().expect("persist");

        // Point a store at a path occupied by a directory so the final
        // rename must fail.
        let blocked = dir.path().join("blocked").join("policies.csv");
        fs::create_dir_all(&blocked).expect("mkdir");
        let broken = PolicyStore {
            path: blocked,
            records: store.snapshot(),
        };
        assert!(matches!(
            broken.persist().expect_err("persist must fail"),
            StoreError::Persistence(_)
        ));

        // The original committed file still reads back cleanly.
        let reloaded = PolicyStore::load(&path).expect("reload original");
        assert_eq!(reloaded.len(), 1);
    }
}
