use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{Local, NaiveDateTime, Timelike};
use tracing::{debug, info};

use super::format;
use super::naming::artifact_stem;
use super::{Artifact, ArtifactError, ArtifactId, ArtifactKind, Metadata};

/// Same-second saves get `_1`, `_2`, ... up to this many attempts.
const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone)]
struct IndexEntry {
    kind: ArtifactKind,
    modified: SystemTime,
    /// Save order within this process; 0 for files found on disk.
    seq: u64,
}

/// Artifact directories plus an index of what they contain.
///
/// The index is built by scanning once in [`open`](Self::open) and updated
/// on every [`save`](Self::save); [`refresh`](Self::refresh) rescans.
pub struct ArtifactStore {
    root: PathBuf,
    index: BTreeMap<ArtifactId, IndexEntry>,
    next_seq: u64,
}

impl ArtifactStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let mut store = Self {
            root: root.into(),
            index: BTreeMap::new(),
            next_seq: 1,
        };
        store.refresh()?;
        Ok(store)
    }

    pub fn dir(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Rebuild the index from the directories on disk.
    pub fn refresh(&mut self) -> Result<(), ArtifactError> {
        let mut index = BTreeMap::new();
        for kind in ArtifactKind::ALL {
            let dir = self.dir(kind);
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(source) => return Err(ArtifactError::Persistence { path: dir, source }),
            };

            for entry in entries {
                let entry = entry.map_err(|source| ArtifactError::Persistence {
                    path: dir.clone(),
                    source,
                })?;
                let Some(name) = entry.file_name().to_str().map(ArtifactId::from) else {
                    continue;
                };
                if name.kind() != Some(kind) {
                    continue;
                }
                let modified = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                index.insert(
                    name,
                    IndexEntry {
                        kind,
                        modified,
                        seq: 0,
                    },
                );
            }
        }
        debug!(root = %self.root.display(), artifacts = index.len(), "artifact index built");
        self.index = index;
        Ok(())
    }

    /// Write a new artifact and return its id. Never overwrites an existing file.
    pub fn save(
        &mut self,
        kind: ArtifactKind,
        topic: &str,
        body: &str,
        metadata: &Metadata,
    ) -> Result<ArtifactId, ArtifactError> {
        let now = Local::now().naive_local();
        self.save_at(kind, topic, body, metadata, now.with_nanosecond(0).unwrap_or(now))
    }

    pub(crate) fn save_at(
        &mut self,
        kind: ArtifactKind,
        topic: &str,
        body: &str,
        metadata: &Metadata,
        at: NaiveDateTime,
    ) -> Result<ArtifactId, ArtifactError> {
        let dir = self.dir(kind);
        fs::create_dir_all(&dir).map_err(|source| ArtifactError::Persistence {
            path: dir.clone(),
            source,
        })?;

        let stem = artifact_stem(kind, topic, at);
        let (id, path, mut file) = create_unique(&dir, &stem)?;
        let content = format::render(kind, topic, at, metadata, body);
        file.write_all(content.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|source| ArtifactError::Persistence {
                path: path.clone(),
                source,
            })?;

        let modified = file
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or_else(|_| SystemTime::now());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(id.clone(), IndexEntry { kind, modified, seq });

        info!(kind = %kind, id = %id, bytes = content.len(), "artifact saved");
        Ok(id)
    }

    /// Ids of one kind, most recently modified first.
    pub fn list(&self, kind: ArtifactKind) -> Vec<ArtifactId> {
        let mut entries: Vec<(&ArtifactId, &IndexEntry)> = self
            .index
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .collect();
        entries.sort_by(|(a_id, a), (b_id, b)| {
            (b.modified, b.seq, *b_id).cmp(&(a.modified, a.seq, *a_id))
        });
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Most recent artifact of a kind, if any.
    pub fn latest(&self, kind: ArtifactKind) -> Option<ArtifactId> {
        self.list(kind).into_iter().next()
    }

    /// Body text of an artifact, exactly as it was saved.
    pub fn load(&self, id: &ArtifactId) -> Result<String, ArtifactError> {
        Ok(self.load_artifact(id)?.body)
    }

    /// Artifact with its header fields parsed back.
    pub fn load_artifact(&self, id: &ArtifactId) -> Result<Artifact, ArtifactError> {
        let (kind, path) = self.resolve(id)?;
        let content = fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ArtifactError::NotFound(id.to_string()),
            _ => ArtifactError::Persistence {
                path: path.clone(),
                source,
            },
        })?;

        let doc = format::parse(kind, &content);
        debug!(id = %id, bytes = content.len(), "artifact loaded");
        Ok(Artifact {
            id: id.clone(),
            kind,
            topic: doc.header.topic,
            created_at: doc.header.created_at,
            metadata: doc.header.metadata,
            body: doc.body,
        })
    }

    /// Path of an artifact file; the file itself may not exist.
    pub fn path_of(&self, id: &ArtifactId) -> Result<PathBuf, ArtifactError> {
        self.resolve(id).map(|(_, path)| path)
    }

    fn resolve(&self, id: &ArtifactId) -> Result<(ArtifactKind, PathBuf), ArtifactError> {
        let kind = id
            .kind()
            .ok_or_else(|| ArtifactError::NotFound(id.to_string()))?;
        Ok((kind, self.dir(kind).join(id.as_str())))
    }
}

fn create_unique(dir: &Path, stem: &str) -> Result<(ArtifactId, PathBuf, File), ArtifactError> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{stem}.md")
        } else {
            format!("{stem}_{attempt}.md")
        };
        let path = dir.join(&name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((ArtifactId::new(name), path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(ArtifactError::Persistence { path, source }),
        }
    }
    Err(ArtifactError::Persistence {
        path: dir.join(format!("{stem}.md")),
        source: io::Error::new(ErrorKind::AlreadyExists, "no free artifact name left"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{META_LENGTH, META_LEVEL, META_TONE};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn store() -> (TempDir, ArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn at(sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 5, sec)
            .unwrap()
    }

    fn draft_meta() -> Metadata {
        let mut meta = Metadata::new();
        meta.insert(META_LEVEL.into(), "graduate".into());
        meta.insert(META_LENGTH.into(), "750-1000 words".into());
        meta.insert(META_TONE.into(), "Reflective".into());
        meta
    }

    #[test]
    fn open_on_missing_directories_is_empty() {
        let (_dir, store) = store();
        assert!(store.list(ArtifactKind::Plan).is_empty());
        assert!(store.list(ArtifactKind::Draft).is_empty());
    }

    #[test]
    fn save_creates_directory_and_file() {
        let (dir, mut store) = store();
        let id = store
            .save_at(ArtifactKind::Plan, "Predestination", "outline", &Metadata::new(), at(7))
            .unwrap();
        assert_eq!(id.as_str(), "plan_Predestination_20260314_090507.md");
        assert!(dir.path().join("draftplan").join(id.as_str()).is_file());
    }

    #[test]
    fn round_trip_preserves_body_for_both_kinds() {
        let (_dir, mut store) = store();
        let body = "First paragraph.\n\nSecond paragraph.\n\n\n## Not a header\n";

        let plan = store
            .save(ArtifactKind::Plan, "Grace", body, &Metadata::new())
            .unwrap();
        let draft = store
            .save(ArtifactKind::Draft, "Grace", body, &draft_meta())
            .unwrap();

        assert_eq!(store.load(&plan).unwrap(), body);
        assert_eq!(store.load(&draft).unwrap(), body);
    }

    #[test]
    fn load_artifact_parses_draft_header() {
        let (_dir, mut store) = store();
        let id = store
            .save_at(ArtifactKind::Draft, "Grace & Works", "text", &draft_meta(), at(1))
            .unwrap();
        let artifact = store.load_artifact(&id).unwrap();
        assert_eq!(artifact.kind, ArtifactKind::Draft);
        assert_eq!(artifact.topic, "Grace & Works");
        assert_eq!(artifact.created_at, Some(at(1)));
        assert_eq!(artifact.metadata, draft_meta());
        assert_eq!(artifact.body, "text");
    }

    #[test]
    fn same_second_saves_never_overwrite() {
        let (_dir, mut store) = store();
        let first = store
            .save_at(ArtifactKind::Draft, "Grace", "one", &draft_meta(), at(2))
            .unwrap();
        let second = store
            .save_at(ArtifactKind::Draft, "Grace", "two", &draft_meta(), at(2))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(second.as_str(), "draft_Grace_20260314_090502_1.md");
        assert_eq!(store.load(&first).unwrap(), "one");
        assert_eq!(store.load(&second).unwrap(), "two");
    }

    #[test]
    fn list_is_most_recent_first_and_filtered_by_kind() {
        let (_dir, mut store) = store();
        let a = store
            .save_at(ArtifactKind::Plan, "A", "a", &Metadata::new(), at(1))
            .unwrap();
        let b = store
            .save_at(ArtifactKind::Plan, "B", "b", &Metadata::new(), at(2))
            .unwrap();
        store
            .save_at(ArtifactKind::Draft, "C", "c", &Metadata::new(), at(3))
            .unwrap();

        assert_eq!(store.list(ArtifactKind::Plan), vec![b.clone(), a]);
        assert_eq!(store.latest(ArtifactKind::Plan), Some(b));
        assert_eq!(store.list(ArtifactKind::Draft).len(), 1);
    }

    #[test]
    fn reopen_finds_existing_files_and_ignores_foreign_ones() {
        let (dir, mut store) = store();
        let id = store
            .save(ArtifactKind::Plan, "Grace", "body", &Metadata::new())
            .unwrap();
        fs::write(dir.path().join("draftplan").join("notes.txt"), "x").unwrap();

        let reopened = ArtifactStore::open(dir.path()).unwrap();
        assert_eq!(reopened.list(ArtifactKind::Plan), vec![id]);
    }

    #[test]
    fn refresh_picks_up_files_written_by_others() {
        let (dir, mut store) = store();
        fs::create_dir_all(dir.path().join("draftwriting")).unwrap();
        fs::write(
            dir.path().join("draftwriting").join("draft_x_20250101_000000.md"),
            "# Theology Assignment Draft: x\n\nbody",
        )
        .unwrap();
        assert!(store.list(ArtifactKind::Draft).is_empty());
        store.refresh().unwrap();
        assert_eq!(store.list(ArtifactKind::Draft).len(), 1);
    }

    #[test]
    fn load_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store
            .load(&ArtifactId::from("plan_nothing_20260101_000000.md"))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
    }

    #[test]
    fn load_rejects_path_traversal() {
        let (_dir, store) = store();
        let err = store.load(&ArtifactId::from("../../etc/passwd")).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
    }

    #[test]
    fn save_into_unwritable_root_is_persistence_error() {
        let (dir, mut store) = store();
        // A plain file where the plan directory should be.
        fs::write(dir.path().join("draftplan"), "not a directory").unwrap();

        let err = store
            .save(ArtifactKind::Plan, "Grace", "x", &Metadata::new())
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Persistence { .. }));
    }
}
