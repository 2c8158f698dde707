//! # raft-storage
//!
//! why: durable persistence for raft state using standard rust fs apis
//! relations: implements raft_core::Storage, loaded by RaftNode::restore in raft-http
//! what: FileStorage, plus re-exports of the Storage trait and InMemoryStorage

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

pub use raft_core::storage::{InMemoryStorage, Storage};
use raft_core::{LogEntry, LogIndex, NodeId, Term};

/// file-based storage implementation using std::fs
///
/// stores raft state in a directory with:
/// - meta.json: term and voted_for
/// - log.json: array of log entries, position i holding index i + 1
pub struct FileStorage {
    /// directory path for storing state files
    dir: PathBuf,
}

impl FileStorage {
    /// create a new filestorage at the given directory
    /// creates the directory if it doesn't exist
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// get the path to the metadata file
    fn meta_path(&self) -> PathBuf {
        self.dir.join("meta.json")
    }

    /// get the path to the log file
    fn log_path(&self) -> PathBuf {
        self.dir.join("log.json")
    }

    /// atomic write: write to temp file, fsync, then rename over the target
    fn write_atomic(&self, target: &Path, temp_name: &str, contents: &[u8]) -> io::Result<()> {
        let temp_path = self.dir.join(temp_name);
        let mut file = File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&temp_path, target)
    }

    fn write_log(&self, log: &[LogEntry]) -> io::Result<()> {
        let json = serde_json::to_string_pretty(log)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.write_atomic(&self.log_path(), "log.tmp", json.as_bytes())
    }
}

/// metadata structure for term and vote
#[derive(serde::Serialize, serde::Deserialize, Default)]
struct MetaData {
    term: Term,
    voted_for: Option<NodeId>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> io::Result<T> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    serde_json::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Missing files count as already removed.
fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

impl Storage for FileStorage {
    fn save_term_and_vote(&mut self, term: Term, voted_for: Option<NodeId>) -> io::Result<()> {
        let meta = MetaData { term, voted_for };
        let json = serde_json::to_string_pretty(&meta)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.write_atomic(&self.meta_path(), "meta.tmp", json.as_bytes())?;
        debug!(dir = %self.dir.display(), %term, "saved term and vote");
        Ok(())
    }

    fn load_term_and_vote(&self) -> io::Result<(Term, Option<NodeId>)> {
        let path = self.meta_path();
        if !path.exists() {
            return Ok((Term::ZERO, None)); // default for new nodes
        }

        let meta: MetaData = read_json(&path)?;
        Ok((meta.term, meta.voted_for))
    }

    fn append_entries(&mut self, entries: &[LogEntry]) -> io::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        // write entire log (simple approach - could optimize with append-only file)
        let mut log = self.load_log()?;
        log.extend(entries.iter().cloned());
        self.write_log(&log)
    }

    fn load_log(&self) -> io::Result<Vec<LogEntry>> {
        let path = self.log_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        read_json(&path)
    }

    fn truncate_log_from(&mut self, from_index: LogIndex) -> io::Result<()> {
        let mut log = self.load_log()?;
        log.truncate(from_index.saturating_sub(1) as usize);
        self.write_log(&log)
    }

    fn clear(&mut self) -> io::Result<()> {
        remove_if_exists(&self.meta_path())?;
        remove_if_exists(&self.log_path())
    }
}
