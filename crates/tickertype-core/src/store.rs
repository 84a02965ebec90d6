//! Flat-file persistence for the three ticker lists.
//!
//! Each list lives in its own newline-delimited file under the data directory,
//! one uppercase ticker per line, sorted. Writes go to a temporary file in the
//! same directory that is then renamed over the target. If that fails the list
//! is written directly, and if even that fails the error is logged and the
//! in-memory state stays authoritative.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, warn};

use crate::{ListKind, Ticker};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How a list write actually reached disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Temp file renamed into place.
    Atomic,
    /// Atomic path failed; the file was overwritten in place.
    Direct,
    /// Both paths failed; only the in-memory copy is current.
    Lost,
}

/// All three lists as loaded from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredLists {
    pub original: BTreeSet<Ticker>,
    pub fetched: BTreeSet<Ticker>,
    pub blacklist: BTreeSet<Ticker>,
}

/// Directory-backed store for the original, fetched, and blacklist files.
#[derive(Debug, Clone)]
pub struct TickerStore {
    dir: PathBuf,
    staging: PathBuf,
}

impl TickerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            staging: dir.clone(),
            dir,
        }
    }

    /// Stage temp files somewhere other than the list directory.
    ///
    /// The staging directory must share a filesystem with the list directory,
    /// otherwise every rename fails and saves land as [`Durability::Direct`].
    pub fn with_staging_dir(mut self, staging: impl Into<PathBuf>) -> Self {
        self.staging = staging.into();
        self
    }

    pub fn path_for(&self, kind: ListKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Read one list. A missing file is an empty list; unparseable lines,
    /// including ones that are not valid UTF-8, are skipped.
    pub fn load(&self, kind: ListKind) -> Result<BTreeSet<Ticker>, StoreError> {
        let path = self.path_for(kind);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(BTreeSet::new())
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(parse_lines(kind, &String::from_utf8_lossy(&bytes)))
    }

    pub fn load_all(&self) -> Result<StoredLists, StoreError> {
        Ok(StoredLists {
            original: self.load(ListKind::Original)?,
            fetched: self.load(ListKind::Fetched)?,
            blacklist: self.load(ListKind::Blacklist)?,
        })
    }

    /// Replace one list on disk. Never fails; the returned value says how it landed.
    pub fn save(&self, kind: ListKind, tickers: &BTreeSet<Ticker>) -> Durability {
        let path = self.path_for(kind);
        let contents = render_lines(tickers);

        match self.write_atomic(&path, contents.as_bytes()) {
            Ok(()) => Durability::Atomic,
            Err(atomic_error) => {
                warn!(
                    list = %kind,
                    path = %path.display(),
                    error = %atomic_error,
                    "atomic write failed, falling back to direct write"
                );
                match fs::write(&path, contents.as_bytes()) {
                    Ok(()) => Durability::Direct,
                    Err(direct_error) => {
                        error!(
                            list = %kind,
                            path = %path.display(),
                            error = %direct_error,
                            "could not persist list"
                        );
                        Durability::Lost
                    }
                }
            }
        }
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::create_dir_all(&self.staging)?;
        let mut staged = NamedTempFile::new_in(&self.staging)?;
        staged.write_all(contents)?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|error| error.error)?;
        Ok(())
    }
}

fn parse_lines(kind: ListKind, contents: &str) -> BTreeSet<Ticker> {
    let mut tickers = BTreeSet::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match Ticker::parse(line) {
            Ok(ticker) => {
                tickers.insert(ticker);
            }
            Err(error) => {
                warn!(list = %kind, line = index + 1, %error, "skipping invalid ticker line");
            }
        }
    }
    tickers
}

fn render_lines(tickers: &BTreeSet<Ticker>) -> String {
    let mut contents = String::with_capacity(tickers.len() * 6);
    for ticker in tickers {
        contents.push_str(ticker.as_str());
        contents.push('\n');
    }
    contents
}
