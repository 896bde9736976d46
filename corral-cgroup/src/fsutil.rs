//! Filesystem helpers shared by every controller
//!
//! Each helper maps I/O failures onto the matching [`Error`] variant and
//! carries the offending path.

use std::fs::{DirBuilder, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::Path;

use corral_core::{Error, ParseError, Result};
use tracing::{debug, trace};

use crate::kv;
use crate::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};

/// Create `path` and any missing parents, succeeding if it already exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    debug!(path = %path.display(), "Ensuring controller directory");

    DirBuilder::new()
        .recursive(true)
        .mode(DEFAULT_DIR_MODE)
        .create(path)
        .map_err(|source| Error::DirectoryCreate {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `value` as plain decimal ASCII to the tunable `dir/file`
pub fn write_tunable(dir: &Path, file: &str, value: u64) -> Result<()> {
    let path = dir.join(file);

    debug!(path = %path.display(), value, "Writing tunable");

    let map_err = |source: std::io::Error| Error::FileWrite {
        path: path.clone(),
        source,
    };

    let mut handle = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(DEFAULT_FILE_MODE)
        .open(&path)
        .map_err(map_err)?;

    handle
        .write_all(value.to_string().as_bytes())
        .map_err(map_err)
}

/// Open a stat file for buffered reading
pub fn open_stat(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })
}

/// Read the whole contents of an already opened stat file
pub fn read_to_string(path: &Path, mut reader: impl Read) -> Result<String> {
    let mut content = Vec::new();
    reader
        .read_to_end(&mut content)
        .map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    String::from_utf8(content).map_err(|e| not_utf8(path, e.as_bytes()))
}

fn not_utf8(path: &Path, bytes: &[u8]) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        source: ParseError::NotUtf8 {
            line: String::from_utf8_lossy(bytes).trim_end().to_string(),
        },
    }
}

/// Open and read a single-value file such as `pids.current`
pub fn read_single(path: &Path) -> Result<String> {
    let reader = open_stat(path)?;
    read_to_string(path, reader)
}

/// Open and parse a single unsigned value file such as `cpuacct.usage`
pub fn read_uint(path: &Path) -> Result<u64> {
    let content = read_single(path)?;
    kv::parse_uint(&content).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Feed every `key value` line of an opened stat file to `apply`
///
/// Stops at the first read or parse failure; lines already handed to
/// `apply` stay applied.
pub fn scan_kv(
    path: &Path,
    reader: impl BufRead,
    mut apply: impl FnMut(&str, u64),
) -> Result<()> {
    for chunk in reader.split(b'\n') {
        let bytes = chunk.map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let line = std::str::from_utf8(&bytes).map_err(|_| not_utf8(path, &bytes))?;

        let (key, value) = kv::parse_kv(line).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        trace!(path = %path.display(), key, value, "Parsed stat line");
        apply(key, value);
    }
    Ok(())
}
