// src/state/statestore.rs

//! Implements [`StateStore`], the state file, and its records
//! [`FileScanState`].
//!
//! The state file holds one literal mapping per line:
//!
//! ```text
//! {'file': b'/var/log/messages', 'offset': 7767698, 'inode': 32455445}
//! ```
//!
//! Older agents wrote `path|offset[|inode]` lines. Those are still read,
//! and rewritten in the current format.

use crate::common::{FileOffset, Inode, Path, PathBuf, INODE_UNSEEN};
use crate::data::literal::{parse_literal, repr_str, Literal};
use crate::readers::helpers::os_str_to_bytes;

use std::collections::BTreeMap;
use std::io::{Error, ErrorKind, Result, Write};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};
use ::tempfile::{Builder, NamedTempFile};

/// Persisted record of one monitored file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileScanState {
    /// the file name as raw bytes
    pub file: Vec<u8>,
    /// position right after the last consumed line; `None` if never scanned
    pub offset: Option<FileOffset>,
    /// [`INODE_UNSEEN`] if never seen
    pub inode: Inode,
}

impl FileScanState {
    pub fn new(file: Vec<u8>) -> FileScanState {
        FileScanState {
            file,
            offset: None,
            inode: INODE_UNSEEN,
        }
    }

    /// Parse one line of a state file, either format.
    pub fn from_line(line: &str) -> Result<FileScanState> {
        match parse_literal(line) {
            Ok(literal) => FileScanState::from_literal(&literal),
            Err(_err) => {
                defo!("not a literal ({}), try legacy format", _err);
                FileScanState::from_legacy_line(line)
            }
        }
    }

    fn from_literal(literal: &Literal) -> Result<FileScanState> {
        let invalid = |msg: &str| Error::new(ErrorKind::InvalidData, format!("{} in state {}", msg, literal));
        let file: Vec<u8> = match literal.dict_get("file") {
            Some(Literal::Bytes(b)) => b.clone(),
            Some(Literal::Str(s)) => s.as_bytes().to_vec(),
            _ => return Err(invalid("missing 'file'")),
        };
        let offset: Option<FileOffset> = match literal.dict_get("offset") {
            None | Some(Literal::None) => None,
            Some(value) => match value.as_int() {
                Some(i) if i >= 0 => Some(i as FileOffset),
                _ => return Err(invalid("invalid 'offset'")),
            },
        };
        let inode: Inode = match literal.dict_get("inode") {
            None | Some(Literal::None) => INODE_UNSEEN,
            Some(value) => value.as_int().ok_or_else(|| invalid("invalid 'inode'"))?,
        };

        Ok(FileScanState { file, offset, inode })
    }

    /// `path|offset[|inode]`
    fn from_legacy_line(line: &str) -> Result<FileScanState> {
        let invalid = || Error::new(ErrorKind::InvalidData, format!("invalid state line {}", repr_str(line)));
        let mut parts = line.split('|');
        let file: Vec<u8> = parts.next().ok_or_else(invalid)?.as_bytes().to_vec();
        let offset: FileOffset = parts
            .next()
            .and_then(|s| s.trim().parse::<FileOffset>().ok())
            .ok_or_else(invalid)?;
        let inode: Inode = match parts.next() {
            Some(s) => s.trim().parse::<Inode>().map_err(|_| invalid())?,
            None => INODE_UNSEEN,
        };

        Ok(FileScanState { file, offset: Some(offset), inode })
    }

    /// The line written to the state file, without line ending.
    pub fn to_line(&self) -> String {
        let mut pairs: Vec<(Literal, Literal)> = vec![(Literal::Str("file".to_string()), Literal::Bytes(self.file.clone()))];
        if let Some(offset) = self.offset {
            pairs.push((Literal::Str("offset".to_string()), Literal::Int(offset as i64)));
        }
        pairs.push((Literal::Str("inode".to_string()), Literal::Int(self.inode)));

        Literal::Dict(pairs).to_string()
    }
}

/// The state of all monitored files, read from and written to one file.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    /// keyed by [`FileScanState::file`]
    data: BTreeMap<Vec<u8>, FileScanState>,
}

impl StateStore {
    pub fn new(path: PathBuf) -> StateStore {
        StateStore {
            path,
            data: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileScanState> {
        self.data.values()
    }

    /// Read the state file. A missing state file is an empty state.
    ///
    /// On error, the records of the lines before the failing line are kept.
    pub fn read(&mut self) -> Result<()> {
        defn!("({:?})", self.path);
        ::log::debug!("Reading state file: {:?}", self.path);
        let data: Vec<u8> = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                defx!("no state file");
                return Ok(());
            }
            Err(err) => {
                defx!("{}", err);
                return Err(err);
            }
        };
        let text = String::from_utf8_lossy(&data);
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let state = FileScanState::from_line(line)?;
            self.data.insert(state.file.clone(), state);
        }
        ::log::info!("Read state: {:?}", self.data.values().collect::<Vec<_>>());
        defx!("{} records", self.data.len());

        Ok(())
    }

    /// The record for `name_fs`, created if missing.
    pub fn get(
        &mut self,
        name_fs: &Path,
    ) -> &mut FileScanState {
        let key: Vec<u8> = os_str_to_bytes(name_fs.as_os_str());
        self.data
            .entry(key)
            .or_insert_with_key(|key| FileScanState::new(key.clone()))
    }

    /// A temporary file in `dir` that will replace the state file.
    fn new_temp_file(dir: &Path) -> Result<NamedTempFile> {
        cfg_if::cfg_if! {
            if #[cfg(unix)] {
                use std::os::unix::fs::PermissionsExt;
                // like any created file, mode 0644 minus the umask; other
                // users may read the state
                Builder::new()
                    .permissions(std::fs::Permissions::from_mode(0o644))
                    .tempfile_in(dir)
            } else {
                Builder::new().tempfile_in(dir)
            }
        }
    }

    /// Rewrite the whole state file.
    ///
    /// The new content is written to a temporary file in the same directory
    /// and renamed over the state file. Records never scanned are not
    /// written.
    pub fn write(&self) -> Result<()> {
        defn!("({:?})", self.path);
        ::log::debug!("Writing state: {:?}", self.data.values().collect::<Vec<_>>());
        ::log::debug!("State filename: {:?}", self.path);
        let dir: &Path = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = StateStore::new_temp_file(dir)?;
        for state in self.data.values().filter(|s| s.offset.is_some()) {
            writeln!(tmp, "{}", state.to_line())?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        defx!();

        Ok(())
    }
}
