//! Content descriptors handed to `retro_load_game`

use std::ffi::{CString, c_void};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::abi::RetroGameInfo;
use crate::error::HostError;

/// A content file opened for a core.
///
/// Holds the file bytes only when the core asked for them (`need_fullpath`
/// false). The descriptor returned by [`as_game_info`](Self::as_game_info)
/// borrows from this value, so it must outlive the `load_game` call and is
/// dropped right after it.
#[derive(Debug)]
pub struct GameContent {
    path: PathBuf,
    c_path: CString,
    meta: CString,
    size: usize,
    data: Option<Vec<u8>>,
}

impl GameContent {
    /// Open `path`, reading it into memory unless `need_fullpath` is set.
    pub fn open(path: &Path, need_fullpath: bool) -> Result<Self, HostError> {
        let read_err = |source| HostError::ContentRead {
            path: path.to_path_buf(),
            source,
        };

        let c_path = CString::new(path.to_string_lossy().into_owned()).map_err(|_| {
            HostError::ContentPath {
                path: path.to_path_buf(),
            }
        })?;

        let mut file = File::open(path).map_err(read_err)?;
        let size = file.metadata().map_err(read_err)?.len() as usize;

        let data = if need_fullpath {
            None
        } else {
            let mut bytes = Vec::new();
            bytes.try_reserve_exact(size).map_err(|_| {
                read_err(std::io::Error::new(
                    std::io::ErrorKind::OutOfMemory,
                    "content does not fit in memory",
                ))
            })?;
            file.read_to_end(&mut bytes).map_err(read_err)?;
            Some(bytes)
        };

        Ok(Self {
            path: path.to_path_buf(),
            c_path,
            meta: CString::default(),
            size: data.as_ref().map_or(size, Vec::len),
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the file bytes were loaded into memory
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// Borrowed `retro_game_info` view of this content
    pub fn as_game_info(&self) -> RetroGameInfo {
        RetroGameInfo {
            path: self.c_path.as_ptr(),
            data: self
                .data
                .as_ref()
                .map_or(std::ptr::null(), |bytes| bytes.as_ptr() as *const c_void),
            size: self.size,
            meta: self.meta.as_ptr(),
        }
    }
}
