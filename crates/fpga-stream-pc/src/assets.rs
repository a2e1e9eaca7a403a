//! Asset store backed by a directory on disk.
//!
//! Layout:
//!
//! ```text
//! <root>/write_spi.bin   bootstrap loader image
//! <root>/<level>.raw     flow-loaded payload
//! <root>/<level>.bit     level configuration image
//! ```

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use fpga_stream_hal::{AssetId, AssetRead, AssetStore};

pub const BOOTSTRAP_FILE: &str = "write_spi.bin";

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read error in {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Maps [`AssetId`]s onto files below one directory.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(AssetError::MissingDirectory(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `id`.
    pub fn path_of(&self, id: AssetId) -> PathBuf {
        match id {
            AssetId::Bootstrap => self.root.join(BOOTSTRAP_FILE),
            AssetId::FlowPayload(level) => self.root.join(format!("{level}.raw")),
            AssetId::Configuration(level) => self.root.join(format!("{level}.bit")),
        }
    }
}

impl AssetStore for DirAssetStore {
    type Error = AssetError;
    type Reader = FileReader;

    fn open(&mut self, id: AssetId) -> Result<FileReader, AssetError> {
        let path = self.path_of(id);
        log::debug!("opening {}", path.display());
        match File::open(&path) {
            Ok(file) => Ok(FileReader {
                inner: BufReader::new(file),
                path,
            }),
            Err(source) => Err(AssetError::Open { path, source }),
        }
    }

    fn with_contents<R>(
        &mut self,
        id: AssetId,
        f: impl FnOnce(&[u8]) -> R,
    ) -> Result<R, AssetError> {
        let path = self.path_of(id);
        let data = fs::read(&path).map_err(|source| AssetError::Open {
            path: path.clone(),
            source,
        })?;
        log::debug!("read {} ({} bytes)", path.display(), data.len());
        Ok(f(&data))
    }
}

/// Buffered reader over one opened asset file. Closed on drop.
#[derive(Debug)]
pub struct FileReader {
    inner: BufReader<File>,
    path: PathBuf,
}

impl AssetRead for FileReader {
    type Error = AssetError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, AssetError> {
        loop {
            match self.inner.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(AssetError::Read {
                        path: self.path.clone(),
                        source,
                    })
                }
                Ok(n) => return Ok(n),
            }
        }
    }
}
