use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Local blob storage for uploaded documents.
///
/// Files are written under a single upload directory and addressed by
/// their absolute path afterwards.
pub struct BlobStorage {
    upload_directory: PathBuf,
}

impl BlobStorage {
    pub fn new<P: AsRef<Path>>(upload_directory: P) -> Self {
        Self {
            upload_directory: upload_directory.as_ref().to_path_buf(),
        }
    }

    pub fn upload_directory(&self) -> &Path {
        &self.upload_directory
    }

    /// Writes `content` as `name` and returns the absolute path.
    ///
    /// Never overwrites: if `name` is taken, `name_2.ext`, `name_3.ext`, …
    /// are tried in turn.
    pub fn store(&self, content: &[u8], name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        self.ensure_directory()?;

        let dir = self
            .upload_directory
            .canonicalize()
            .map_err(|e| StorageError::CreateDirectory {
                path: self.upload_directory.clone(),
                source: e,
            })?;

        let (base, ext) = match name.rfind('.') {
            Some(dot) if dot > 0 => (&name[..dot], Some(&name[dot..])),
            _ => (name, None),
        };

        for counter in 1..=1000 {
            let candidate = if counter == 1 {
                name.to_string()
            } else {
                match ext {
                    Some(ext) => format!("{}_{}{}", base, counter, ext),
                    None => format!("{}_{}", base, counter),
                }
            };
            let path = dir.join(&candidate);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut file) => {
                    file.write_all(content)
                        .map_err(|e| StorageError::WriteFile {
                            path: path.clone(),
                            source: e,
                        })?;
                    log::debug!("Stored upload {} ({} bytes)", candidate, content.len());
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StorageError::WriteFile { path, source: e }),
            }
        }

        Err(StorageError::FileExists(dir.join(name)))
    }

    /// Opens a previously stored file for reading.
    pub fn open(&self, path: &Path) -> Result<File, StorageError> {
        File::open(path).map_err(|e| StorageError::OpenFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn ensure_directory(&self) -> Result<(), StorageError> {
        if !self.upload_directory.exists() {
            std::fs::create_dir_all(&self.upload_directory).map_err(|e| {
                StorageError::CreateDirectory {
                    path: self.upload_directory.clone(),
                    source: e,
                }
            })?;
        }
        Ok(())
    }
}

/// A bare file name: no separators, no parent references.
fn validate_name(name: &str) -> Result<(), StorageError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}
