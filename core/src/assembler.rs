use crate::error::{ByteToneError, Result};
use crate::extension::extract_extension;
use crate::{EXTENSION_SEPARATOR, MAX_COLLISION_ATTEMPTS};
use log::debug;
use std::ffi::OsString;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Collects decoded bytes in a temporary file next to the output base, then gives it
/// its final `<base><n><ext>` name.
///
/// Dropping the assembler before [`FileAssembler::finish`] removes the temporary file,
/// so a failed or cancelled decode never leaves a file under a final name.
pub struct FileAssembler {
    base: PathBuf,
    temp: NamedTempFile,
}

impl FileAssembler {
    pub fn create(base: &Path) -> Result<Self> {
        let dir = match base.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)?;
        debug!("Collecting decoded bytes in {}", temp.path().display());
        Ok(Self {
            base: base.to_path_buf(),
            temp,
        })
    }

    pub fn file_mut(&mut self) -> &mut File {
        self.temp.as_file_mut()
    }

    /// Cut the trailing extension off the collected bytes and return it
    pub fn take_extension(&mut self) -> Result<Vec<u8>> {
        extract_extension(self.temp.as_file_mut())
    }

    /// Move the payload to the first free name among `<base>1<ext>`, `<base>2<ext>`, ...
    /// without ever replacing an existing file.
    pub fn finish(self, extension: &[u8]) -> Result<PathBuf> {
        let mut temp = self.temp;
        for n in 1..=MAX_COLLISION_ATTEMPTS {
            let candidate = numbered_path(&self.base, n, extension);
            match temp.persist_noclobber(&candidate) {
                Ok(_) => return Ok(candidate),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} exists, trying next number", candidate.display());
                    temp = e.file;
                }
                Err(e) => return Err(e.error.into()),
            }
        }
        Err(ByteToneError::CollisionsExhausted {
            attempts: MAX_COLLISION_ATTEMPTS,
        })
    }
}

/// `<base><n><ext>`; a bare separator means the original file had no extension
pub fn numbered_path(base: &Path, n: usize, extension: &[u8]) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(n.to_string());
    if extension != [EXTENSION_SEPARATOR].as_slice() {
        name.push(String::from_utf8_lossy(extension).as_ref());
    }
    PathBuf::from(name)
}
