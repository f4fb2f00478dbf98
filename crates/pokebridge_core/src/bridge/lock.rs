use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Advisory lock: a `<save>.lock` file created exclusively and holding a
/// token unique to this holder. Removed on release or drop.
#[derive(Debug)]
pub struct SaveLock {
    path: PathBuf,
    token: String,
    released: bool,
}

impl SaveLock {
    pub fn lock_path(save_path: &Path) -> PathBuf {
        let mut name = save_path.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    pub fn acquire(save_path: &Path) -> io::Result<Self> {
        let path = Self::lock_path(save_path);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let token = format!("{}-{nanos}", std::process::id());

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} is locked by another holder", save_path.display()),
                    )
                } else {
                    e
                }
            })?;
        file.write_all(token.as_bytes())?;
        file.sync_all()?;

        Ok(Self {
            path,
            token,
            released: false,
        })
    }

    /// True while the lock file still exists and carries our token.
    pub fn verify(&self) -> bool {
        !self.released && self.verify_token()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) -> io::Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        if self.verify_token() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn verify_token(&self) -> bool {
        fs::read_to_string(&self.path).is_ok_and(|content| content == self.token)
    }
}

impl Drop for SaveLock {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner() {
            log::warn!("failed to remove lock {:?}: {e}", self.path);
        }
    }
}
