//! Collision-safe, date-partitioned persistence for result bundles.
//!
//! Bundles land under `{root}/{instance}/{project}/{yyyy-MM-dd}/{file}`.
//! A destination name that is already taken is renumbered (`name 1.zip`,
//! `name 2.zip`, ...) before anything is written, so a successful upload
//! never destroys previously stored data.
//!
//! The existence probe is not atomic across processes. That is acceptable
//! because one instance runs one project at a time and the storage key
//! includes the instance name, so concurrent writers to the same key do not
//! occur by construction; revisit if runs are ever parallelized.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tempfile::NamedTempFile;

/// Persists uploaded result bundles beneath a fixed root directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at `root`. Nothing is created on disk until
    /// the first upload arrives.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory bundles are persisted under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory one bundle belongs in, partitioned by upload date.
    #[must_use]
    pub fn bundle_dir(&self, instance: &str, project: &str, date: NaiveDate) -> PathBuf {
        self.root
            .join(instance)
            .join(project)
            .join(date.format("%Y-%m-%d").to_string())
    }

    /// Creates a scratch file in the storage root for an incoming upload.
    ///
    /// The scratch file lives on the same filesystem as its final
    /// destination, so persisting it is a rename.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created or the
    /// scratch file cannot be opened.
    pub fn scratch_file(&self) -> io::Result<NamedTempFile> {
        std::fs::create_dir_all(&self.root)?;
        NamedTempFile::new_in(&self.root)
    }

    /// Moves a fully received scratch file to its collision-free
    /// destination and returns the path it was stored under.
    ///
    /// # Errors
    ///
    /// Returns an error if the date directory cannot be created or the
    /// rename fails.
    pub async fn persist(
        &self,
        instance: &str,
        project: &str,
        file_name: &str,
        scratch: NamedTempFile,
    ) -> io::Result<PathBuf> {
        let dir = self.bundle_dir(instance, project, Local::now().date_naive());
        tokio::fs::create_dir_all(&dir).await?;

        let target = dir.join(file_name);
        let mut scratch = scratch;
        let mut dest = checked_save(target.clone());
        loop {
            match scratch.persist_noclobber(&dest) {
                Ok(_) => return Ok(dest),
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                    // Lost a race with another writer; renumber and retry.
                    scratch = err.file;
                    dest = checked_save(target.clone());
                }
                Err(err) => return Err(err.error),
            }
        }
    }
}

/// Returns `path` unchanged when it is unused; otherwise inserts an
/// incrementing integer before the extension (`name.ext` → `name 1.ext`,
/// `name 2.ext`, ...) until an unused path is found.
///
/// The returned path never currently exists, and calling this again on its
/// own result returns it unchanged (absent concurrent writes).
#[must_use]
pub fn checked_save(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }

    let mut counter = 1;
    loop {
        let candidate = numbered(&path, counter);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

fn numbered(path: &Path, counter: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => path.with_file_name(format!("{stem} {counter}.{}", ext.to_string_lossy())),
        None => path.with_file_name(format!("{stem} {counter}")),
    }
}
