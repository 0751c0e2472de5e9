//! Artifact directory packaging.
//!
//! After a benchmark process exits, everything it left in its artifact
//! directory is compressed into a single zip archive for upload. Relative
//! paths inside the directory are preserved.

use std::fs::File;
use std::io;
use std::path::Path;

use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use benchrelay_core::{Error, Result};

/// Compresses the contents of `src` into a zip archive at `dest`.
///
/// # Errors
///
/// Returns [`Error::Archive`] when `src` cannot be walked or the archive
/// cannot be written.
pub fn pack_directory(src: &Path, dest: &Path) -> Result<()> {
    let file = File::create(dest).map_err(|err| {
        Error::archive_with_source(format!("failed to create archive {}", dest.display()), err)
    })?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|err| {
            Error::archive_with_source(format!("failed to walk {}", src.display()), err)
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|err| Error::archive_with_source("artifact path escaped its root", err))?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|err| archive_write_error(entry.path(), err))?;
        } else if entry.file_type().is_file() {
            writer
                .start_file(name, options)
                .map_err(|err| archive_write_error(entry.path(), err))?;
            let mut source = File::open(entry.path()).map_err(|err| {
                Error::archive_with_source(
                    format!("failed to read artifact {}", entry.path().display()),
                    err,
                )
            })?;
            io::copy(&mut source, &mut writer).map_err(|err| {
                Error::archive_with_source(
                    format!("failed to compress artifact {}", entry.path().display()),
                    err,
                )
            })?;
        }
        // Symlinks and other special files are skipped.
    }

    writer
        .finish()
        .map_err(|err| Error::archive_with_source("failed to finalize archive", err))?;
    Ok(())
}

fn archive_write_error(path: &Path, err: zip::result::ZipError) -> Error {
    Error::archive_with_source(format!("failed to archive {}", path.display()), err)
}
