//! Delivery of rendered call files into the Asterisk spool directory.
//!
//! The sequence is fixed: write a uniquely named temp file, optionally hand
//! it to the spool user, optionally stamp the scheduled time onto it, then
//! rename it into the spool directory. The rename is the publish step; the
//! daemon may pick the file up the moment it lands, which is why ownership
//! and timestamps are applied while the file is still in the temp
//! location. On any failure after the temp file exists, the temp file is
//! left on disk for diagnosis.

use crate::error::CallFileError;
use chrono::{DateTime, Local};
use nix::libc;
use nix::sys::stat::utimes;
use nix::sys::time::TimeVal;
use nix::unistd::{chown, User};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything `deliver` needs besides the rendered lines.
#[derive(Debug)]
pub struct DeliverOptions<'a> {
    /// Directory for the temp file; system default when `None`.
    pub tmpdir: Option<&'a Path>,
    /// Spool user to chown the file to before publishing.
    pub user: Option<&'a str>,
    /// Earliest moment the daemon may place the call, encoded as the
    /// file's modification time.
    pub schedule: Option<DateTime<Local>>,
    /// Destination directory polled by the daemon.
    pub spool_dir: &'a Path,
    /// Base name to publish under; the generated temp name when `None`.
    pub file_name: Option<&'a str>,
}

/// Write `lines` to a temp file and publish it into the spool directory.
pub fn deliver(lines: &[String], opts: &DeliverOptions) -> Result<(), CallFileError> {
    let tmp_path = write_temp(lines, opts.tmpdir)?;

    if let Some(user) = opts.user {
        set_owner(&tmp_path, user)?;
    }
    if let Some(when) = opts.schedule {
        set_schedule(&tmp_path, when);
    }

    publish(&tmp_path, opts.spool_dir, opts.file_name)
}

/// Write each line plus terminator to a fresh `.call` temp file.
///
/// The handle is flushed and closed before returning, so the bytes are on
/// disk before ownership or timestamps are touched. A write failure drops
/// the handle and the half-written file with it.
fn write_temp(lines: &[String], tmpdir: Option<&Path>) -> Result<PathBuf, CallFileError> {
    let mut builder = tempfile::Builder::new();
    builder.suffix(".call");
    let mut tmp = match tmpdir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|source| CallFileError::WriteTemp { source })?;

    for line in lines {
        writeln!(tmp, "{}", line).map_err(|source| CallFileError::WriteTemp { source })?;
    }
    tmp.flush()
        .map_err(|source| CallFileError::WriteTemp { source })?;

    // keep() disarms the auto-delete; from here on the temp file outlives
    // this function, failures included.
    let (file, path) = tmp
        .keep()
        .map_err(|e| CallFileError::WriteTemp { source: e.error })?;
    drop(file);

    debug!("wrote temporary call file {}", path.display());
    Ok(path)
}

/// Resolve `user` and chown the temp file to it.
///
/// A name the user database does not know and a rejected chown are
/// distinct failures; both leave the temp file in place.
fn set_owner(path: &Path, user: &str) -> Result<(), CallFileError> {
    let entry = User::from_name(user)
        .ok()
        .flatten()
        .ok_or_else(|| CallFileError::UnknownUser {
            user: user.to_string(),
        })?;

    chown(path, Some(entry.uid), Some(entry.gid)).map_err(|source| CallFileError::SetOwner {
        user: user.to_string(),
        source,
    })?;

    debug!("chowned {} to {} ({})", path.display(), user, entry.uid);
    Ok(())
}

/// Stamp the scheduled time onto the temp file's atime and mtime.
///
/// Best effort: a failure here must never block delivery, the call just
/// goes out immediately instead of at the scheduled time.
fn set_schedule(path: &Path, when: DateTime<Local>) {
    let tv = TimeVal::new(when.timestamp() as libc::time_t, 0);
    if let Err(e) = utimes(path, &tv, &tv) {
        debug!(
            "could not set schedule time on {}, call will go out immediately: {}",
            path.display(),
            e
        );
    }
}

/// Atomically move the finished temp file into the spool directory.
fn publish(
    tmp_path: &Path,
    spool_dir: &Path,
    file_name: Option<&str>,
) -> Result<(), CallFileError> {
    let dest = match file_name {
        Some(name) => spool_dir.join(name),
        None => spool_dir.join(tmp_path.file_name().unwrap_or_default()),
    };

    match fs::rename(tmp_path, &dest) {
        Ok(()) => {
            info!("spooled call file {}", dest.display());
            Ok(())
        }
        Err(source) => Err(CallFileError::Spool { dest, source }),
    }
}
