//! Timestamped manifest backups and retention

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::constants::backup::INFIX;

/// Copy `manifest` to a new `<manifest>.backup.<YYYYMMDD_HHMMSS>` file.
///
/// Returns `None` when there is no manifest to back up. An existing backup
/// with the same name is never replaced; that case fails with `AlreadyExists`.
pub fn create_backup(manifest: &Path, now: SystemTime) -> io::Result<Option<PathBuf>> {
    let mut source = match fs::File::open(manifest) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %manifest.display(), "no manifest to back up");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let backup = backup_path(manifest, now);
    let file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&backup)?;

    let mut writer = BufWriter::new(file);
    let copied = io::copy(&mut source, &mut writer).and_then(|_| writer.flush());
    if let Err(e) = copied {
        drop(writer);
        let _ = fs::remove_file(&backup);
        return Err(e);
    }

    info!(backup = %backup.display(), "backed up manifest");
    Ok(Some(backup))
}

pub fn backup_path(manifest: &Path, now: SystemTime) -> PathBuf {
    let mut name = backup_prefix(manifest);
    name.push_str(&format_timestamp(now));
    manifest.with_file_name(name)
}

fn backup_prefix(manifest: &Path) -> String {
    let base = manifest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{base}{INFIX}")
}

/// Existing backups of `manifest`, newest first by modification time.
pub fn list_backups(manifest: &Path) -> io::Result<Vec<PathBuf>> {
    let Some(dir) = manifest.parent() else {
        return Ok(Vec::new());
    };
    let prefix = backup_prefix(manifest);

    let mut backups = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            let modified = entry.metadata()?.modified()?;
            backups.push((modified, entry.path()));
        }
    }

    // Same mtime: the later timestamp in the name wins
    backups.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

/// Delete all but the `keep` newest backups. Returns how many were removed.
///
/// Stops at the first deletion failure.
pub fn prune_backups(manifest: &Path, keep: usize) -> io::Result<usize> {
    let backups = list_backups(manifest)?;
    let mut removed = 0;

    for stale in backups.iter().skip(keep) {
        fs::remove_file(stale).inspect_err(|e| {
            warn!(path = %stale.display(), error = %e, "failed to remove old backup");
        })?;
        removed += 1;
    }

    if removed > 0 {
        info!(removed, kept = keep, "pruned old manifest backups");
    }
    Ok(removed)
}

/// `YYYYMMDD_HHMMSS` in UTC, not the local clock.
///
/// Backup names therefore differ from local wall time by the UTC offset.
pub fn format_timestamp(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let days = secs.div_euclid(86_400);
    let of_day = secs.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);

    format!(
        "{year:04}{month:02}{day:02}_{:02}{:02}{:02}",
        of_day / 3600,
        (of_day % 3600) / 60,
        of_day % 60
    )
}

/// Gregorian date for a count of days since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
