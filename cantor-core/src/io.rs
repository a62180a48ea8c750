//! # Curve File Exchange
//!
//! One JSON file per `(song, channel)` pair, named `<song>_<channel>.json`,
//! holding an array of `[time_seconds, position]` pairs:
//!
//! ```text
//! [[0.0,0.0],[0.02,0.35],[0.04,0.8], ...]
//! ```
//!
//! Files are validated through [`MotionCurve::new`] when read, so a curve
//! that reaches the player is always well-formed.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::channel::ChannelId;
use crate::curve::MotionCurve;
use crate::error::{CurveError, CurveResult};

/// Extension of curve files
pub const CURVE_EXTENSION: &str = "json";

/// Extension appended to curve files when backed up before filtering
pub const BACKUP_EXTENSION: &str = "backup";

/// `<song>_<channel>.json`
pub fn curve_file_name(song: &str, channel: &ChannelId) -> String {
    format!("{}_{}.{}", song, channel, CURVE_EXTENSION)
}

/// Full path of a curve file inside `dir`
pub fn curve_path(dir: &Path, song: &str, channel: &ChannelId) -> PathBuf {
    dir.join(curve_file_name(song, channel))
}

/// `<song>_<channel>.json.backup`
pub fn backup_path(curve_path: &Path) -> PathBuf {
    let mut name = curve_path.as_os_str().to_owned();
    name.push(".");
    name.push(BACKUP_EXTENSION);
    PathBuf::from(name)
}

/// Splits a curve file stem into `(song, channel)` at the last underscore
pub fn split_stem(stem: &str) -> Option<(&str, &str)> {
    let (song, channel) = stem.rsplit_once('_')?;
    if song.is_empty() || channel.is_empty() {
        return None;
    }
    Some((song, channel))
}

/// Splits a curve file stem using the longest of `channels` that ends it,
/// so channel ids may contain underscores. Falls back to [`split_stem`].
pub fn split_stem_with<'a>(stem: &'a str, channels: &[ChannelId]) -> Option<(&'a str, &'a str)> {
    channels
        .iter()
        .filter_map(|channel| {
            let song = stem.strip_suffix(channel.as_str())?.strip_suffix('_')?;
            (!song.is_empty()).then(|| (song, &stem[song.len() + 1..]))
        })
        .max_by_key(|(_, channel)| channel.len())
        .or_else(|| split_stem(stem))
}

/// Reads and validates one curve file
pub fn read_curve(path: &Path) -> CurveResult<MotionCurve> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CurveError::MissingData(format!("{} not found", path.display()))
        } else {
            CurveError::Io(format!("failed to read {}: {}", path.display(), e))
        }
    })?;

    let pairs: Vec<(f64, f64)> = serde_json::from_str(&content)
        .map_err(|e| CurveError::Format(format!("{}: {}", path.display(), e)))?;

    let curve = MotionCurve::from_pairs(pairs).map_err(|e| match e {
        CurveError::Malformed(msg) => CurveError::Malformed(format!("{}: {}", path.display(), msg)),
        other => other,
    })?;

    debug!(path = %path.display(), samples = curve.len(), "curve loaded");
    Ok(curve)
}

/// Writes a curve, replacing the target only once the new content is on disk
pub fn write_curve(path: &Path, curve: &MotionCurve) -> CurveResult<()> {
    let json = serde_json::to_string(curve)
        .map_err(|e| CurveError::Format(format!("{}: {}", path.display(), e)))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json)
        .map_err(|e| CurveError::Io(format!("failed to write {}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| CurveError::Io(format!("failed to replace {}: {}", path.display(), e)))?;

    debug!(path = %path.display(), samples = curve.len(), "curve written");
    Ok(())
}

/// Copies a curve file to its backup path unless a backup already exists.
/// Returns whether a new backup was made.
pub fn backup_curve(path: &Path) -> CurveResult<bool> {
    let backup = backup_path(path);
    if backup.exists() {
        return Ok(false);
    }
    fs::copy(path, &backup).map_err(|e| {
        CurveError::Io(format!("failed to back up {}: {}", path.display(), e))
    })?;
    Ok(true)
}

/// Copies a backup over its original curve file. Returns the restored path.
pub fn restore_backup(backup: &Path) -> CurveResult<PathBuf> {
    if backup.extension().and_then(|e| e.to_str()) != Some(BACKUP_EXTENSION) {
        return Err(CurveError::Io(format!("{} is not a backup file", backup.display())));
    }
    let original = backup.with_extension("");
    fs::copy(backup, &original).map_err(|e| {
        CurveError::Io(format!("failed to restore {}: {}", original.display(), e))
    })?;
    Ok(original)
}
