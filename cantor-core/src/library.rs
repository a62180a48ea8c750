//! Curve library
//!
//! Explicit index of the processed songs found in a curve directory. Built
//! once by the caller and passed to whoever needs it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::channel::{ChannelId, ChannelMap};
use crate::curve::MotionCurve;
use crate::error::{CurveError, CurveResult};
use crate::io::{self, BACKUP_EXTENSION, CURVE_EXTENSION};

/// Audio extensions tried when looking up a song's original track
pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "m4a"];

/// Curves loaded for one song
#[derive(Debug, Default)]
pub struct SongCurves {
    /// Channels with a valid curve
    pub curves: ChannelMap<MotionCurve>,
    /// Channels with no curve file
    pub missing: Vec<ChannelId>,
    /// Channels whose curve file was rejected
    pub rejected: Vec<(ChannelId, CurveError)>,
}

/// Index of `<song>_<channel>.json` files
#[derive(Debug, Clone)]
pub struct CurveLibrary {
    curve_dir: PathBuf,
    channels: Vec<ChannelId>,
    songs: BTreeMap<String, BTreeSet<ChannelId>>,
}

impl CurveLibrary {
    /// Opens and scans a curve directory. A missing directory yields an
    /// empty library.
    pub fn open(curve_dir: impl Into<PathBuf>) -> CurveResult<Self> {
        Self::open_with_channels(curve_dir, Vec::new())
    }

    /// Opens a curve directory whose file names are split against the
    /// configured channel ids, which may contain underscores
    pub fn open_with_channels(
        curve_dir: impl Into<PathBuf>,
        channels: impl IntoIterator<Item = ChannelId>,
    ) -> CurveResult<Self> {
        let mut library = Self {
            curve_dir: curve_dir.into(),
            channels: channels.into_iter().collect(),
            songs: BTreeMap::new(),
        };
        library.scan()?;
        Ok(library)
    }

    pub fn curve_dir(&self) -> &Path {
        &self.curve_dir
    }

    /// Rebuilds the index from disk
    pub fn scan(&mut self) -> CurveResult<()> {
        self.songs.clear();

        if !self.curve_dir.is_dir() {
            debug!(dir = %self.curve_dir.display(), "curve directory does not exist");
            return Ok(());
        }

        let entries = fs::read_dir(&self.curve_dir).map_err(|e| {
            CurveError::Io(format!("failed to list {}: {}", self.curve_dir.display(), e))
        })?;

        for entry in entries {
            let path = entry
                .map_err(|e| CurveError::Io(format!("failed to list {}: {}", self.curve_dir.display(), e)))?
                .path();

            if path.extension().and_then(|e| e.to_str()) != Some(CURVE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some((song, channel)) = io::split_stem_with(stem, &self.channels) {
                self.songs
                    .entry(song.to_string())
                    .or_default()
                    .insert(ChannelId::new(channel));
            }
        }

        info!(songs = self.songs.len(), dir = %self.curve_dir.display(), "curve library scanned");
        Ok(())
    }

    /// Song names, sorted
    pub fn songs(&self) -> impl Iterator<Item = &str> {
        self.songs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn has_song(&self, song: &str) -> bool {
        self.songs.contains_key(song)
    }

    /// Channels that have a curve file for `song`
    pub fn channels_for(&self, song: &str) -> Vec<ChannelId> {
        self.songs
            .get(song)
            .map(|channels| channels.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Curve files of `song` (all songs when `None`)
    pub fn curve_files(&self, song: Option<&str>) -> Vec<PathBuf> {
        self.songs
            .iter()
            .filter(|(name, _)| song.is_none_or(|s| s == name.as_str()))
            .flat_map(|(name, channels)| {
                channels.iter().map(move |ch| io::curve_path(&self.curve_dir, name, ch))
            })
            .collect()
    }

    /// Backup files in the curve directory, optionally restricted to a song
    pub fn backup_files(&self, song: Option<&str>) -> CurveResult<Vec<PathBuf>> {
        if !self.curve_dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.curve_dir).map_err(|e| {
            CurveError::Io(format!("failed to list {}: {}", self.curve_dir.display(), e))
        })?;

        let backup_suffix = format!(".{}.{}", CURVE_EXTENSION, BACKUP_EXTENSION);
        let mut backups = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            let belongs = match song {
                None => true,
                Some(song) => path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|name| name.strip_suffix(&backup_suffix))
                    .and_then(|stem| io::split_stem_with(stem, &self.channels))
                    .is_some_and(|(owner, _)| owner == song),
            };
            if belongs {
                backups.push(path);
            }
        }
        backups.sort();
        Ok(backups)
    }

    /// Loads the curves of `song` for the requested channels.
    ///
    /// Missing or malformed channel files are logged and reported in the
    /// result; only a song with no loadable channel at all is an error.
    pub fn load_song<'a, I>(&self, song: &str, channels: I) -> CurveResult<SongCurves>
    where
        I: IntoIterator<Item = &'a ChannelId>,
    {
        let mut loaded = SongCurves::default();

        for channel in channels {
            let path = io::curve_path(&self.curve_dir, song, channel);
            match io::read_curve(&path) {
                Ok(curve) => {
                    debug!(%channel, frames = curve.len(), "channel curve loaded");
                    loaded.curves.insert(channel.clone(), curve);
                }
                Err(CurveError::MissingData(_)) => {
                    warn!(%channel, song, "no curve file for channel");
                    loaded.missing.push(channel.clone());
                }
                Err(err) => {
                    error!(%channel, song, %err, "curve rejected");
                    loaded.rejected.push((channel.clone(), err));
                }
            }
        }

        if loaded.curves.is_empty() {
            return Err(CurveError::MissingData(format!("no curve data found for song '{}'", song)));
        }

        Ok(loaded)
    }

    /// Finds the original audio track of `song` in `songs_dir`
    pub fn find_audio(song: &str, songs_dir: &Path) -> Option<PathBuf> {
        AUDIO_EXTENSIONS
            .iter()
            .map(|ext| songs_dir.join(format!("{}.{}", song, ext)))
            .find(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, song: &str, channel: &str, pairs: &[(f64, f64)]) {
        let curve = MotionCurve::from_pairs(pairs.iter().copied()).unwrap();
        io::write_curve(&io::curve_path(dir, song, &ChannelId::new(channel)), &curve).unwrap();
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let library = CurveLibrary::open(dir.path().join("absent")).unwrap();
        assert!(library.is_empty());
    }

    #[test]
    fn test_scan_groups_by_song() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "my_son_john", "servo1", &[(0.0, 0.0)]);
        write(dir.path(), "my_son_john", "servo2", &[(0.0, 0.0)]);
        write(dir.path(), "daisy", "servo1", &[(0.0, 0.0)]);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let library = CurveLibrary::open(dir.path()).unwrap();
        assert_eq!(library.songs().collect::<Vec<_>>(), vec!["daisy", "my_son_john"]);
        assert!(library.has_song("daisy"));
        assert_eq!(
            library.channels_for("my_son_john"),
            vec![ChannelId::new("servo1"), ChannelId::new("servo2")]
        );
        assert_eq!(library.curve_files(Some("daisy")).len(), 1);
        assert_eq!(library.curve_files(None).len(), 3);
    }

    #[test]
    fn test_load_song_reports_missing_channels() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "daisy", "servo1", &[(0.0, 0.0), (0.1, 1.0)]);

        let library = CurveLibrary::open(dir.path()).unwrap();
        let channels = [ChannelId::new("servo1"), ChannelId::new("servo2")];
        let loaded = library.load_song("daisy", &channels).unwrap();

        assert_eq!(loaded.curves.len(), 1);
        assert!(loaded.curves.contains_key("servo1"));
        assert_eq!(loaded.missing, vec![ChannelId::new("servo2")]);
    }

    #[test]
    fn test_load_song_isolates_malformed_channel() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "daisy", "servo1", &[(0.0, 0.0), (0.1, 1.0)]);
        fs::write(dir.path().join("daisy_servo2.json"), "[[0.3,0.0],[0.1,1.0]]").unwrap();

        let library = CurveLibrary::open(dir.path()).unwrap();
        let channels = [ChannelId::new("servo1"), ChannelId::new("servo2")];
        let loaded = library.load_song("daisy", &channels).unwrap();

        assert_eq!(loaded.curves.len(), 1);
        assert_eq!(loaded.rejected.len(), 1);
        assert!(matches!(loaded.rejected[0].1, CurveError::Malformed(_)));
    }

    #[test]
    fn test_load_unknown_song_fails() {
        let dir = tempfile::tempdir().unwrap();
        let library = CurveLibrary::open(dir.path()).unwrap();
        let channels = [ChannelId::new("servo1")];
        assert!(matches!(
            library.load_song("nothing", &channels),
            Err(CurveError::MissingData(_))
        ));
    }

    #[test]
    fn test_backup_files_filtered_by_song() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "daisy", "servo1", &[(0.0, 0.0)]);
        write(dir.path(), "bell", "servo1", &[(0.0, 0.0)]);
        io::backup_curve(&dir.path().join("daisy_servo1.json")).unwrap();
        io::backup_curve(&dir.path().join("bell_servo1.json")).unwrap();

        let library = CurveLibrary::open(dir.path()).unwrap();
        assert_eq!(library.backup_files(None).unwrap().len(), 2);
        assert_eq!(library.backup_files(Some("daisy")).unwrap().len(), 1);
        // backups are not songs
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_channel_ids_with_underscores() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "daisy", "mouth_left", &[(0.0, 0.0)]);
        write(dir.path(), "daisy", "mouth_right", &[(0.0, 0.0)]);
        write(dir.path(), "my_son_john", "mouth_left", &[(0.0, 0.0)]);

        let channels = [ChannelId::new("mouth_left"), ChannelId::new("mouth_right")];
        let library = CurveLibrary::open_with_channels(dir.path(), channels.clone()).unwrap();

        assert_eq!(library.songs().collect::<Vec<_>>(), vec!["daisy", "my_son_john"]);
        assert!(library.has_song("daisy"));
        assert_eq!(library.channels_for("daisy"), channels.to_vec());
        assert_eq!(library.load_song("daisy", &channels).unwrap().curves.len(), 2);
    }

    #[test]
    fn test_backup_files_do_not_match_song_prefix() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "my", "servo1", &[(0.0, 0.0)]);
        write(dir.path(), "my_song", "servo1", &[(0.0, 0.0)]);
        io::backup_curve(&dir.path().join("my_servo1.json")).unwrap();
        io::backup_curve(&dir.path().join("my_song_servo1.json")).unwrap();

        let library = CurveLibrary::open(dir.path()).unwrap();
        assert_eq!(
            library.backup_files(Some("my")).unwrap(),
            vec![dir.path().join("my_servo1.json.backup")]
        );
        assert_eq!(
            library.backup_files(Some("my_song")).unwrap(),
            vec![dir.path().join("my_song_servo1.json.backup")]
        );
    }

    #[test]
    fn test_backup_files_with_underscored_channel() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "daisy", "mouth_left", &[(0.0, 0.0)]);
        io::backup_curve(&dir.path().join("daisy_mouth_left.json")).unwrap();

        let library =
            CurveLibrary::open_with_channels(dir.path(), [ChannelId::new("mouth_left")]).unwrap();
        assert_eq!(library.backup_files(Some("daisy")).unwrap().len(), 1);
        assert!(library.backup_files(Some("daisy_mouth")).unwrap().is_empty());
    }

    #[test]
    fn test_find_audio() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("daisy.wav"), b"RIFF").unwrap();

        assert_eq!(
            CurveLibrary::find_audio("daisy", dir.path()),
            Some(dir.path().join("daisy.wav"))
        );
        assert_eq!(CurveLibrary::find_audio("bell", dir.path()), None);
    }
}
