// ── Brightness memory ──
//
// Remembers each light's last nonzero brightness so turning it back on
// restores the level the user chose. Persistence is best effort: a broken
// file means an empty memory, never an error.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::model::{DeviceId, Percent};

/// Level used when a light is switched on with nothing remembered.
pub const DEFAULT_RESTORE: Percent = Percent(75);

/// Last-nonzero-brightness store, keyed by device.
pub trait BrightnessMemory: Send + Sync {
    /// Record `level` for `device`. Zero is ignored.
    fn remember(&self, device: &DeviceId, level: Percent);

    fn recall(&self, device: &DeviceId) -> Option<Percent>;
}

// ── In-memory ───────────────────────────────────────────────────────

/// Memory that lives as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryBrightness {
    levels: DashMap<DeviceId, Percent>,
}

impl InMemoryBrightness {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BrightnessMemory for InMemoryBrightness {
    fn remember(&self, device: &DeviceId, level: Percent) {
        if !level.is_zero() {
            self.levels.insert(*device, level);
        }
    }

    fn recall(&self, device: &DeviceId) -> Option<Percent> {
        self.levels.get(device).map(|l| *l)
    }
}

// ── File-backed ─────────────────────────────────────────────────────

/// Memory persisted as a JSON object (`{"light:12": 80}`).
///
/// The whole file is rewritten on every change; it holds one small entry
/// per light. Writes go to a sibling temp file that is renamed over the
/// old one, so readers never see a half-written file.
#[derive(Debug)]
pub struct FileBrightnessMemory {
    path: PathBuf,
    levels: DashMap<DeviceId, Percent>,
    write_lock: Mutex<()>,
}

impl FileBrightnessMemory {
    /// Open (or start) the memory at `path`. Unreadable or malformed files
    /// are logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let levels = DashMap::new();
        for (device, level) in load(&path) {
            levels.insert(device, level);
        }
        debug!(path = %path.display(), entries = levels.len(), "brightness memory loaded");
        Self {
            path,
            levels,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        // Held across snapshot and rename so the newest levels land last.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entries: BTreeMap<String, u8> = self
            .levels
            .iter()
            .map(|e| (e.key().to_string(), e.value().value()))
            .collect();

        let result = serde_json::to_string_pretty(&entries)
            .map_err(|e| e.to_string())
            .and_then(|json| write_atomic(&self.path, json.as_bytes()).map_err(|e| e.to_string()));

        if let Err(error) = result {
            warn!(path = %self.path.display(), %error, "could not save brightness memory");
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    let written = std::fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| std::fs::rename(&tmp, path)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

impl BrightnessMemory for FileBrightnessMemory {
    fn remember(&self, device: &DeviceId, level: Percent) {
        if level.is_zero() {
            return;
        }
        let previous = self.levels.insert(*device, level);
        if previous != Some(level) {
            self.persist();
        }
    }

    fn recall(&self, device: &DeviceId) -> Option<Percent> {
        self.levels.get(device).map(|l| *l)
    }
}

fn load(path: &Path) -> Vec<(DeviceId, Percent)> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(error) => {
            warn!(path = %path.display(), %error, "could not read brightness memory");
            return Vec::new();
        }
    };

    let entries: BTreeMap<String, u8> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(path = %path.display(), %error, "ignoring malformed brightness memory");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|(key, value)| {
            let device = key.parse::<DeviceId>().ok()?;
            let level = Percent::new(value).ok().filter(|l| !l.is_zero())?;
            Some((device, level))
        })
        .collect()
}
