//! AddOns.txt reading and writing
//!
//! Format: `Name: 1` for enabled addons, `# Name: 0` for disabled ones.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::constants::backup::TEMP_SUFFIX;
use crate::types::AddonSet;

/// Parse manifest text into addon name → enabled.
///
/// Lines without a colon are ignored; a leading `#` disables the entry.
pub fn parse_manifest(text: &str) -> AddonSet {
    let mut addons = AddonSet::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        let name = name.trim();
        let (name, enabled) = match name.strip_prefix('#') {
            Some(rest) => (rest.trim(), false),
            None => (name, value.trim() == "1"),
        };

        addons.insert(name.to_string(), enabled);
    }

    addons
}

/// Render addons one per line in name order.
pub fn render_manifest(addons: &AddonSet) -> String {
    let mut out = String::new();
    for (name, enabled) in addons {
        if *enabled {
            out.push_str(&format!("{name}: 1\n"));
        } else {
            out.push_str(&format!("# {name}: 0\n"));
        }
    }
    out
}

/// Write `contents` to `path` through a sibling temp file renamed into place.
///
/// Readers see either the old manifest or the complete new one.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(path);
    let result = write_and_sync(&temp, contents).and_then(|()| fs::rename(&temp, path));
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_and_sync(path: &Path, contents: &str) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(contents.as_bytes())?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

/// What applying a profile would change relative to the current manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDiff {
    /// Listed now as disabled, enabled afterwards
    pub enabled: Vec<String>,
    /// Listed now as enabled, disabled afterwards
    pub disabled: Vec<String>,
    /// Not listed now
    pub added: Vec<String>,
    /// Listed now, absent afterwards
    pub removed: Vec<String>,
}

impl ManifestDiff {
    pub fn between(current: &AddonSet, target: &AddonSet) -> Self {
        let mut diff = Self::default();

        for (name, enabled) in target {
            match current.get(name) {
                None => diff.added.push(name.clone()),
                Some(before) if before != enabled => {
                    if *enabled {
                        diff.enabled.push(name.clone());
                    } else {
                        diff.disabled.push(name.clone());
                    }
                }
                Some(_) => {}
            }
        }

        diff.removed = current
            .keys()
            .filter(|name| !target.contains_key(*name))
            .cloned()
            .collect();

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
            && self.disabled.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
    }
}
