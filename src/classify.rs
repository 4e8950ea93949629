//! Audio-file discovery, suffix classification, and grouping.
//!
//! A scan turns a directory tree into a list of [`FileGroup`]s, each destined
//! to become one event in FMOD Studio. Classification is driven entirely by
//! the [`SuffixRules`] passed in, so grouping is a pure function of its
//! inputs: the same file list and rules always produce the same groups, in
//! first-occurrence order.

use crate::config::SuffixRules;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Audio extensions the importer accepts, matched case-insensitively.
const SUPPORTED_EXTENSIONS: [&str; 5] = ["wav", "aiff", "aif", "ogg", "mp3"];

/// How the files of one group combine into a playable unit.
///
/// `Multi` and `Scatterer` are mutually exclusive primary types selected by
/// filename suffix; `Single` is the default. `Spatializer` exists as a
/// detected marker only and never drives grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentType {
    Single,
    Multi,
    Scatterer,
    Spatializer,
    Unknown,
}

impl InstrumentType {
    /// Name used verbatim inside generated scripts.
    pub fn as_str(self) -> &'static str {
        match self {
            InstrumentType::Single => "Single",
            InstrumentType::Multi => "Multi",
            InstrumentType::Scatterer => "Scatterer",
            InstrumentType::Spatializer => "Spatializer",
            InstrumentType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One future event: a set of files sharing base name, folder, and type.
#[derive(Debug, Clone)]
pub struct FileGroup {
    /// Suffix-stripped file stem.
    pub base_name: String,
    pub instrument_type: InstrumentType,
    /// Containing directory relative to the scan root, forward-slash
    /// normalized; empty string for the root itself.
    pub relative_folder_path: String,
    /// Files in discovery order.
    pub file_paths: Vec<PathBuf>,
    /// `"{relative_folder_path}_{base_name}_{instrument_type}"`.
    pub group_key: String,
    /// True when the spatializer suffix was seen on any file of the group.
    /// Recorded but not consulted anywhere downstream.
    pub spatializer: bool,
}

/// Returns true for files carrying one of the supported audio extensions.
pub fn is_supported_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| ext.eq_ignore_ascii_case(s))
        })
}

/// Recursively collects supported audio files under `root`, sorted by path
/// for a stable discovery order. Unreadable entries are logged and skipped.
pub fn collect_audio_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                if is_supported_audio(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Skipping unreadable entry during scan: {}", e);
            }
        }
    }
    files
}

/// Groups files by `(relative folder, base name, instrument type)`.
///
/// Suffix precedence: the multi suffix is checked first, then the scatterer
/// suffix; the first match wins and is stripped from the stem. No match
/// defaults to [`InstrumentType::Single`] with the full stem as base name.
/// The spatializer suffix is checked independently on the full stem and only
/// recorded. Output order is first occurrence of each group key.
pub fn group_files(files: &[PathBuf], scan_root: &Path, rules: &SuffixRules) -> Vec<FileGroup> {
    let mut groups: Vec<FileGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for path in files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            log::warn!("Skipping file with unusable name: {}", path.display());
            continue;
        };

        let (base_name, instrument_type, spatializer) = classify_stem(stem, rules);

        let file_dir = path.parent().unwrap_or(scan_root);
        let relative_folder_path = relative_folder_path(scan_root, file_dir);

        let group_key = format!("{}_{}_{}", relative_folder_path, base_name, instrument_type);
        log::debug!(
            "Classified '{}' as {} (base '{}', key '{}')",
            path.display(),
            instrument_type,
            base_name,
            group_key
        );

        match index.get(&group_key) {
            Some(&i) => {
                groups[i].file_paths.push(path.clone());
                groups[i].spatializer |= spatializer;
            }
            None => {
                index.insert(group_key.clone(), groups.len());
                groups.push(FileGroup {
                    base_name: base_name.to_string(),
                    instrument_type,
                    relative_folder_path,
                    file_paths: vec![path.clone()],
                    group_key,
                    spatializer,
                });
            }
        }
    }

    log::info!("Grouped {} file(s) into {} group(s)", files.len(), groups.len());
    groups
}

/// Splits a file stem into base name, primary instrument type, and the
/// orthogonal spatializer marker.
fn classify_stem<'a>(stem: &'a str, rules: &SuffixRules) -> (&'a str, InstrumentType, bool) {
    let spatializer = strip_suffix_ignore_case(stem, &rules.spatializer).is_some();

    if let Some(base) = strip_suffix_ignore_case(stem, &rules.multi) {
        (base, InstrumentType::Multi, spatializer)
    } else if let Some(base) = strip_suffix_ignore_case(stem, &rules.scatterer) {
        (base, InstrumentType::Scatterer, spatializer)
    } else {
        (stem, InstrumentType::Single, spatializer)
    }
}

/// ASCII-case-insensitive suffix strip. Empty suffixes never match, and a
/// stem consisting solely of the suffix is left alone (the base name must
/// not be empty).
fn strip_suffix_ignore_case<'a>(stem: &'a str, suffix: &str) -> Option<&'a str> {
    if suffix.is_empty() || stem.len() <= suffix.len() {
        return None;
    }
    let split = stem.len() - suffix.len();
    if !stem.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = stem.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

/// Directory of a file expressed relative to the scan root, forward-slash
/// normalized. The root itself maps to the empty string; a directory outside
/// the root is treated as root-level and logged as a warning.
pub fn relative_folder_path(scan_root: &Path, file_dir: &Path) -> String {
    match file_dir.strip_prefix(scan_root) {
        Ok(rel) => {
            let mut parts = Vec::new();
            for component in rel.components() {
                parts.push(component.as_os_str().to_string_lossy().into_owned());
            }
            parts.join("/")
        }
        Err(_) => {
            log::warn!(
                "Path '{}' is not a descendant of scan root '{}'; treating as root-level",
                file_dir.display(),
                scan_root.display()
            );
            String::new()
        }
    }
}
