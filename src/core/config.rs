//! Run configuration
//!
//! Settings are layered: the user config (`config.yaml` in the platform config
//! directory) is read first, then a `.cid.yaml` in the working directory
//! overrides individual keys. Missing or malformed files fall back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Local override file, looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".cid.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Part Number Reserve Log workbook
    pub reserve_log: Option<PathBuf>,

    /// ECO log workbook
    pub eco_log: Option<PathBuf>,

    /// Media types left out of manifests unless `--all-media` is given
    pub skip_media: Vec<String>,

    /// Newest ECO form revision this tool understands
    pub newest_form_revision: String,

    /// Longest ISO volume name accepted without a warning
    pub max_volume_name_len: usize,

    /// Where manifests are written (defaults to the working directory)
    pub output_dir: Option<PathBuf>,

    pub warnings_file: String,

    /// Part-number prefixes of executables, preferred as an ECO's primary part
    pub executable_prefixes: Vec<String>,

    /// Part-number prefixes of source code, next in line after executables
    pub source_prefixes: Vec<String>,

    /// Stop at the first revision or media value that has no part number
    pub abort_on_orphan_values: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reserve_log: None,
            eco_log: None,
            skip_media: ["scif", "hard_copy", "hardcopy", "synergy"]
                .into_iter()
                .map(String::from)
                .collect(),
            newest_form_revision: "B3".to_string(),
            max_volume_name_len: 16,
            output_dir: None,
            warnings_file: "CID_WARNINGS".to_string(),
            executable_prefixes: vec!["142".to_string()],
            source_prefixes: vec!["139".to_string()],
            abort_on_orphan_values: false,
        }
    }
}

impl Config {
    /// Load the user config merged with the local override
    pub fn load() -> Self {
        let user = Self::user_config_path();
        Self::load_from(user.as_deref(), Path::new(LOCAL_CONFIG_FILE))
    }

    /// Path of the user-level config file, if a home directory is known
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "cid").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge `user` then `local`; later layers win key by key
    pub fn load_from(user: Option<&Path>, local: &Path) -> Self {
        let mut merged = serde_yml::Mapping::new();

        for layer in [user, Some(local)].into_iter().flatten().filter_map(read_layer) {
            for (key, value) in layer {
                merged.insert(key, value);
            }
        }

        serde_yml::from_value(serde_yml::Value::Mapping(merged)).unwrap_or_default()
    }
}

fn read_layer(path: &Path) -> Option<serde_yml::Mapping> {
    let content = fs::read_to_string(path).ok()?;
    match serde_yml::from_str::<serde_yml::Value>(&content).ok()? {
        serde_yml::Value::Mapping(mapping) => Some(mapping),
        _ => None,
    }
}
