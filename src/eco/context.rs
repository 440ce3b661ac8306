//! Per-run validation settings

use crate::core::config::Config;
use crate::core::revision::Alphabet;
use crate::xref::reserve_log::ReserveLog;

/// Normalized form of a media label used for skip-list matching
pub fn normalize_media(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Everything a validation pass needs to know about the current run
///
/// Built once from the config and command-line flags and passed by reference.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    /// Alphabet used for successor computation and catalog parsing
    pub alphabet: Alphabet,
    /// Report non-standard revisions as warnings instead of errors
    pub allow_nonstandard_revisions: bool,
    /// Normalized media labels left out of the manifests
    pub skip_media: Vec<String>,
    pub new_parts_only: bool,
    /// Change order being processed (cover sheet `S2`)
    pub change_order: Option<String>,
    pub reserve_log: Option<&'a ReserveLog>,
    pub max_volume_name_len: usize,
    pub abort_on_orphan_values: bool,
}

impl Default for ValidationContext<'_> {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl<'a> ValidationContext<'a> {
    pub fn from_config(config: &Config) -> Self {
        Self {
            alphabet: Alphabet::Standard,
            allow_nonstandard_revisions: false,
            skip_media: config.skip_media.iter().map(|m| normalize_media(m)).collect(),
            new_parts_only: false,
            change_order: None,
            reserve_log: None,
            max_volume_name_len: config.max_volume_name_len,
            abort_on_orphan_values: config.abort_on_orphan_values,
        }
    }

    /// Accept revisions outside the standard alphabet, with a warning
    pub fn with_nonstandard_revisions(mut self, allow: bool) -> Self {
        self.allow_nonstandard_revisions = allow;
        self.alphabet = if allow {
            Alphabet::Permissive
        } else {
            Alphabet::Standard
        };
        self
    }

    /// Render every media type, including those on the skip-list
    pub fn with_all_media(mut self) -> Self {
        self.skip_media.clear();
        self
    }

    /// Restrict output to newly introduced parts; no media is skipped
    pub fn with_new_parts_only(mut self, enabled: bool) -> Self {
        self.new_parts_only = enabled;
        if enabled {
            self.skip_media.clear();
        }
        self
    }

    pub fn with_change_order(mut self, change_order: Option<String>) -> Self {
        self.change_order = change_order;
        self
    }

    pub fn with_reserve_log(mut self, reserve_log: &'a ReserveLog) -> Self {
        self.reserve_log = Some(reserve_log);
        self
    }

    /// Check if a media label is on the skip-list
    pub fn skips_media(&self, label: &str) -> bool {
        let label = normalize_media(label);
        self.skip_media.iter().any(|m| *m == label)
    }
}
