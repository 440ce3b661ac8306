//! Manifest writing - CONTENTS_ID files, the new-parts listing and the warnings report
//!
//! Every file is folded to plain ASCII and written with the requested line
//! endings.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use indexmap::IndexMap;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::core::diagnostics::Diagnostic;
use crate::eco::block::ConfigurationItemBlock;

/// Name of the combined manifest
pub const COMBINED_MANIFEST: &str = "CONTENTS_ID.all";

/// Name of the new-parts listing
pub const NEW_PARTS_FILE: &str = "NEW_PARTS";

const NEW_PARTS_PREAMBLE: &str = "\
New configuration items introduced on this ECO, grouped by media set.
Parts referenced from earlier ECOs and parts marked 'dup' are not listed.
";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Two media sets would both be written to {name}")]
    NameCollision { name: String },
}

/// Line terminator for written files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LineEnding {
    #[default]
    Unix,
    Dos,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Unix => "\n",
            LineEnding::Dos => "\r\n",
        }
    }
}

/// Fold text to ASCII
///
/// Accented letters lose their marks, typographic quotes, dashes and spaces
/// become their plain equivalents, and anything else outside ASCII is dropped.
pub fn to_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' => out.push(' '),
            '\u{2026}' => out.push_str("..."),
            '\u{00D7}' => out.push('x'),
            '\u{00B0}' => out.push_str("deg"),
            c if c.is_ascii() => out.push(c),
            c => out.extend(std::iter::once(c).nfkd().filter(char::is_ascii)),
        }
    }
    out
}

/// File name of the manifest for one media set
pub fn manifest_file_name(set_name: &str) -> String {
    format!("CONTENTS_ID.{}", set_name.trim().replace(' ', "_"))
}

/// Manifest file name of every non-empty block, in block order
///
/// Sets sharing a name under different media are told apart by their media
/// label (`CONTENTS_ID.CD_<set>` next to `CONTENTS_ID.DVD_<set>`).
pub fn manifest_file_names(
    blocks: &IndexMap<String, ConfigurationItemBlock>,
) -> Result<Vec<(String, &ConfigurationItemBlock)>, ManifestError> {
    let blocks: Vec<&ConfigurationItemBlock> = blocks.values().filter(|b| !b.is_empty()).collect();

    let mut uses: HashMap<String, usize> = HashMap::new();
    for block in &blocks {
        *uses.entry(manifest_file_name(block.set_name())).or_default() += 1;
    }

    let mut taken = HashSet::new();
    let mut named = Vec::with_capacity(blocks.len());
    for block in blocks {
        let mut name = manifest_file_name(block.set_name());
        if uses[&name] > 1 {
            name = manifest_file_name(&format!("{}_{}", block.media_label(), block.set_name()));
        }
        if !taken.insert(name.clone()) {
            return Err(ManifestError::NameCollision { name });
        }
        named.push((name, block));
    }
    Ok(named)
}

/// Writes output files into one directory
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    dir: PathBuf,
    eol: LineEnding,
}

impl ManifestWriter {
    pub fn new(dir: impl Into<PathBuf>, eol: LineEnding) -> Self {
        Self {
            dir: dir.into(),
            eol,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// One `CONTENTS_ID.<set name>` per block, without the heading line
    ///
    /// Names are settled before anything is written, so a collision leaves the
    /// directory untouched.
    pub fn write_per_block(
        &self,
        blocks: &IndexMap<String, ConfigurationItemBlock>,
    ) -> Result<Vec<PathBuf>, ManifestError> {
        manifest_file_names(blocks)?
            .into_iter()
            .map(|(name, block)| self.write_lines(&name, &block.render_lines(false)))
            .collect()
    }

    /// Every block, with headings, in one `CONTENTS_ID.all`
    pub fn write_combined(
        &self,
        blocks: &IndexMap<String, ConfigurationItemBlock>,
    ) -> Result<PathBuf, ManifestError> {
        self.write_lines(COMBINED_MANIFEST, &all_block_lines(blocks))
    }

    /// The new-parts listing
    pub fn write_new_parts(
        &self,
        blocks: &IndexMap<String, ConfigurationItemBlock>,
    ) -> Result<PathBuf, ManifestError> {
        let mut lines: Vec<String> = NEW_PARTS_PREAMBLE.lines().map(String::from).collect();
        lines.push(String::new());
        lines.extend(all_block_lines(blocks));
        self.write_lines(NEW_PARTS_FILE, &lines)
    }

    /// Timestamped list of warnings
    pub fn write_warnings<'d>(
        &self,
        file_name: &str,
        eco_file: &Path,
        warnings: impl IntoIterator<Item = &'d Diagnostic>,
    ) -> Result<PathBuf, ManifestError> {
        let mut lines = vec![
            format!(
                "CID warnings for {} generated {}",
                eco_file.display(),
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
            String::new(),
        ];
        lines.extend(warnings.into_iter().map(|w| match &w.cell {
            Some(cell) => format!("[{}] {}", cell, w),
            None => w.to_string(),
        }));
        self.write_lines(file_name, &lines)
    }

    fn write_lines(&self, file_name: &str, lines: &[String]) -> Result<PathBuf, ManifestError> {
        let path = self.dir.join(file_name);
        let eol = self.eol.as_str();

        let mut text = String::new();
        for line in lines {
            text.push_str(&to_ascii(line));
            text.push_str(eol);
        }

        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&path, text))
            .map_err(|source| ManifestError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Rendered blocks separated by blank lines
fn all_block_lines(blocks: &IndexMap<String, ConfigurationItemBlock>) -> Vec<String> {
    let mut lines = Vec::new();
    for block in blocks.values().filter(|b| !b.is_empty()) {
        lines.extend(block.render_lines(true));
        lines.push(String::new());
    }
    lines
}
