//! CLI argument definitions using clap derive

use clap::Parser;

use crate::cli::commands::extract::ExtractArgs;

#[derive(Parser, Debug)]
#[command(name = "cid")]
#[command(author, version, about = "ECO form validator and CONTENTS_ID manifest generator")]
#[command(long_about = "Validates the configuration items listed on an ECO form \
against the part number reserve log and the ECO log, then writes a CONTENTS_ID \
manifest for every media set on the form.\n\n\
The ECO form, the reserve log and the ECO log are .xlsx workbooks.")]
pub struct Cli {
    #[command(flatten)]
    pub extract: ExtractArgs,

    /// Wait for Enter before exiting (keeps a double-clicked console open)
    #[arg(long)]
    pub pause: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::try_parse_from(["cid", "-a", "-i", "-o", "-m", "-e", "dos", "form"]).unwrap();
        assert!(cli.extract.all_media);
        assert!(cli.extract.invalid_revs);
        assert!(cli.extract.combined);
        assert!(cli.extract.per_block);
        assert_eq!(cli.extract.eol, crate::manifest::LineEnding::Dos);
        assert_eq!(cli.extract.eco_file.to_str(), Some("form"));
        assert!(!cli.pause);
    }

    #[test]
    fn test_reserve_log_flags_conflict() {
        let result = Cli::try_parse_from(["cid", "--no-reserve-log", "--reserve-log", "log", "form"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_eco_file_required() {
        assert!(Cli::try_parse_from(["cid"]).is_err());
    }
}
