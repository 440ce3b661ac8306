//! `cid <ECO_FILE>` - validate an ECO form and write its CONTENTS_ID manifests

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::diagnostics::Diagnostics;
use crate::core::revision::{Alphabet, RevisionCode};
use crate::eco::{group_rows, EcoForm, Extraction, RowClassifier, ValidationContext};
use crate::manifest::{LineEnding, ManifestWriter};
use crate::sheet::XlsxWorkbook;
use crate::xref::{check_primary_part, EcoLog, PartCategories, ReserveLog};

#[derive(clap::Args, Debug)]
pub struct ExtractArgs {
    /// ECO form workbook (.xlsx)
    #[arg()]
    pub eco_file: PathBuf,

    /// Include media types that are normally skipped (scif, hard copy, ...)
    #[arg(long, short = 'a')]
    pub all_media: bool,

    /// Accept non-standard revisions with a warning instead of an error
    #[arg(long, short = 'i')]
    pub invalid_revs: bool,

    /// Only list parts introduced on this ECO (writes NEW_PARTS)
    #[arg(long, short = 'n')]
    pub new_parts_only: bool,

    /// Write every media set into a single CONTENTS_ID.all
    #[arg(long, short = 'o')]
    pub combined: bool,

    /// Write one CONTENTS_ID file per media set (default unless --combined)
    #[arg(long, short = 'm')]
    pub per_block: bool,

    /// Line endings for written files
    #[arg(long, short = 'e', value_enum, default_value = "unix")]
    pub eol: LineEnding,

    /// Skip the part number reserve log cross-check
    #[arg(long, conflicts_with = "reserve_log")]
    pub no_reserve_log: bool,

    /// Part number reserve log workbook (overrides config)
    #[arg(long)]
    pub reserve_log: Option<PathBuf>,

    /// ECO log workbook (overrides config)
    #[arg(long)]
    pub eco_log: Option<PathBuf>,

    /// Write the suggested primary part back to the ECO log
    #[arg(long)]
    pub update_eco_log: bool,

    /// Directory for the generated files (default: current directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let config = Config::load();
    let newest_form = RevisionCode::parse(&config.newest_form_revision, Alphabet::Standard)
        .map_err(|e| miette::miette!("Invalid newest_form_revision in config: {}", e))?;
    let alphabet = if args.invalid_revs {
        Alphabet::Permissive
    } else {
        Alphabet::Standard
    };

    let mut diags = Diagnostics::with_sink(output::print_diagnostic);

    // Reference logs are opened before the form so a bad path fails fast
    let reserve_log = if args.no_reserve_log {
        None
    } else {
        load_reserve_log(args.reserve_log.as_ref().or(config.reserve_log.as_ref()), alphabet)?
    };
    match &reserve_log {
        Some(log) => diags.extend(log.load_warnings().iter().cloned()),
        None => println!("{} PN Reserve Log cross-check disabled", style("!").yellow()),
    }

    let eco_log_path = args.eco_log.clone().or_else(|| config.eco_log.clone());
    let mut eco_log = match &eco_log_path {
        Some(path) => {
            output::progress(format!("Loading ECO log {}", path.display()));
            let book = XlsxWorkbook::open(path).into_diagnostic()?;
            Some(EcoLog::load(book).into_diagnostic()?)
        }
        None => None,
    };
    if args.update_eco_log && eco_log.is_none() {
        println!("{} --update-eco-log has no effect without an ECO log", style("!").yellow());
    }

    output::progress(format!("Reading ECO form {}", args.eco_file.display()));
    let book = XlsxWorkbook::open(&args.eco_file).into_diagnostic()?;
    let form = EcoForm::read(&book).into_diagnostic()?;

    form.check_form_revision(&newest_form, &mut diags);
    form.check_change_order(&mut diags);

    let mut ctx = ValidationContext::from_config(&config)
        .with_nonstandard_revisions(args.invalid_revs)
        .with_new_parts_only(args.new_parts_only)
        .with_change_order(form.change_order.clone());
    if args.all_media {
        ctx = ctx.with_all_media();
    }
    if let Some(log) = &reserve_log {
        ctx = ctx.with_reserve_log(log);
    }

    let queue = group_rows(&form.rows, &ctx, &form.layout, &mut diags);
    output::progress(format!(
        "Checking {} configuration item(s) in {} media group(s)",
        queue.total_items,
        queue.groups.len()
    ));
    let extraction = RowClassifier::new(&ctx, form.layout).extract(queue, &mut diags);
    if extraction.aborted {
        println!("{} Stopped at the first value in a row without a part number", style("✗").red());
    }

    form.check_released_count(extraction.stats.changed_items, &mut diags);

    if let (Some(log), Some(change_order)) = (&reserve_log, form.change_order.as_deref()) {
        log.check_reservations(change_order, &extraction.introduced, &mut diags);
    }
    report_missing_reservations(&extraction);

    let categories = PartCategories {
        executable: config.executable_prefixes.clone(),
        source: config.source_prefixes.clone(),
    };
    let primary_part = match (&eco_log, form.change_order.as_deref()) {
        (Some(log), Some(change_order)) => check_primary_part(
            log.lookup(change_order),
            change_order,
            &extraction.introduced,
            &categories,
            &mut diags,
        )
        .map(|item| item.part.clone()),
        _ => None,
    };

    output::print_summary(&extraction.stats, &diags);

    if diags.has_errors() {
        return Err(match diags.error_count() {
            1 => miette::miette!("Validation failed: 1 error, no files written"),
            n => miette::miette!("Validation failed: {} errors, no files written", n),
        });
    }

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let writer = ManifestWriter::new(output_dir, args.eol);

    let mut written = Vec::new();
    if args.new_parts_only {
        written.push(writer.write_new_parts(&extraction.blocks).into_diagnostic()?);
    } else {
        if !args.combined || args.per_block {
            written.extend(writer.write_per_block(&extraction.blocks).into_diagnostic()?);
        }
        if args.combined {
            written.push(writer.write_combined(&extraction.blocks).into_diagnostic()?);
        }
    }

    if diags.warning_count() > 0 {
        written.push(
            writer
                .write_warnings(&config.warnings_file, &args.eco_file, diags.warnings())
                .into_diagnostic()?,
        );
    }

    for path in &written {
        output::success(format!("Wrote {}", path.display()));
    }

    if let (true, Some(log), Some(change_order), Some(part)) = (
        args.update_eco_log,
        eco_log.as_mut(),
        form.change_order.as_deref(),
        primary_part,
    ) {
        log.set_primary_part(change_order, &part).into_diagnostic()?;
        log.save().into_diagnostic()?;
        output::success(format!(
            "Updated ECO log primary part for ECO {} to {}",
            change_order, part
        ));
    }

    match diags.warning_count() {
        0 => output::success("ECO form passed validation"),
        n => output::success(format!("ECO form passed validation with {} warning(s)", n)),
    }
    Ok(())
}

fn load_reserve_log(path: Option<&PathBuf>, alphabet: Alphabet) -> Result<Option<ReserveLog>> {
    let Some(path) = path else {
        return Ok(None);
    };
    output::progress(format!("Loading PN Reserve Log {}", path.display()));
    let book = XlsxWorkbook::open(path).into_diagnostic()?;
    let log = ReserveLog::load(&book, alphabet).into_diagnostic()?;
    Ok(Some(log))
}

/// List the part revisions that still need a reserve-log entry
fn report_missing_reservations(extraction: &Extraction) {
    if extraction.missing_from_reserve_log.is_empty() {
        return;
    }
    println!("{} Add to the PN Reserve Log:", style("→").blue());
    for item in &extraction.missing_from_reserve_log {
        println!("    {}", style(item).cyan());
    }
}
