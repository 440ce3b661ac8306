//! Shared test helpers for integration tests
//!
//! Fixtures are real xlsx workbooks. Values are entered the way a user types
//! them, so `11629` lands as a number and `123-456789-01` as text.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use umya_spreadsheet::helper::coordinate::coordinate_from_index;

/// Helper to get a cid command
pub fn cid() -> Command {
    Command::new(cargo::cargo_bin!("cid"))
}

/// A cid command running inside `tmp`, isolated from the user's config
pub fn cid_in(tmp: &TempDir) -> Command {
    let home = tmp.path().join("home");
    let mut cmd = cid();
    cmd.current_dir(tmp.path())
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

/// Write a workbook with one tab per `(name, rows)`; blank strings stay empty cells
pub fn write_book(path: &Path, sheets: &[(&str, Vec<Vec<String>>)]) {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    for (name, rows) in sheets {
        let sheet = book.new_sheet(*name).unwrap();
        for (r, cells) in rows.iter().enumerate() {
            for (c, value) in cells.iter().enumerate() {
                if !value.is_empty() {
                    let address = coordinate_from_index(&(c as u32 + 1), &(r as u32 + 1));
                    sheet.get_cell_mut(address).set_value(value.clone());
                }
            }
        }
    }
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

/// Displayed value of one cell of a saved workbook
pub fn read_cell(path: &Path, sheet: &str, address: &str) -> String {
    let book = umya_spreadsheet::reader::xlsx::read(path).unwrap();
    book.get_sheet_by_name(sheet).unwrap().get_value(address)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Rows of an empty grid with `count` rows
fn blank_rows(count: usize) -> Vec<Vec<String>> {
    vec![Vec::new(); count]
}

fn put(rows: &mut [Vec<String>], row: usize, col: usize, value: &str) {
    let cells = &mut rows[row - 1];
    if cells.len() <= col {
        cells.resize(col + 1, String::new());
    }
    cells[col] = value.to_string();
}

/// One CI_Sheet row in the current (B3) layout
///
/// Columns: A part, B current rev, C new rev, E change order, F description,
/// G media, H ISO volume name.
pub fn ci_row(
    part: &str,
    current: &str,
    new: &str,
    change_order: &str,
    description: &str,
    media: &str,
) -> Vec<String> {
    strings(&[part, current, new, "", change_order, description, media, ""])
}

/// Same as `ci_row` with an ISO volume name in column H
pub fn ci_row_with_volume(
    part: &str,
    current: &str,
    new: &str,
    description: &str,
    media: &str,
    volume: &str,
) -> Vec<String> {
    let mut row = ci_row(part, current, new, "", description, media);
    row[7] = volume.to_string();
    row
}

/// Options for the cover sheet of a test ECO form
pub struct Cover<'a> {
    pub eco: Option<&'a str>,
    pub form_revision: Option<&'a str>,
    pub released: Option<usize>,
}

impl Default for Cover<'_> {
    fn default() -> Self {
        Self {
            eco: Some("11629"),
            form_revision: Some("B3"),
            released: None,
        }
    }
}

/// Write an ECO form workbook named `name` under `tmp`
///
/// The released count in C16 defaults to the number of rows introducing a
/// new revision without a change order.
pub fn write_eco_form(
    tmp: &TempDir,
    name: &str,
    cover: Cover<'_>,
    items: &[Vec<String>],
) -> PathBuf {
    let path = tmp.path().join(name);

    let mut cover_rows = blank_rows(44);
    put(&mut cover_rows, 1, 0, "Engineering Change Order");
    if let Some(eco) = cover.eco {
        put(&mut cover_rows, 2, 18, eco);
    }
    let changed = items
        .iter()
        .filter(|r| !r[0].is_empty() && !r[2].is_empty() && r[4].is_empty())
        .count();
    put(&mut cover_rows, 16, 2, &cover.released.unwrap_or(changed).to_string());
    if let Some(rev) = cover.form_revision {
        put(&mut cover_rows, 44, 0, rev);
    }

    let mut ci_rows = vec![
        strings(&["Configuration Items"]),
        Vec::new(),
        Vec::new(),
        strings(&["Part", "Cur Rev", "New Rev", "", "ECO#", "Description", "Media", "ISO Volume"]),
    ];
    ci_rows.extend(items.iter().cloned());

    write_book(&path, &[("CoverSheet", cover_rows), ("CI_Sheet", ci_rows)]);
    path
}

/// Write `pn_reserve_log.xlsx`; each entry is (part, revision, change order)
pub fn write_reserve_log(tmp: &TempDir, entries: &[(&str, &str, &str)]) -> PathBuf {
    let path = tmp.path().join("pn_reserve_log.xlsx");
    let mut rows = vec![strings(&["Part Number", "Comment", "Rev", "ECO", "Description"])];
    for (part, rev, eco) in entries {
        rows.push(strings(&[*part, "", *rev, *eco, "reserved"]));
    }
    write_book(&path, &[("PN_Rev", rows)]);
    path
}

/// Tab of the ECO log
pub const ECO_LOG_TAB: &str = "ALL ECO's";

/// Write `eco_log.xlsx`; each record is (eco, date assigned, primary part)
pub fn write_eco_log(tmp: &TempDir, records: &[(&str, &str, &str)]) -> PathBuf {
    let path = tmp.path().join("eco_log.xlsx");
    let mut rows = vec![
        strings(&["ECO Log"]),
        Vec::new(),
        strings(&["ECO", "Date", "Initiator", "Primary Part", "Project"]),
    ];
    for (eco, date, primary) in records {
        rows.push(strings(&[*eco, *date, "jdoe", *primary, "Project X"]));
    }
    write_book(&path, &[(ECO_LOG_TAB, rows)]);
    path
}

/// Read a generated file from the temp dir
pub fn read_output(tmp: &TempDir, name: &str) -> String {
    fs::read_to_string(tmp.path().join(name)).unwrap()
}
