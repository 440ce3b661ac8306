//! Cell indent levels read straight from the xlsx package
//!
//! The workbook reader keeps a cell's horizontal and vertical alignment but
//! drops the `indent` attribute, which the ECO form uses to nest sub-items. The
//! indent lives on the `<alignment>` of a cell format in `xl/styles.xml`; each
//! `<c>` of a worksheet names its format with `s="<index>"`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use umya_spreadsheet::helper::coordinate::index_from_coordinate;
use zip::ZipArchive;

use super::SheetError;

/// Indent level by one-based (column, row)
pub(crate) type CellIndents = HashMap<(u32, u32), u32>;

/// Indented cells of every sheet, keyed by sheet name
pub(crate) fn read_indents(path: &Path) -> Result<HashMap<String, CellIndents>, SheetError> {
    let fail = |message: String| SheetError::Styles {
        path: path.to_path_buf(),
        message,
    };

    let mut zip = ZipArchive::new(File::open(path)?).map_err(|e| fail(e.to_string()))?;

    let format_indents = match zip.by_name("xl/styles.xml") {
        Ok(part) => parse_format_indents(BufReader::new(part)).map_err(|e| fail(e.to_string()))?,
        Err(_) => return Ok(HashMap::new()),
    };
    if format_indents.iter().all(|level| *level == 0) {
        return Ok(HashMap::new());
    }

    let parts = worksheet_parts(&mut zip).map_err(|e| fail(e.to_string()))?;
    let mut indents = HashMap::new();
    for (name, part) in parts {
        let Ok(xml) = zip.by_name(&part) else {
            continue;
        };
        let cells = parse_cell_indents(BufReader::new(xml), &format_indents)
            .map_err(|e| fail(e.to_string()))?;
        if !cells.is_empty() {
            indents.insert(name, cells);
        }
    }
    Ok(indents)
}

/// Indent of each entry of `<cellXfs>`, by format index
fn parse_format_indents<R: BufRead>(xml: R) -> Result<Vec<u32>, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut levels = Vec::new();
    let mut in_cell_formats = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_formats = true,
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_formats = false,
            Event::Start(e) | Event::Empty(e) if in_cell_formats => {
                match e.local_name().as_ref() {
                    b"xf" => levels.push(0),
                    b"alignment" => {
                        if let (Some(last), Some(level)) =
                            (levels.last_mut(), attribute(&e, b"indent")?)
                        {
                            *last = level.trim().parse().unwrap_or(0);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(levels)
}

/// Sheet name -> package path of its worksheet part
fn worksheet_parts(
    zip: &mut ZipArchive<File>,
) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    let mut sheets = Vec::new();
    {
        let workbook = zip.by_name("xl/workbook.xml")?;
        let mut reader = Reader::from_reader(BufReader::new(workbook));
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                    if let (Some(name), Some(id)) = (attribute(&e, b"name")?, attribute(&e, b"id")?)
                    {
                        sheets.push((name, id));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
    }

    let mut targets = HashMap::new();
    {
        let rels = zip.by_name("xl/_rels/workbook.xml.rels")?;
        let mut reader = Reader::from_reader(BufReader::new(rels));
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e)
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    if let (Some(id), Some(target)) =
                        (attribute(&e, b"Id")?, attribute(&e, b"Target")?)
                    {
                        targets.insert(id, target);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
    }

    Ok(sheets
        .into_iter()
        .filter_map(|(name, id)| {
            let target = targets.get(&id)?;
            let part = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{}", target),
            };
            Some((name, part))
        })
        .collect())
}

/// Indented cells of one worksheet part
fn parse_cell_indents<R: BufRead>(
    xml: R,
    format_indents: &[u32],
) -> Result<CellIndents, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut cells = CellIndents::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let address = attribute(&e, b"r")?;
                let format = attribute(&e, b"s")?.and_then(|s| s.trim().parse::<usize>().ok());
                let level = format
                    .and_then(|index| format_indents.get(index))
                    .copied()
                    .unwrap_or(0);

                if let (Some(address), true) = (address, level > 0) {
                    if let (Some(column), Some(row), _, _) = index_from_coordinate(&address) {
                        cells.insert((column, row), level);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(cells)
}

/// Value of the attribute whose local name is `key`
fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(String::from_utf8_lossy(&attr.value).into_owned()));
        }
    }
    Ok(None)
}
