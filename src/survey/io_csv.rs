// Primitives for reading CSV files.

use std::fs::File;

use snafu::{OptionExt, ResultExt};

use crate::survey::{
    io_common::{make_default_id_lineno, tabular_response},
    providers::FormResponse,
    *,
};

/// Reads a CSV export of the responses. The header holds the titles of the questions.
pub fn read_csv_responses(path: &str, source: &ResponseSource) -> BSurveyResult<Vec<FormResponse>> {
    info!("Attempting to read CSV file {:?}", path);
    let default_id = make_default_id_lineno(path);
    let id_idx_o = source.id_column_index_int()?;
    let first_row = source.first_response_row_index()?;

    let mut records = get_records(path, first_row)?;
    let header_lineno = first_row - 1;
    let header_line = records
        .next()
        .context(EmptySpreadsheetSnafu { path })?
        .context(CsvLineParseSnafu {
            lineno: header_lineno,
        })?;
    let header: Vec<Option<String>> = header_line.iter().map(cell_value).collect();
    debug!("read_csv_responses: header: {:?}", header);

    let mut res: Vec<FormResponse> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + first_row;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<Option<String>> = line.iter().map(cell_value).collect();
        if cells.iter().all(|c| c.is_none()) {
            debug!("read_csv_responses: skipping empty line {}", lineno);
            continue;
        }
        let id = match id_idx_o {
            Some(id_idx) => cells
                .get(id_idx - 1)
                .cloned()
                .flatten()
                .unwrap_or_else(|| default_id(lineno)),
            None => default_id(lineno),
        };
        debug!("read_csv_responses: lineno: {:?} id: {:?}", lineno, id);
        res.push(tabular_response(id, &header, &cells));
    }
    Ok(res)
}

// Returns the records starting at the header.
fn get_records(path: &str, first_row: usize) -> SurveyResult<csv::StringRecordsIntoIter<File>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    // The index starts at 1 to respect most conventions in the excel world
    for _ in 2..first_row {
        _ = records.next();
    }
    Ok(records)
}

fn cell_value(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
