use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use snafu::{OptionExt, ResultExt};

use crate::survey::{
    io_common::{make_default_id_lineno, tabular_response},
    providers::FormResponse,
    *,
};

/// Reads an Excel export of the responses. The header holds the titles of the questions.
pub fn read_xlsx_responses(
    path: &str,
    source: &ResponseSource,
) -> BSurveyResult<Vec<FormResponse>> {
    info!("Attempting to read Excel file {:?}", path);
    let default_id = make_default_id_lineno(path);
    let id_idx_o = source.id_column_index_int()?;
    let first_row = source.first_response_row_index()?;

    let wrange = get_range(path, source)?;
    let mut iter = wrange.rows().skip(first_row - 2);
    let header: Vec<Option<String>> = iter
        .next()
        .context(EmptySpreadsheetSnafu { path })?
        .iter()
        .map(cell_to_string)
        .collect();
    debug!("read_xlsx_responses: header: {:?}", header);

    let mut res: Vec<FormResponse> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + first_row;
        let cells: Vec<Option<String>> = row.iter().map(cell_to_string).collect();
        if cells.iter().all(|c| c.is_none()) {
            debug!("read_xlsx_responses: skipping empty row {}", lineno);
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
        debug!("read_xlsx_responses: idx: {:?} id: {:?}", idx, id);
        res.push(tabular_response(id, &header, &cells));
    }
    Ok(res)
}

pub fn cell_to_string(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) if s.trim().is_empty() => None,
        DataType::String(s) => Some(s.clone()),
        // Whole numbers are written without decimals, the way the sheet shows them.
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some((*f as i64).to_string()),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        DataType::DateTime(f) => Some(date_time_to_string(*f)),
        DataType::Empty => None,
        DataType::Error(e) => {
            warn!("cell_to_string: skipping cell with error {:?}", e);
            None
        }
    }
}

/// Writes an Excel date serial the way the sheet shows it: the date alone when there is no
/// time of day, the time alone when there is no date.
fn date_time_to_string(serial: f64) -> String {
    let mut days = serial.floor();
    // Serials are rarely exact, the time of day is rounded to the second.
    let mut secs = ((serial - days) * 86400.0).round() as u32;
    if secs >= 86400 {
        days += 1.0;
        secs = 0;
    }
    let time = format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60);
    if days == 0.0 && secs > 0 {
        return time;
    }
    match DataType::Int(days as i64).as_date() {
        Some(date) if secs == 0 => date.format("%Y-%m-%d").to_string(),
        Some(date) => format!("{} {}", date.format("%Y-%m-%d"), time),
        None => {
            warn!("cell_to_string: date {} is out of range, keeping the serial", serial);
            serial.to_string()
        }
    }
}

fn get_range(path: &str, source: &ResponseSource) -> BSurveyResult<Range<DataType>> {
    let worksheet_name_o = source.excel_worksheet_name.clone();
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                worksheet_name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptySpreadsheetSnafu { path }.fail().map_err(Box::new),
            [(worksheet_name, wrange)] => {
                debug!("get_range: path: {:?} worksheet: {:?}", path, worksheet_name);
                Ok(wrange.clone())
            }
            _ => AmbiguousWorksheetSnafu { path }.fail().map_err(Box::new),
        }
    }
}
