use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};

use crate::survey::*;

pub const FORMS_JSON: &str = "forms_json";
pub const CSV: &str = "csv";
pub const XLSX: &str = "xlsx";
pub const STDOUT: &str = "stdout";
/// The first column of the spreadsheet exports of Google Forms.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

pub const DEFAULT_LIMIT: i64 = 200;
/// The page size when listing the responses.
pub const DEFAULT_RESPONSES_LIMIT: i64 = 50;
pub const MAX_PAGE_SIZE: usize = 500;
/// The header is on the first row, the responses start on the second one.
pub const DEFAULT_FIRST_RESPONSE_ROW: usize = 2;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct FormSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "formId")]
    pub form_id: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResponseSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "multiValueDelimiter")]
    pub multi_value_delimiter: Option<String>,
    #[serde(rename = "firstResponseRowIndex")]
    pub first_response_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
}

impl ResponseSource {
    /// The row of the first response, starting at 1. The header is the row just above.
    pub fn first_response_row_index(&self) -> SurveyResult<usize> {
        match &self.first_response_row_index {
            None => Ok(DEFAULT_FIRST_RESPONSE_ROW),
            x => {
                let row = read_js_int(x)?;
                if row < 2 {
                    return ParsingJsonNumberSnafu {}.fail();
                }
                Ok(row)
            }
        }
    }

    /// The column holding the ids of the responses, starting at 1.
    pub fn id_column_index_int(&self) -> SurveyResult<Option<usize>> {
        match &self.id_column_index {
            None => Ok(None),
            x => read_js_int(x).map(Some),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RulesConfig {
    pub limit: Option<i64>,
    #[serde(rename = "textSampleSize")]
    pub text_sample_size: Option<usize>,
}

impl RulesConfig {
    pub fn analysis_rules(&self) -> AnalysisRules {
        AnalysisRules {
            text_sample_size: self
                .text_sample_size
                .unwrap_or(AnalysisRules::DEFAULT_RULES.text_sample_size),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "formSource")]
    pub form_source: Option<FormSource>,
    #[serde(rename = "responseSource")]
    pub response_source: Option<ResponseSource>,
    #[serde(default)]
    pub rules: RulesConfig,
}

/// Reads a configuration file. The relative paths it contains are resolved against its directory.
pub fn read_config(path: &str) -> BSurveyResult<SurveyConfig> {
    info!("Reading configuration {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let root_p = Path::new(path).parent().context(MissingParentDirSnafu {})?;
    if let Some(form_source) = config.form_source.as_mut() {
        form_source.file_path = resolve_path(root_p, &form_source.file_path);
    }
    if let Some(rs) = config.response_source.as_mut() {
        rs.file_path = resolve_path(root_p, &rs.file_path);
    }
    if let Some(out) = config.output_settings.output_path.as_mut() {
        *out = resolve_path(root_p, out);
    }
    debug!("read_config: {:?}", config);
    Ok(config)
}

fn resolve_path(root_p: &Path, p: &str) -> String {
    if p == STDOUT || p.is_empty() || Path::new(p).is_absolute() {
        p.to_string()
    } else {
        root_p.join(p).display().to_string()
    }
}

pub fn read_summary(path: &str) -> BSurveyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> SurveyResult<usize> {
    let res: Option<usize> = match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        // Excel-style columns: A is 1, Z is 26, AA is 27.
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(s.to_ascii_lowercase().chars().fold(0usize, |acc, c| {
                acc.saturating_mul(26)
                    .saturating_add((c as usize) - ('a' as usize) + 1)
            }))
        }
        Some(JSValue::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    res.filter(|x| *x >= 1).context(ParsingJsonNumberSnafu {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_indexes() {
        assert_eq!(read_js_int(&Some(json!(3))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("4"))).unwrap(), 4);
        assert_eq!(read_js_int(&Some(json!("A"))).unwrap(), 1);
        assert_eq!(read_js_int(&Some(json!("c"))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("AB"))).unwrap(), 28);
        assert!(read_js_int(&Some(json!(0))).is_err());
        assert!(read_js_int(&Some(json!(-2))).is_err());
        assert!(read_js_int(&Some(json!("B2"))).is_err());
        assert!(read_js_int(&None).is_err());
    }

    #[test]
    fn response_source_defaults() {
        let rs = ResponseSource::default();
        assert_eq!(rs.first_response_row_index().unwrap(), 2);
        assert_eq!(rs.id_column_index_int().unwrap(), None);

        let rs: ResponseSource = serde_json::from_value(json!({
            "provider": "csv",
            "filePath": "responses.csv",
            "firstResponseRowIndex": 1,
            "idColumnIndex": "B"
        }))
        .unwrap();
        assert!(rs.first_response_row_index().is_err());
        assert_eq!(rs.id_column_index_int().unwrap(), Some(2));
    }

    #[test]
    fn rules() {
        let rules = RulesConfig::default();
        assert_eq!(rules.limit, None);
        assert_eq!(rules.analysis_rules(), AnalysisRules::DEFAULT_RULES);

        let rules: RulesConfig =
            serde_json::from_value(json!({"limit": 10, "textSampleSize": 5})).unwrap();
        assert_eq!(rules.limit, Some(10));
        assert_eq!(rules.analysis_rules().text_sample_size, 5);
    }

    #[test]
    fn relative_paths() {
        let root = Path::new("/data/survey");
        assert_eq!(resolve_path(root, "form.json"), "/data/survey/form.json");
        assert_eq!(resolve_path(root, "/abs/form.json"), "/abs/form.json");
        assert_eq!(resolve_path(root, STDOUT), STDOUT);
    }

    #[test]
    fn minimal_config() {
        let config: SurveyConfig = serde_json::from_value(json!({
            "formSource": {"filePath": "form.json"}
        }))
        .unwrap();
        assert_eq!(config.output_settings.output_path, None);
        assert_eq!(config.response_source, None);
        assert_eq!(config.rules, RulesConfig::default());
    }
}
