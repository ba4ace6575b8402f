use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_analysis::*;

use std::fs;

use serde_json::json;
use serde_json::Value as JSValue;
use std::collections::HashSet;
use text_diff::print_diff;

use crate::args::Args;
use crate::survey::config_reader::*;
use crate::survey::io_common::{rekey_by_question, simplify_file_name};
use crate::survey::io_forms::{read_form, NO_FORM_TITLE};
use crate::survey::providers::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_forms;
mod io_xlsx;
pub mod providers;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {worksheet_name} not found in {path}"))]
    MissingWorksheet { path: String, worksheet_name: String },
    #[snafu(display("Several worksheets in {path}, the worksheet name must be provided"))]
    AmbiguousWorksheet { path: String },
    #[snafu(display("No header found in {path}"))]
    EmptySpreadsheet { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive number or a column name"))]
    ParsingJsonNumber {},
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("No form structure provided (use --form or formSource)"))]
    MissingFormSource {},
    #[snafu(display("No responses provided (use --input or responseSource)"))]
    MissingResponseSource {},
    #[snafu(display("Unknown provider {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Invalid page token {token}"))]
    InvalidPageToken { token: String },
    #[snafu(display("Failed to fetch the {what} of form {form_id}"))]
    UpstreamFetchFailed {
        what: String,
        form_id: String,
        source: Box<SurveyError>,
    },
    #[snafu(display("Difference detected between the output and the reference {path}"))]
    ReferenceMismatch { path: String },
}

pub type SurveyResult<T> = Result<T, SurveyError>;
pub type BSurveyResult<T> = Result<T, Box<SurveyError>>;

/// The canonical questions of a form.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FormDetail {
    pub form_id: String,
    pub title: String,
    pub questions: Vec<Question>,
    /// Ids of the checkbox questions, whose spreadsheet cells join several options.
    pub multi_valued: HashSet<String>,
}

/// What a run prints.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum OutputMode {
    Analysis,
    /// The canonical questions of the form.
    FormDetail,
    /// One page of the responses.
    Responses { page_token: Option<String> },
}

impl OutputMode {
    pub fn from_args(args: &Args) -> OutputMode {
        if args.form_detail {
            OutputMode::FormDetail
        } else if args.responses {
            OutputMode::Responses {
                page_token: args.page_token.clone(),
            }
        } else {
            OutputMode::Analysis
        }
    }
}

pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(1, MAX_PAGE_SIZE as i64) as usize
}

pub fn load_form_detail(
    form_provider: &dyn FormDetailProvider,
    form_id: &str,
) -> BSurveyResult<FormDetail> {
    let raw = form_provider
        .form_detail(form_id)
        .context(UpstreamFetchFailedSnafu {
            what: "form detail",
            form_id,
        })?;
    let mut seen: HashSet<String> = HashSet::new();
    let questions: Vec<Question> = canonical_questions(&raw.items)
        .into_iter()
        .filter(|q| {
            let fresh = seen.insert(q.id.clone());
            if !fresh {
                warn!(
                    "load_form_detail: question id {} appears several times, keeping the first one",
                    q.id
                );
            }
            fresh
        })
        .collect();
    Ok(FormDetail {
        form_id: form_id.to_string(),
        title: raw.title.unwrap_or_else(|| NO_FORM_TITLE.to_string()),
        questions,
        multi_valued: raw.multi_valued,
    })
}

/// Analyzes the first page of responses of a form.
///
/// The limit is clamped between 1 and 500. The responses beyond the first page are not
/// fetched.
pub fn analyze_form(
    form_provider: &dyn FormDetailProvider,
    response_provider: &dyn ResponseProvider,
    form_id: &str,
    limit: i64,
    rules: &AnalysisRules,
) -> BSurveyResult<AnalysisResult> {
    let page_size = clamp_limit(limit);
    let detail = load_form_detail(form_provider, form_id)?;
    let page = response_provider
        .list_responses(form_id, page_size, None)
        .context(UpstreamFetchFailedSnafu {
            what: "responses",
            form_id,
        })?;
    if let Some(token) = &page.next_page_token {
        info!(
            "analyze_form: more responses are available (next page: {}), analyzing the first {}",
            token, page_size
        );
    }

    let responses = keyed_by_question(page, &detail).responses;
    if responses.len() > page_size {
        warn!(
            "analyze_form: received {} responses for a page of {}, dropping the extra ones",
            responses.len(),
            page_size
        );
    }
    let answer_sets: Vec<RawAnswerSet> = responses
        .iter()
        .take(page_size)
        .map(|r| r.to_answer_set())
        .collect();

    Ok(run_analysis(
        &detail.form_id,
        &detail.title,
        &detail.questions,
        &answer_sets,
        rules,
    ))
}

/// The responses of a page, with the answers keyed by question id.
fn keyed_by_question(page: ResponsePage, detail: &FormDetail) -> ResponsePage {
    match &page.answer_keys {
        AnswerKeys::QuestionId => page,
        AnswerKeys::ColumnTitle {
            multi_value_delimiter,
        } => ResponsePage {
            responses: rekey_by_question(
                page.responses,
                &detail.questions,
                &detail.multi_valued,
                multi_value_delimiter.as_deref(),
            ),
            answer_keys: AnswerKeys::QuestionId,
            form_id: page.form_id,
            next_page_token: page.next_page_token,
        },
    }
}

/// Lists one page of the responses of a form.
///
/// The limit is clamped between 1 and 500. Without a form, spreadsheet answers stay keyed
/// by the column titles.
pub fn list_form_responses(
    form_provider: Option<&dyn FormDetailProvider>,
    response_provider: &dyn ResponseProvider,
    form_id: &str,
    limit: i64,
    page_token: Option<&str>,
) -> BSurveyResult<ResponsePage> {
    let page_size = clamp_limit(limit);
    let mut page = response_provider
        .list_responses(form_id, page_size, page_token)
        .context(UpstreamFetchFailedSnafu {
            what: "responses",
            form_id,
        })?;
    page.responses.truncate(page_size);
    debug!(
        "list_form_responses: {} responses, next page: {:?}",
        page.responses.len(),
        page.next_page_token
    );
    match form_provider {
        Some(form_provider) => {
            let detail = load_form_detail(form_provider, form_id)?;
            Ok(keyed_by_question(page, &detail))
        }
        None => {
            if page.answer_keys != AnswerKeys::QuestionId {
                info!("list_form_responses: no form provided, the answers are keyed by column title");
            }
            Ok(page)
        }
    }
}

fn file_ref_to_json(f: &FileRef) -> JSValue {
    json!({
        "fileId": f.file_id,
        "fileName": f.file_name,
        "mimeType": f.mime_type,
    })
}

pub fn response_page_to_json(page: &ResponsePage) -> JSValue {
    let responses: Vec<JSValue> = page
        .responses
        .iter()
        .map(|r| {
            let answers = match &r.answers {
                Some(answers) => {
                    let mut m = serde_json::Map::new();
                    for (qid, answer) in answers.iter() {
                        let files: Vec<JSValue> = answer.files.iter().map(file_ref_to_json).collect();
                        m.insert(
                            qid.clone(),
                            json!({"values": answer.values, "files": files}),
                        );
                    }
                    JSValue::Object(m)
                }
                None => JSValue::Null,
            };
            json!({
                "responseId": r.response_id,
                "createTime": r.create_time,
                "lastSubmittedTime": r.last_submitted_time,
                "answers": answers,
            })
        })
        .collect();
    json!({
        "formId": page.form_id,
        "nextPageToken": page.next_page_token,
        "responses": responses,
    })
}

pub fn result_to_json(res: &AnalysisResult) -> JSValue {
    let summaries: Vec<JSValue> = res
        .summaries
        .iter()
        .map(|s| {
            let options: Vec<JSValue> = s
                .options
                .iter()
                .map(|o| json!({"label": o.label, "count": o.count, "rate": o.rate}))
                .collect();
            let text = match &s.text {
                Some(t) => json!({"count": t.count, "samples": t.samples}),
                None => JSValue::Null,
            };
            json!({
                "questionId": s.question_id,
                "questionTitle": s.question_title,
                "type": s.kind.wire_name(),
                "options": options,
                "text": text,
            })
        })
        .collect();
    json!({
        "meta": {
            "formId": res.meta.form_id,
            "title": res.meta.title,
            "analyzedResponses": res.meta.analyzed_responses,
        },
        "summaries": summaries,
    })
}

pub fn form_detail_to_json(detail: &FormDetail) -> JSValue {
    let questions: Vec<JSValue> = detail
        .questions
        .iter()
        .map(|q| {
            json!({
                "questionId": q.id,
                "title": q.title,
                "type": q.kind.wire_name(),
                "options": q.options,
            })
        })
        .collect();
    json!({
        "formId": detail.form_id,
        "title": detail.title,
        "questions": questions,
    })
}

/// The id of the form: the configured one, else the one stored in the form file, else the file name.
fn resolve_form_id(form_source: &FormSource) -> BSurveyResult<String> {
    if let Some(form_id) = &form_source.form_id {
        return Ok(form_id.clone());
    }
    if form_source.provider.as_deref().unwrap_or(FORMS_JSON) == FORMS_JSON {
        if let Some(form_id) = read_form(&form_source.file_path)?.form_id {
            return Ok(form_id);
        }
    }
    Ok(simplify_file_name(&form_source.file_path))
}

/// Overrides the configuration with the command line flags.
pub fn apply_args(config: &mut SurveyConfig, args: &Args) {
    if let Some(form) = &args.form {
        let form_source = config.form_source.get_or_insert_with(FormSource::default);
        form_source.file_path = form.clone();
    }
    if let Some(form_id) = &args.form_id {
        let form_source = config.form_source.get_or_insert_with(FormSource::default);
        form_source.form_id = Some(form_id.clone());
    }
    if let Some(input) = &args.input {
        let response_source = config
            .response_source
            .get_or_insert_with(ResponseSource::default);
        response_source.file_path = input.clone();
    }
    if let Some(input_type) = &args.input_type {
        let response_source = config
            .response_source
            .get_or_insert_with(ResponseSource::default);
        response_source.provider = Some(input_type.clone());
    }
    if let Some(name) = &args.excel_worksheet_name {
        let response_source = config
            .response_source
            .get_or_insert_with(ResponseSource::default);
        response_source.excel_worksheet_name = Some(name.clone());
    }
    if let Some(delim) = &args.multi_value_delimiter {
        let response_source = config
            .response_source
            .get_or_insert_with(ResponseSource::default);
        response_source.multi_value_delimiter = Some(delim.clone());
    }
    if let Some(limit) = args.limit {
        config.rules.limit = Some(limit);
    }
    if let Some(out) = &args.out {
        config.output_settings.output_path = Some(out.clone());
    }
}

/// Runs the analysis described by the configuration, or one of the other outputs.
pub fn run_config(config: &SurveyConfig, mode: &OutputMode) -> BSurveyResult<JSValue> {
    // A source without a file may still carry the id of the form.
    let form_source = config
        .form_source
        .as_ref()
        .filter(|fs| !fs.file_path.is_empty());
    let response_source = config
        .response_source
        .as_ref()
        .filter(|rs| !rs.file_path.is_empty());

    if let OutputMode::Responses { page_token } = mode {
        let response_source = response_source.context(MissingResponseSourceSnafu {})?;
        let configured_id = config.form_source.as_ref().and_then(|fs| fs.form_id.clone());
        let form_id = match (configured_id, form_source) {
            (Some(form_id), _) => form_id,
            (None, Some(fs)) => resolve_form_id(fs)?,
            (None, None) => simplify_file_name(&response_source.file_path),
        };
        let form_provider = match form_source {
            Some(fs) => Some(make_form_provider(fs)?),
            None => None,
        };
        let response_provider = make_response_provider(response_source)?;
        let page = list_form_responses(
            form_provider.as_deref(),
            response_provider.as_ref(),
            &form_id,
            config.rules.limit.unwrap_or(DEFAULT_RESPONSES_LIMIT),
            page_token.as_deref(),
        )?;
        return Ok(response_page_to_json(&page));
    }

    let form_source = form_source.context(MissingFormSourceSnafu {})?;
    let form_id = resolve_form_id(form_source)?;
    let form_provider = make_form_provider(form_source)?;

    if *mode == OutputMode::FormDetail {
        let detail = load_form_detail(form_provider.as_ref(), &form_id)?;
        return Ok(form_detail_to_json(&detail));
    }

    let response_source = response_source.context(MissingResponseSourceSnafu {})?;
    let response_provider = make_response_provider(response_source)?;
    let res = analyze_form(
        form_provider.as_ref(),
        response_provider.as_ref(),
        &form_id,
        config.rules.limit.unwrap_or(DEFAULT_LIMIT),
        &config.rules.analysis_rules(),
    )?;
    debug!("run_config: {:?}", res);
    Ok(result_to_json(&res))
}

fn write_output(path: Option<&str>, contents: &str) -> BSurveyResult<()> {
    match path {
        None | Some("") | Some(STDOUT) => {
            println!("{}", contents);
        }
        Some(p) => {
            info!("Writing output to {:?}", p);
            fs::write(p, contents).context(WritingOutputSnafu { path: p })?;
        }
    }
    Ok(())
}

/// Compares the output with a reference file, and prints the differences.
pub fn check_reference(reference_path: &str, pretty_output: &str) -> BSurveyResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_output {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_output, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail()
        .map_err(Box::new);
    }
    Ok(())
}

pub fn run(args: &Args) -> BSurveyResult<()> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => SurveyConfig::default(),
    };
    apply_args(&mut config, args);
    info!("config: {:?}", config);

    let result_js = run_config(&config, &OutputMode::from_args(args))?;
    let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_output(config.output_settings.output_path.as_deref(), &pretty_js)?;

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js)?;
    }
    Ok(())
}
