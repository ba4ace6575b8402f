// Readers for the JSON documents of the Google Forms API.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::survey::{
    io_common::make_default_id_lineno,
    providers::{Answer, FileRef, FormResponse, RawForm},
    *,
};

pub const NO_FORM_TITLE: &str = "(no title)";
pub const NO_QUESTION_TITLE: &str = "(no question title)";
pub const NO_GRID_TITLE: &str = "(grid)";
pub const NO_ROW_TITLE: &str = "(row)";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FormInfo {
    pub title: Option<String>,
    #[serde(rename = "documentTitle")]
    pub document_title: Option<String>,
    pub description: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiForm {
    #[serde(rename = "formId")]
    pub form_id: Option<String>,
    pub info: Option<FormInfo>,
    // Items are read one by one, so that a broken item does not invalidate the form.
    #[serde(default)]
    pub items: Vec<JSValue>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiItem {
    #[serde(rename = "itemId")]
    pub item_id: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "questionItem")]
    pub question_item: Option<ApiQuestionItem>,
    #[serde(rename = "questionGroupItem")]
    pub question_group_item: Option<ApiQuestionGroupItem>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiQuestionItem {
    pub question: Option<ApiQuestion>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiQuestion {
    #[serde(rename = "questionId")]
    pub question_id: Option<String>,
    pub required: Option<bool>,
    #[serde(rename = "choiceQuestion")]
    pub choice_question: Option<ApiChoiceQuestion>,
    #[serde(rename = "textQuestion")]
    pub text_question: Option<JSValue>,
    #[serde(rename = "dateQuestion")]
    pub date_question: Option<JSValue>,
    #[serde(rename = "timeQuestion")]
    pub time_question: Option<JSValue>,
    #[serde(rename = "scaleQuestion")]
    pub scale_question: Option<ApiScaleQuestion>,
    #[serde(rename = "rowQuestion")]
    pub row_question: Option<ApiRowQuestion>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiChoiceQuestion {
    #[serde(rename = "type")]
    pub choice_type: Option<String>,
    #[serde(default)]
    pub options: Vec<ApiOption>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiOption {
    pub value: Option<String>,
    #[serde(rename = "isOther")]
    pub is_other: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiScaleQuestion {
    pub low: Option<i32>,
    pub high: Option<i32>,
    #[serde(rename = "lowLabel")]
    pub low_label: Option<String>,
    #[serde(rename = "highLabel")]
    pub high_label: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiRowQuestion {
    pub title: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiQuestionGroupItem {
    #[serde(default)]
    pub questions: Vec<ApiQuestion>,
    pub grid: Option<ApiGrid>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiGrid {
    pub columns: Option<ApiChoiceQuestion>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponseList {
    // Responses are read one by one, for the same reason as the items.
    #[serde(default)]
    pub responses: Vec<JSValue>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiFormResponse {
    #[serde(rename = "responseId")]
    pub response_id: Option<String>,
    #[serde(rename = "createTime")]
    pub create_time: Option<String>,
    #[serde(rename = "lastSubmittedTime")]
    pub last_submitted_time: Option<String>,
    pub answers: Option<HashMap<String, ApiAnswer>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiAnswer {
    #[serde(rename = "questionId")]
    pub question_id: Option<String>,
    #[serde(rename = "textAnswers")]
    pub text_answers: Option<ApiTextAnswers>,
    #[serde(rename = "fileUploadAnswers")]
    pub file_upload_answers: Option<ApiFileUploadAnswers>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiTextAnswers {
    #[serde(default)]
    pub answers: Vec<ApiTextAnswer>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiTextAnswer {
    pub value: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiFileUploadAnswers {
    #[serde(default)]
    pub answers: Vec<ApiFileUploadAnswer>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApiFileUploadAnswer {
    #[serde(rename = "fileId")]
    pub file_id: Option<String>,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
}

fn read_json(path: &str) -> BSurveyResult<JSValue> {
    info!("Attempting to read JSON file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn read_form(path: &str) -> BSurveyResult<RawForm> {
    let js = read_json(path)?;
    let form: ApiForm = serde_json::from_value(js).context(ParsingJsonSnafu {})?;
    Ok(parse_form(&form))
}

pub fn parse_form(form: &ApiForm) -> RawForm {
    let title = form.info.as_ref().and_then(|i| i.title.clone());
    let mut items: Vec<FormItem> = Vec::new();
    let mut multi_valued: HashSet<String> = HashSet::new();
    for (idx, item_js) in form.items.iter().enumerate() {
        match serde_json::from_value::<ApiItem>(item_js.clone()) {
            Ok(item) => {
                multi_valued.extend(multi_valued_ids(&item));
                items.push(parse_item(&item));
            }
            Err(e) => {
                warn!("parse_form: skipping item {}: {}", idx, e);
            }
        }
    }
    RawForm {
        form_id: form.form_id.clone(),
        title,
        items,
        multi_valued,
    }
}

fn is_checkbox(cq: &ApiChoiceQuestion) -> bool {
    GridChoiceType::from_tag(cq.choice_type.as_deref().unwrap_or("")) == GridChoiceType::Checkbox
}

/// The ids of the questions of an item whose answers may hold several values.
///
/// A standalone checkbox question is still a `CHOICE`, but its spreadsheet cells join the
/// ticked options.
pub fn multi_valued_ids(item: &ApiItem) -> Vec<String> {
    if let Some(q) = item.question_item.as_ref().and_then(|qi| qi.question.as_ref()) {
        return match (&q.question_id, &q.choice_question) {
            (Some(qid), Some(cq)) if is_checkbox(cq) => vec![qid.clone()],
            _ => vec![],
        };
    }
    match &item.question_group_item {
        Some(group) if group.grid.as_ref().and_then(|g| g.columns.as_ref()).map_or(false, is_checkbox) => {
            group
                .questions
                .iter()
                .filter_map(|row_q| row_q.question_id.clone())
                .collect()
        }
        _ => vec![],
    }
}

pub fn parse_item(item: &ApiItem) -> FormItem {
    if let Some(q) = item.question_item.as_ref().and_then(|qi| qi.question.as_ref()) {
        return match &q.question_id {
            Some(qid) => FormItem::Question {
                id: qid.clone(),
                title: item
                    .title
                    .clone()
                    .unwrap_or_else(|| NO_QUESTION_TITLE.to_string()),
                descriptor: parse_question(q),
            },
            None => {
                warn!(
                    "parse_item: item {:?} has a question without id, skipping",
                    item.item_id
                );
                FormItem::Other
            }
        };
    }

    if let Some(group) = &item.question_group_item {
        let columns = group
            .grid
            .as_ref()
            .and_then(|g| g.columns.as_ref())
            .map(|cols| GridColumns {
                choice_type: GridChoiceType::from_tag(cols.choice_type.as_deref().unwrap_or("")),
                options: option_values(&cols.options),
            });
        let mut rows: Vec<GridRow> = Vec::new();
        for row_q in group.questions.iter() {
            match &row_q.question_id {
                Some(qid) => rows.push(GridRow {
                    id: qid.clone(),
                    title: row_q
                        .row_question
                        .as_ref()
                        .and_then(|r| r.title.clone())
                        .unwrap_or_else(|| NO_ROW_TITLE.to_string()),
                }),
                None => warn!(
                    "parse_item: grid {:?} has a row without id, skipping",
                    item.item_id
                ),
            }
        }
        return FormItem::Grid(GridDescriptor {
            title: item.title.clone().unwrap_or_else(|| NO_GRID_TITLE.to_string()),
            columns,
            rows,
        });
    }

    debug!("parse_item: item {:?} carries no question", item.item_id);
    FormItem::Other
}

pub fn parse_question(q: &ApiQuestion) -> QuestionDescriptor {
    if let Some(cq) = &q.choice_question {
        return QuestionDescriptor::Choice {
            options: option_values(&cq.options),
        };
    }
    if q.text_question.is_some() {
        return QuestionDescriptor::Text;
    }
    if q.date_question.is_some() {
        return QuestionDescriptor::Date;
    }
    if q.time_question.is_some() {
        return QuestionDescriptor::Time;
    }
    if let Some(sq) = &q.scale_question {
        return QuestionDescriptor::Scale {
            low: sq.low,
            high: sq.high,
            low_label: sq.low_label.clone(),
            high_label: sq.high_label.clone(),
        };
    }
    QuestionDescriptor::Unknown
}

fn option_values(options: &[ApiOption]) -> Vec<String> {
    options.iter().filter_map(|o| o.value.clone()).collect()
}

/// Reads the responses and the continuation token of the file.
pub fn read_responses(path: &str) -> BSurveyResult<(Vec<FormResponse>, Option<String>)> {
    let js = read_json(path)?;
    let list: ApiResponseList = serde_json::from_value(js).context(ParsingJsonSnafu {})?;
    let default_id = make_default_id_lineno(path);
    let responses: Vec<FormResponse> = list
        .responses
        .iter()
        .enumerate()
        .map(|(idx, r_js)| parse_response(r_js, || default_id(idx + 1)))
        .collect();
    debug!("read_responses: {} responses in {:?}", responses.len(), path);
    Ok((responses, list.next_page_token))
}

pub fn parse_response(r_js: &JSValue, default_id: impl Fn() -> String) -> FormResponse {
    match serde_json::from_value::<ApiFormResponse>(r_js.clone()) {
        Ok(r) => {
            let answers = r.answers.map(|answers| {
                answers
                    .into_iter()
                    .map(|(qid, a)| (qid, parse_answer(a)))
                    .collect::<HashMap<String, Answer>>()
            });
            FormResponse {
                response_id: r.response_id.unwrap_or_else(default_id),
                create_time: r.create_time,
                last_submitted_time: r.last_submitted_time,
                answers,
            }
        }
        Err(e) => {
            let response_id = r_js
                .get("responseId")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(default_id);
            warn!(
                "parse_response: could not read response {}: {}",
                response_id, e
            );
            FormResponse {
                response_id,
                create_time: None,
                last_submitted_time: None,
                answers: None,
            }
        }
    }
}

fn parse_answer(a: ApiAnswer) -> Answer {
    let values: Vec<String> = a
        .text_answers
        .map(|ta| ta.answers.into_iter().filter_map(|x| x.value).collect())
        .unwrap_or_default();
    let files: Vec<FileRef> = a
        .file_upload_answers
        .map(|fa| {
            fa.answers
                .into_iter()
                .map(|f| FileRef {
                    file_id: f.file_id,
                    file_name: f.file_name,
                    mime_type: f.mime_type,
                })
                .collect()
        })
        .unwrap_or_default();
    Answer { values, files }
}
