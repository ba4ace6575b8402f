// The collaborators that supply the form structure and the responses.

use std::collections::{HashMap, HashSet};

use crate::survey::{
    io_common::paginate,
    io_csv::read_csv_responses,
    io_forms::{read_form, read_responses},
    io_xlsx::read_xlsx_responses,
    *,
};

/// The structure of a form, in the shape of the provider.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawForm {
    pub form_id: Option<String>,
    pub title: Option<String>,
    pub items: Vec<FormItem>,
    /// Ids of the questions that accept several answers (checkboxes), grid rows included.
    pub multi_valued: HashSet<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FileRef {
    pub file_id: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

/// The raw answer of one respondent to one question.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Answer {
    pub values: Vec<String>,
    /// Uploaded files. They are not part of the analysis.
    pub files: Vec<FileRef>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FormResponse {
    pub response_id: String,
    pub create_time: Option<String>,
    pub last_submitted_time: Option<String>,
    /// Missing when the record could not be read: such a respondent answered nothing.
    pub answers: Option<HashMap<String, Answer>>,
}

impl FormResponse {
    pub fn to_answer_set(&self) -> RawAnswerSet {
        let mut rs = RawAnswerSet::new(Some(self.response_id.clone()));
        match &self.answers {
            Some(answers) => {
                for (qid, answer) in answers.iter() {
                    rs.add_values(qid, &answer.values);
                    if !answer.files.is_empty() {
                        debug!(
                            "to_answer_set: response {}: ignoring {} files for question {}",
                            self.response_id,
                            answer.files.len(),
                            qid
                        );
                    }
                }
            }
            None => {
                warn!(
                    "to_answer_set: response {} has no answers, counting it as empty",
                    self.response_id
                );
            }
        }
        rs
    }
}

/// What the keys of the answers of a response page refer to.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AnswerKeys {
    QuestionId,
    /// Spreadsheet exports only know the titles of the columns.
    ColumnTitle {
        multi_value_delimiter: Option<String>,
    },
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResponsePage {
    pub form_id: String,
    pub next_page_token: Option<String>,
    pub responses: Vec<FormResponse>,
    pub answer_keys: AnswerKeys,
}

pub trait FormDetailProvider {
    fn form_detail(&self, form_id: &str) -> BSurveyResult<RawForm>;
}

pub trait ResponseProvider {
    /// Returns at most `page_size` responses, starting at the given page.
    fn list_responses(
        &self,
        form_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> BSurveyResult<ResponsePage>;
}

/// The output of `forms.get`, saved to a file.
pub struct FormsJsonFormProvider {
    pub path: String,
}

impl FormDetailProvider for FormsJsonFormProvider {
    fn form_detail(&self, form_id: &str) -> BSurveyResult<RawForm> {
        let raw = read_form(&self.path)?;
        if let Some(file_form_id) = &raw.form_id {
            if file_form_id != form_id {
                warn!(
                    "form_detail: requested form {:?} but {} describes form {:?}",
                    form_id, self.path, file_form_id
                );
            }
        }
        Ok(raw)
    }
}

/// The output of `forms.responses.list`, saved to a file.
pub struct FormsJsonResponseProvider {
    pub path: String,
}

impl ResponseProvider for FormsJsonResponseProvider {
    fn list_responses(
        &self,
        form_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> BSurveyResult<ResponsePage> {
        let (all, file_token) = read_responses(&self.path)?;
        let (responses, next_page_token) = paginate(all, page_size, page_token)?;
        Ok(ResponsePage {
            form_id: form_id.to_string(),
            next_page_token: next_page_token.or(file_token),
            responses,
            answer_keys: AnswerKeys::QuestionId,
        })
    }
}

/// A spreadsheet export of the responses, in the CSV or the Excel format.
pub struct SpreadsheetResponseProvider {
    pub path: String,
    pub source: ResponseSource,
    pub excel: bool,
}

impl ResponseProvider for SpreadsheetResponseProvider {
    fn list_responses(
        &self,
        form_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> BSurveyResult<ResponsePage> {
        let all = if self.excel {
            read_xlsx_responses(&self.path, &self.source)?
        } else {
            read_csv_responses(&self.path, &self.source)?
        };
        let (responses, next_page_token) = paginate(all, page_size, page_token)?;
        Ok(ResponsePage {
            form_id: form_id.to_string(),
            next_page_token,
            responses,
            answer_keys: AnswerKeys::ColumnTitle {
                multi_value_delimiter: self.source.multi_value_delimiter.clone(),
            },
        })
    }
}

pub fn make_form_provider(source: &FormSource) -> BSurveyResult<Box<dyn FormDetailProvider>> {
    let provider = source.provider.as_deref().unwrap_or(FORMS_JSON);
    info!(
        "Reading the form structure from {:?} (provider {})",
        source.file_path, provider
    );
    match provider {
        FORMS_JSON => Ok(Box::new(FormsJsonFormProvider {
            path: source.file_path.clone(),
        })),
        x => UnknownProviderSnafu { provider: x }
            .fail()
            .map_err(Box::new),
    }
}

pub fn make_response_provider(
    source: &ResponseSource,
) -> BSurveyResult<Box<dyn ResponseProvider>> {
    let provider = source.provider.as_deref().unwrap_or(FORMS_JSON);
    info!(
        "Reading the responses from {:?} (provider {})",
        source.file_path, provider
    );
    match provider {
        FORMS_JSON => Ok(Box::new(FormsJsonResponseProvider {
            path: source.file_path.clone(),
        })),
        CSV | XLSX => Ok(Box::new(SpreadsheetResponseProvider {
            path: source.file_path.clone(),
            source: source.clone(),
            excel: provider == XLSX,
        })),
        x => UnknownProviderSnafu { provider: x }
            .fail()
            .map_err(Box::new),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_answers_count_as_empty() {
        let r = FormResponse {
            response_id: "r1".to_string(),
            create_time: None,
            last_submitted_time: None,
            answers: None,
        };
        let rs = r.to_answer_set();
        assert!(rs.is_empty());
        assert_eq!(rs.respondent_id, Some("r1".to_string()));
    }

    #[test]
    fn files_are_ignored() {
        let mut answers = HashMap::new();
        answers.insert(
            "q1".to_string(),
            Answer {
                values: vec![],
                files: vec![FileRef {
                    file_id: Some("f".to_string()),
                    file_name: Some("a.png".to_string()),
                    mime_type: Some("image/png".to_string()),
                }],
            },
        );
        answers.insert(
            "q2".to_string(),
            Answer {
                values: vec![" hello ".to_string(), "".to_string()],
                files: vec![],
            },
        );
        let r = FormResponse {
            response_id: "r1".to_string(),
            create_time: None,
            last_submitted_time: None,
            answers: Some(answers),
        };
        let rs = r.to_answer_set();
        assert!(rs.values("q1").is_empty());
        assert_eq!(rs.values("q2"), &["hello".to_string()]);
    }

    #[test]
    fn unknown_provider() {
        let source = FormSource {
            provider: Some("typeform".to_string()),
            file_path: "form.json".to_string(),
            form_id: None,
        };
        let err = make_form_provider(&source).err().unwrap();
        assert!(matches!(*err, SurveyError::UnknownProvider { .. }));
    }
}
