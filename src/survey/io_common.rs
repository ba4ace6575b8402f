use std::collections::{HashMap, HashSet};
use std::path::Path;

use snafu::OptionExt;

use crate::survey::{
    providers::{Answer, FormResponse},
    *,
};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Ids for the rows of a spreadsheet that has no id column.
pub fn make_default_id_lineno(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Page tokens of the file-based providers are offsets in the list of responses.
pub fn paginate<T>(
    all: Vec<T>,
    page_size: usize,
    page_token: Option<&str>,
) -> BSurveyResult<(Vec<T>, Option<String>)> {
    let offset: usize = match page_token {
        None => 0,
        Some(token) => token
            .parse::<usize>()
            .ok()
            .context(InvalidPageTokenSnafu { token })?,
    };
    let total = all.len();
    let end = offset.saturating_add(page_size).min(total);
    let page: Vec<T> = all.into_iter().skip(offset).take(page_size).collect();
    let next = if end < total {
        Some(end.to_string())
    } else {
        None
    };
    Ok((page, next))
}

/// Builds a response from a row of a spreadsheet. The answers are keyed by the column headers.
pub fn tabular_response(
    response_id: String,
    header: &[Option<String>],
    cells: &[Option<String>],
) -> FormResponse {
    let mut answers: HashMap<String, Answer> = HashMap::new();
    let mut create_time: Option<String> = None;
    for (col_name, cell) in header.iter().zip(cells.iter()) {
        if let (Some(col_name), Some(value)) = (col_name, cell) {
            if col_name == TIMESTAMP_COLUMN {
                create_time = Some(value.clone());
            }
            answers
                .entry(col_name.clone())
                .or_default()
                .values
                .push(value.clone());
        }
    }
    FormResponse {
        response_id,
        create_time: create_time.clone(),
        last_submitted_time: create_time,
        answers: Some(answers),
    }
}

/// The canonical title of a spreadsheet column of a grid: `Group [Row]` -> `Group - Row`.
pub fn grid_column_title(col_name: &str) -> Option<String> {
    let stripped = col_name.trim_end().strip_suffix(']')?;
    let idx = stripped.rfind(" [")?;
    Some(format!("{} - {}", &stripped[..idx], &stripped[idx + 2..]))
}

/// Maps the headers of a spreadsheet to the questions with the same title.
pub fn get_col_question_mapping<'a>(
    col_names: &[String],
    questions: &'a [Question],
) -> HashMap<String, &'a Question> {
    let mut by_title: HashMap<&str, &'a Question> = HashMap::new();
    for q in questions.iter() {
        if by_title.contains_key(q.title.as_str()) {
            warn!(
                "get_col_question_mapping: several questions are titled {:?}, using the first one",
                q.title
            );
        } else {
            by_title.insert(q.title.as_str(), q);
        }
    }

    let mut res: HashMap<String, &'a Question> = HashMap::new();
    for col_name in col_names.iter() {
        let q = by_title.get(col_name.trim()).cloned().or_else(|| {
            grid_column_title(col_name).and_then(|t| by_title.get(t.as_str()).cloned())
        });
        match q {
            Some(q) => {
                res.insert(col_name.clone(), q);
            }
            None => {
                info!(
                    "get_col_question_mapping: column {:?} does not match any question, skipping",
                    col_name
                );
            }
        }
    }
    res
}

/// Replaces the column titles of spreadsheet responses by question ids.
///
/// The values of checkbox questions and checkbox grids are split on the delimiter, if any.
/// `multi_valued` holds the ids of the checkbox questions that the form marks as such.
pub fn rekey_by_question(
    responses: Vec<FormResponse>,
    questions: &[Question],
    multi_valued: &HashSet<String>,
    multi_value_delimiter: Option<&str>,
) -> Vec<FormResponse> {
    let col_names: Vec<String> = responses
        .iter()
        .filter_map(|r| r.answers.as_ref())
        .flat_map(|a| a.keys().cloned())
        .collect::<HashSet<String>>()
        .into_iter()
        .collect();
    let mapping = get_col_question_mapping(&col_names, questions);
    debug!("rekey_by_question: mapping: {:?}", mapping.keys());

    responses
        .into_iter()
        .map(|r| {
            let answers = r.answers.map(|answers| {
                let mut res: HashMap<String, Answer> = HashMap::new();
                for (col_name, answer) in answers.into_iter() {
                    let q = match mapping.get(&col_name) {
                        Some(q) => q,
                        None => continue,
                    };
                    let splits =
                        q.kind == QuestionKind::MultiChoice || multi_valued.contains(&q.id);
                    let values: Vec<String> = match multi_value_delimiter {
                        Some(delim) if splits && !delim.is_empty() => {
                            answer
                                .values
                                .iter()
                                .flat_map(|v| v.split(delim).map(|s| s.trim().to_string()))
                                .collect()
                        }
                        _ => answer.values,
                    };
                    let e = res.entry(q.id.clone()).or_default();
                    e.values.extend(values);
                    e.files.extend(answer.files);
                }
                res
            });
            FormResponse { answers, ..r }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, title: &str, kind: QuestionKind) -> Question {
        Question {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            options: vec![],
        }
    }

    #[test]
    fn pages() {
        let all: Vec<u32> = (0..5).collect();
        let (page, next) = paginate(all.clone(), 2, None).unwrap();
        assert_eq!(page, vec![0, 1]);
        assert_eq!(next, Some("2".to_string()));
        let (page, next) = paginate(all.clone(), 2, Some("4")).unwrap();
        assert_eq!(page, vec![4]);
        assert_eq!(next, None);
        let (page, next) = paginate(all.clone(), 500, None).unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(next, None);
        assert!(paginate(all, 2, Some("abc")).is_err());
    }

    #[test]
    fn grid_titles() {
        assert_eq!(
            grid_column_title("Features used [App]"),
            Some("Features used - App".to_string())
        );
        assert_eq!(
            grid_column_title("Rate [a] us [Web]"),
            Some("Rate [a] us - Web".to_string())
        );
        assert_eq!(grid_column_title("Comments"), None);
    }

    #[test]
    fn default_ids() {
        let f = make_default_id_lineno("/tmp/data/responses.csv");
        assert_eq!(f(12), "responses.csv-00000012");
    }

    #[test]
    fn rekey_splits_checkbox_grids_only() {
        let questions = vec![
            question("q1", "Comments", QuestionKind::Text),
            question("r1", "Grid - Row", QuestionKind::MultiChoice),
        ];
        let header = vec![
            Some("Timestamp".to_string()),
            Some("Comments".to_string()),
            Some("Grid [Row]".to_string()),
            None,
        ];
        let cells = vec![
            Some("2024/05/01 10:00:00".to_string()),
            Some("Fast, friendly".to_string()),
            Some("A, B".to_string()),
            Some("ignored".to_string()),
        ];
        let r = tabular_response("row-2".to_string(), &header, &cells);
        assert_eq!(r.create_time, Some("2024/05/01 10:00:00".to_string()));

        let rekeyed = rekey_by_question(vec![r], &questions, &HashSet::new(), Some(","));
        let rs = rekeyed[0].to_answer_set();
        assert_eq!(rs.values("q1"), &["Fast, friendly".to_string()]);
        assert_eq!(rs.values("r1"), &["A".to_string(), "B".to_string()]);
        assert!(rs.values("Timestamp").is_empty());
    }

    #[test]
    fn rekey_splits_standalone_checkboxes() {
        let questions = vec![
            question("q-colour", "Favourite colour", QuestionKind::SingleChoice),
            question("q-contact", "Contact channels", QuestionKind::SingleChoice),
        ];
        let header = vec![
            Some("Favourite colour".to_string()),
            Some("Contact channels".to_string()),
        ];
        let cells = vec![
            Some("Red, Blue".to_string()),
            Some("Email, Phone".to_string()),
        ];
        let r = tabular_response("row-2".to_string(), &header, &cells);
        let multi_valued: HashSet<String> = ["q-contact".to_string()].into_iter().collect();

        let rekeyed = rekey_by_question(vec![r.clone()], &questions, &multi_valued, Some(","));
        let rs = rekeyed[0].to_answer_set();
        assert_eq!(rs.values("q-colour"), &["Red, Blue".to_string()]);
        assert_eq!(
            rs.values("q-contact"),
            &["Email".to_string(), "Phone".to_string()]
        );

        // Without a delimiter, the cell is a single value.
        let rekeyed = rekey_by_question(vec![r], &questions, &multi_valued, None);
        let rs = rekeyed[0].to_answer_set();
        assert_eq!(rs.values("q-contact"), &["Email, Phone".to_string()]);
    }
}
