// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// The category of a canonical question.
///
/// All the question shapes of the forms provider are reduced to one of these kinds.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QuestionKind {
    /// One choice among a list of options. Non-grid choice questions always end up here,
    /// even when the form allows several boxes to be ticked.
    SingleChoice,
    /// Any number of options among a list. Only produced for checkbox grids.
    MultiChoice,
    /// A linear scale. The options are ordered by ascending score.
    Scale,
    /// Free text, dates and times.
    Text,
    Unknown,
}

impl QuestionKind {
    /// The name of the kind in the JSON output.
    pub fn wire_name(&self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "CHOICE",
            QuestionKind::MultiChoice => "CHOICE_MULTI",
            QuestionKind::Scale => "SCALE",
            QuestionKind::Text => "TEXT",
            QuestionKind::Unknown => "UNKNOWN",
        }
    }

    /// True if the answers are tallied per option.
    pub fn is_choice_like(&self) -> bool {
        matches!(
            self,
            QuestionKind::SingleChoice | QuestionKind::MultiChoice | QuestionKind::Scale
        )
    }
}

/// A question in its canonical form.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Question {
    pub id: String,
    pub title: String,
    pub kind: QuestionKind,
    /// Empty unless the kind is choice-like.
    pub options: Vec<String>,
}

/// The payload of a single (non-grid) question, as described by the forms provider.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum QuestionDescriptor {
    Choice {
        options: Vec<String>,
    },
    Text,
    Date,
    Time,
    Scale {
        low: Option<i32>,
        high: Option<i32>,
        low_label: Option<String>,
        high_label: Option<String>,
    },
    /// Any other shape (file uploads, ratings, ...).
    Unknown,
}

/// The selection mode of the columns of a grid.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum GridChoiceType {
    Radio,
    Checkbox,
}

impl GridChoiceType {
    /// Reads the tag used by the provider (`RADIO`, `CHECK_BOX`).
    /// Anything that is not a checkbox is treated as a radio.
    pub fn from_tag(tag: &str) -> GridChoiceType {
        if tag.eq_ignore_ascii_case("CHECK_BOX") || tag.eq_ignore_ascii_case("CHECKBOX") {
            GridChoiceType::Checkbox
        } else {
            GridChoiceType::Radio
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GridColumns {
    pub choice_type: GridChoiceType,
    pub options: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GridRow {
    /// The question id of the row. Answers are recorded against this id.
    pub id: String,
    pub title: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GridDescriptor {
    pub title: String,
    pub columns: Option<GridColumns>,
    pub rows: Vec<GridRow>,
}

/// One item of a form.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FormItem {
    /// A standalone question. The title lives on the item, not on the question payload.
    Question {
        id: String,
        title: String,
        descriptor: QuestionDescriptor,
    },
    Grid(GridDescriptor),
    /// Page breaks, images, text blocks: they carry no answers.
    Other,
}

/// The answers of one respondent, keyed by question id.
///
/// The values are trimmed and never blank: this is enforced when they are added.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawAnswerSet {
    pub respondent_id: Option<String>,
    answers: HashMap<String, Vec<String>>,
}

impl RawAnswerSet {
    pub fn new(respondent_id: Option<String>) -> RawAnswerSet {
        RawAnswerSet {
            respondent_id,
            answers: HashMap::new(),
        }
    }

    /// Adds values for a question. Blank values are dropped, and if nothing is left the
    /// question stays unanswered for this respondent.
    pub fn add_values<S: AsRef<str>>(&mut self, question_id: &str, values: &[S]) {
        let cleaned: Vec<String> = values
            .iter()
            .map(|v| v.as_ref().trim())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
            .collect();
        if cleaned.is_empty() {
            return;
        }
        self.answers
            .entry(question_id.to_string())
            .or_default()
            .extend(cleaned);
    }

    /// The values for a question, empty if the question was not answered.
    pub fn values(&self, question_id: &str) -> &[String] {
        self.answers
            .get(question_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnalysisMeta {
    pub form_id: String,
    pub title: String,
    /// Number of respondents considered, whether or not they answered anything.
    pub analyzed_responses: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct OptionStat {
    pub label: String,
    pub count: u64,
    /// Percentage of the respondents who answered the question, rounded to 2 decimals.
    pub rate: f64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TextStat {
    pub count: u64,
    pub samples: Vec<String>,
}

/// Statistics for one question
#[derive(PartialEq, Debug, Clone)]
pub struct QuestionSummary {
    pub question_id: String,
    pub question_title: String,
    pub kind: QuestionKind,
    /// The number of respondents with at least one value for this question.
    pub answered_count: u64,
    /// Filled for choice-like questions.
    pub options: Vec<OptionStat>,
    /// Filled for text and unknown questions.
    pub text: Option<TextStat>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AnalysisResult {
    pub meta: AnalysisMeta,
    pub summaries: Vec<QuestionSummary>,
}

/// Errors raised when assembling the inputs of an analysis.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AnalysisErrors {
    /// Two questions of the same form share an id.
    DuplicateQuestion(String),
    /// An answer refers to a question that is not part of the form.
    UnknownQuestion(String),
}

impl Error for AnalysisErrors {}

impl Display for AnalysisErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisErrors::DuplicateQuestion(qid) => {
                write!(f, "Duplicate question id in form: {}", qid)
            }
            AnalysisErrors::UnknownQuestion(qid) => {
                write!(f, "Answer to unknown question: {}", qid)
            }
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnalysisRules {
    /// Maximum number of answers kept as samples for text questions.
    pub text_sample_size: usize,
}

impl AnalysisRules {
    pub const DEFAULT_RULES: AnalysisRules = AnalysisRules {
        text_sample_size: 20,
    };
}

impl Default for AnalysisRules {
    fn default() -> Self {
        AnalysisRules::DEFAULT_RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_set_drops_blank_values() {
        let mut rs = RawAnswerSet::new(None);
        rs.add_values("q1", &["  yes ", "", "   "]);
        rs.add_values("q2", &["   "]);
        assert_eq!(rs.values("q1"), &["yes".to_string()]);
        assert!(rs.values("q2").is_empty());
        assert!(rs.values("q3").is_empty());
    }

    #[test]
    fn grid_tags() {
        assert_eq!(GridChoiceType::from_tag("CHECK_BOX"), GridChoiceType::Checkbox);
        assert_eq!(GridChoiceType::from_tag("check_box"), GridChoiceType::Checkbox);
        assert_eq!(GridChoiceType::from_tag("RADIO"), GridChoiceType::Radio);
        assert_eq!(GridChoiceType::from_tag(""), GridChoiceType::Radio);
    }
}
