pub use crate::config::*;

use std::collections::HashSet;

use crate::normalize::canonical_questions;
use crate::run_analysis;

/// A builder for assembling the questions and the answers of a form.
///
/// It checks that the question ids are unique, which the aggregation relies on.
///
/// ```
/// pub use survey_analysis::builder::Builder;
/// pub use survey_analysis::{AnalysisRules, FormItem, QuestionDescriptor};
/// # use survey_analysis::AnalysisErrors;
///
/// let mut builder = Builder::new(&AnalysisRules::DEFAULT_RULES)?
///     .form("form-1", "Lunch poll")
///     .items(&[FormItem::Question {
///         id: "q1".to_string(),
///         title: "Pizza or pasta?".to_string(),
///         descriptor: QuestionDescriptor::Choice {
///             options: vec!["Pizza".to_string(), "Pasta".to_string()],
///         },
///     }])?;
///
/// builder.add_response_simple(&[("q1", "Pizza")])?;
/// builder.add_response_simple(&[("q1", "Pasta")])?;
/// builder.add_response_simple(&[("q1", "Pizza")])?;
///
/// let res = builder.analyze();
/// assert_eq!(res.meta.analyzed_responses, 3);
/// assert_eq!(res.summaries[0].options[0].label, "Pizza");
///
/// # Ok::<(), AnalysisErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AnalysisRules,
    pub(crate) _form_id: String,
    pub(crate) _title: String,
    pub(crate) _questions: Vec<Question>,
    pub(crate) _answer_sets: Vec<RawAnswerSet>,
}

impl Builder {
    pub fn new(rules: &AnalysisRules) -> Result<Builder, AnalysisErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _form_id: String::new(),
            _title: String::new(),
            _questions: Vec::new(),
            _answer_sets: Vec::new(),
        })
    }

    pub fn form(self, form_id: &str, title: &str) -> Builder {
        Builder {
            _form_id: form_id.to_string(),
            _title: title.to_string(),
            ..self
        }
    }

    /// Normalizes the items of a form and appends the resulting questions.
    pub fn items(mut self, items: &[FormItem]) -> Result<Builder, AnalysisErrors> {
        for q in canonical_questions(items) {
            self.add_question(q)?;
        }
        Ok(self)
    }

    /// Adds a question that is already in canonical form.
    pub fn add_question(&mut self, question: Question) -> Result<(), AnalysisErrors> {
        if self._questions.iter().any(|q| q.id == question.id) {
            return Err(AnalysisErrors::DuplicateQuestion(question.id));
        }
        self._questions.push(question);
        Ok(())
    }

    /// Adds the answers of one respondent, as pairs of question id and value.
    ///
    /// A question may appear several times (multiple choices). Blank values are ignored.
    /// Fails if a question id is not part of the form.
    pub fn add_response_simple(&mut self, answers: &[(&str, &str)]) -> Result<(), AnalysisErrors> {
        let mut rs = RawAnswerSet::new(None);
        for (qid, value) in answers.iter() {
            if !self._questions.iter().any(|q| q.id == *qid) {
                return Err(AnalysisErrors::UnknownQuestion(qid.to_string()));
            }
            rs.add_values(qid, &[*value]);
        }
        self.add_response(rs);
        Ok(())
    }

    pub fn add_response(&mut self, answer_set: RawAnswerSet) {
        self._answer_sets.push(answer_set);
    }

    pub fn questions(&self) -> &[Question] {
        &self._questions
    }

    /// Ids of the questions answered by nobody.
    pub fn unanswered_questions(&self) -> Vec<String> {
        let answered: HashSet<&str> = self
            ._questions
            .iter()
            .filter(|q| self._answer_sets.iter().any(|rs| !rs.values(&q.id).is_empty()))
            .map(|q| q.id.as_str())
            .collect();
        self._questions
            .iter()
            .filter(|q| !answered.contains(q.id.as_str()))
            .map(|q| q.id.clone())
            .collect()
    }

    pub fn analyze(&self) -> AnalysisResult {
        run_analysis(
            &self._form_id,
            &self._title,
            &self._questions,
            &self._answer_sets,
            &self._rules,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_item(id: &str) -> FormItem {
        FormItem::Question {
            id: id.to_string(),
            title: id.to_uppercase(),
            descriptor: QuestionDescriptor::Text,
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let res = Builder::new(&AnalysisRules::DEFAULT_RULES)
            .unwrap()
            .items(&[text_item("a"), text_item("a")]);
        assert_eq!(
            res.err(),
            Some(AnalysisErrors::DuplicateQuestion("a".to_string()))
        );
    }

    #[test]
    fn multiple_values_per_question() {
        let mut builder = Builder::new(&AnalysisRules::DEFAULT_RULES)
            .unwrap()
            .form("f", "T")
            .items(&[text_item("a"), text_item("b")])
            .unwrap();
        builder
            .add_response_simple(&[("a", "x"), ("a", "y"), ("b", " ")])
            .unwrap();
        assert_eq!(builder.unanswered_questions(), vec!["b".to_string()]);
        let res = builder.analyze();
        assert_eq!(res.meta.form_id, "f");
        assert_eq!(res.summaries[0].text.as_ref().map(|t| t.count), Some(2));
        assert_eq!(res.summaries[0].answered_count, 1);
        assert_eq!(res.summaries[1].answered_count, 0);
    }

    #[test]
    fn rejects_unknown_questions() {
        let mut builder = Builder::new(&AnalysisRules::DEFAULT_RULES)
            .unwrap()
            .items(&[text_item("a")])
            .unwrap();
        assert_eq!(
            builder.add_response_simple(&[("a", "x"), ("z", "y")]),
            Err(AnalysisErrors::UnknownQuestion("z".to_string()))
        );
        assert_eq!(builder.analyze().meta.analyzed_responses, 0);
    }
}
