mod config;
mod normalize;

pub mod builder;
pub mod manual;
pub mod quick_start;

use indexmap::IndexMap;
use log::{debug, info};

pub use crate::config::*;
pub use crate::normalize::*;

/// Runs the aggregation over the answers of all the respondents.
///
/// Arguments:
/// * `form_id` and `title` are copied into the metadata of the result
/// * `questions` the canonical questions of the form. The summaries follow the same order.
/// * `answer_sets` the answers, one set per respondent. All of them are counted in
/// the metadata, even if they did not answer anything.
/// * `rules` the rules that govern this analysis
pub fn run_analysis(
    form_id: &str,
    title: &str,
    questions: &[Question],
    answer_sets: &[RawAnswerSet],
    rules: &AnalysisRules,
) -> AnalysisResult {
    info!(
        "run_analysis: form {:?}: processing {} questions and {} responses",
        form_id,
        questions.len(),
        answer_sets.len()
    );

    let summaries: Vec<QuestionSummary> = questions
        .iter()
        .map(|q| summarize_question(q, answer_sets, rules))
        .collect();

    AnalysisResult {
        meta: AnalysisMeta {
            form_id: form_id.to_string(),
            title: title.to_string(),
            analyzed_responses: answer_sets.len() as u64,
        },
        summaries,
    }
}

fn summarize_question(
    question: &Question,
    answer_sets: &[RawAnswerSet],
    rules: &AnalysisRules,
) -> QuestionSummary {
    let mut all_values: Vec<&str> = Vec::new();
    let mut answered_count: u64 = 0;
    for rs in answer_sets.iter() {
        let values = rs.values(&question.id);
        if !values.is_empty() {
            answered_count += 1;
            all_values.extend(values.iter().map(|s| s.as_str()));
        }
    }
    debug!(
        "summarize_question: {:?} ({:?}): {} values from {} respondents",
        question.id,
        question.kind,
        all_values.len(),
        answered_count
    );

    let (options, text) = match question.kind {
        QuestionKind::Scale => (
            scale_stats(question, &all_values, answered_count),
            None,
        ),
        QuestionKind::SingleChoice | QuestionKind::MultiChoice => {
            (choice_stats(&all_values, answered_count), None)
        }
        QuestionKind::Text | QuestionKind::Unknown => (
            Vec::new(),
            Some(TextStat {
                count: all_values.len() as u64,
                samples: all_values
                    .iter()
                    .take(rules.text_sample_size)
                    .map(|s| s.to_string())
                    .collect(),
            }),
        ),
    };

    QuestionSummary {
        question_id: question.id.clone(),
        question_title: question.title.clone(),
        kind: question.kind,
        answered_count,
        options,
        text,
    }
}

// Every option of the scale is reported, including the ones nobody picked.
fn scale_stats(question: &Question, values: &[&str], answered_count: u64) -> Vec<OptionStat> {
    let mut counts: IndexMap<&str, u64> = IndexMap::new();
    for &v in values.iter() {
        match extract_leading_number(v) {
            Some(key) => *counts.entry(key).or_insert(0) += 1,
            None => debug!("scale_stats: {:?}: discarding value {:?}", question.id, v),
        }
    }

    question
        .options
        .iter()
        .map(|label| {
            let key = extract_leading_number(label).unwrap_or(label.as_str());
            let count = counts.get(key).cloned().unwrap_or(0);
            OptionStat {
                label: label.clone(),
                count,
                rate: rate(count, answered_count),
            }
        })
        .collect()
}

// Only the values that were seen are reported, the most frequent first.
fn choice_stats(values: &[&str], answered_count: u64) -> Vec<OptionStat> {
    let mut counts: IndexMap<&str, u64> = IndexMap::new();
    for &v in values.iter() {
        *counts.entry(v).or_insert(0) += 1;
    }
    let mut sorted: Vec<(&str, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
        .into_iter()
        .map(|(label, count)| OptionStat {
            label: label.to_string(),
            count,
            rate: rate(count, answered_count),
        })
        .collect()
}

fn rate(count: u64, answered_count: u64) -> f64 {
    if answered_count == 0 {
        0.0
    } else {
        round2(count as f64 * 100.0 / answered_count as f64)
    }
}

/// Rounds to 2 decimal places, halves away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The run of ASCII digits at the start of a (trimmed) string.
///
/// Scale answers and scale labels do not always look the same (`"1"` vs `"1 (Bad)"`),
/// but they agree on this prefix.
///
/// ```
/// use survey_analysis::extract_leading_number;
///
/// assert_eq!(extract_leading_number("  10점"), Some("10"));
/// assert_eq!(extract_leading_number("abc"), None);
/// ```
pub fn extract_leading_number(s: &str) -> Option<&str> {
    let x = s.trim();
    let end = x
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(x.len());
    if end == 0 {
        None
    } else {
        Some(&x[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn answers(qid: &str, values: &[&str]) -> RawAnswerSet {
        let mut rs = RawAnswerSet::new(None);
        rs.add_values(qid, values);
        rs
    }

    fn scale_question() -> Question {
        normalize_question(
            "s",
            "Satisfaction",
            &QuestionDescriptor::Scale {
                low: Some(1),
                high: Some(5),
                low_label: Some("Bad".to_string()),
                high_label: Some("Good".to_string()),
            },
        )
    }

    fn opt(label: &str, count: u64, rate: f64) -> OptionStat {
        OptionStat {
            label: label.to_string(),
            count,
            rate,
        }
    }

    #[test]
    fn leading_number() {
        assert_eq!(extract_leading_number("1"), Some("1"));
        assert_eq!(extract_leading_number("1 (매우 불만족)"), Some("1"));
        assert_eq!(extract_leading_number("  10점"), Some("10"));
        assert_eq!(extract_leading_number("abc"), None);
        assert_eq!(extract_leading_number(""), None);
        assert_eq!(extract_leading_number("   "), None);
        assert_eq!(extract_leading_number("-1"), None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(200.0 / 3.0), 66.67);
        assert_eq!(round2(100.0 / 3.0), 33.33);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn scale_reports_every_score() {
        init();
        let q = scale_question();
        let sets = vec![answers("s", &["1"]), answers("s", &["1"]), answers("s", &["5"])];
        let res = run_analysis("f", "Form", &[q], &sets, &AnalysisRules::DEFAULT_RULES);
        let s = &res.summaries[0];
        assert_eq!(s.answered_count, 3);
        assert_eq!(s.kind, QuestionKind::Scale);
        assert_eq!(
            s.options,
            vec![
                opt("1 (Bad)", 2, 66.67),
                opt("2", 0, 0.0),
                opt("3", 0, 0.0),
                opt("4", 0, 0.0),
                opt("5 (Good)", 1, 33.33),
            ]
        );
        assert!(s.text.is_none());
    }

    #[test]
    fn scale_matches_annotated_values() {
        let q = scale_question();
        let sets = vec![
            answers("s", &["5 (Good)"]),
            answers("s", &["n/a"]),
            answers("s", &["  2"]),
        ];
        let res = run_analysis("f", "Form", &[q], &sets, &AnalysisRules::DEFAULT_RULES);
        let s = &res.summaries[0];
        // The unparseable value still counts as an answer.
        assert_eq!(s.answered_count, 3);
        let counts: Vec<u64> = s.options.iter().map(|o| o.count).collect();
        assert_eq!(counts, vec![0, 1, 0, 0, 1]);
        assert_eq!(s.options[4].rate, 33.33);
    }

    #[test]
    fn choice_sorted_by_count() {
        let q = normalize_question(
            "c",
            "Colour",
            &QuestionDescriptor::Choice {
                options: vec!["Red".to_string(), "Blue".to_string()],
            },
        );
        let sets = vec![
            answers("c", &["Red"]),
            answers("c", &["Blue"]),
            answers("c", &["Red"]),
            answers("other", &["x"]),
            answers("c", &["Red"]),
        ];
        let res = run_analysis("f", "Form", &[q], &sets, &AnalysisRules::DEFAULT_RULES);
        assert_eq!(res.meta.analyzed_responses, 5);
        let s = &res.summaries[0];
        assert_eq!(s.answered_count, 4);
        assert_eq!(s.options, vec![opt("Red", 3, 75.0), opt("Blue", 1, 25.0)]);
    }

    #[test]
    fn choice_does_not_report_unused_options() {
        let q = normalize_question(
            "c",
            "Colour",
            &QuestionDescriptor::Choice {
                options: vec!["Red".to_string(), "Blue".to_string(), "Green".to_string()],
            },
        );
        let sets = vec![answers("c", &["Green"]), answers("c", &["Purple"])];
        let res = run_analysis("f", "Form", &[q], &sets, &AnalysisRules::DEFAULT_RULES);
        let s = &res.summaries[0];
        assert_eq!(s.options.len(), 2);
        assert!(s.options.iter().all(|o| o.count > 0));
        let mut labels: Vec<&str> = s.options.iter().map(|o| o.label.as_str()).collect();
        // Equal counts: no particular order.
        labels.sort();
        assert_eq!(labels, vec!["Green", "Purple"]);
    }

    #[test]
    fn multi_choice_rates_can_exceed_answers() {
        let grid = GridDescriptor {
            title: "Features".to_string(),
            columns: Some(GridColumns {
                choice_type: GridChoiceType::Checkbox,
                options: vec!["A".to_string(), "B".to_string()],
            }),
            rows: vec![GridRow {
                id: "r1".to_string(),
                title: "Row".to_string(),
            }],
        };
        let qs = flatten_grid(&grid);
        let sets = vec![answers("r1", &["A", "B"]), answers("r1", &["A"])];
        let res = run_analysis("f", "Form", &qs, &sets, &AnalysisRules::DEFAULT_RULES);
        let s = &res.summaries[0];
        assert_eq!(s.kind, QuestionKind::MultiChoice);
        assert_eq!(s.answered_count, 2);
        assert_eq!(s.options, vec![opt("A", 2, 100.0), opt("B", 1, 50.0)]);
        let total: u64 = s.options.iter().map(|o| o.count).sum();
        assert!(total > s.answered_count);
    }

    #[test]
    fn text_samples_are_truncated() {
        let q = normalize_question("t", "Comments", &QuestionDescriptor::Text);
        let sets: Vec<RawAnswerSet> = (0..25)
            .map(|i| answers("t", &[format!("answer {}", i).as_str()]))
            .collect();
        let res = run_analysis("f", "Form", &[q], &sets, &AnalysisRules::DEFAULT_RULES);
        let s = &res.summaries[0];
        assert!(s.options.is_empty());
        let text = s.text.clone().unwrap();
        assert_eq!(text.count, 25);
        assert_eq!(text.samples.len(), 20);
        assert_eq!(text.samples[0], "answer 0");
        assert_eq!(text.samples[19], "answer 19");
    }

    #[test]
    fn text_keeps_duplicates_and_order() {
        let q = normalize_question("t", "Comments", &QuestionDescriptor::Unknown);
        let sets = vec![
            answers("t", &["b", "a"]),
            answers("t", &[" "]),
            answers("t", &["b"]),
        ];
        let rules = AnalysisRules {
            text_sample_size: 2,
        };
        let res = run_analysis("f", "Form", &[q], &sets, &rules);
        let s = &res.summaries[0];
        assert_eq!(s.answered_count, 2);
        assert_eq!(
            s.text,
            Some(TextStat {
                count: 3,
                samples: vec!["b".to_string(), "a".to_string()],
            })
        );
    }

    #[test]
    fn no_respondents() {
        let qs = vec![
            scale_question(),
            normalize_question(
                "c",
                "Colour",
                &QuestionDescriptor::Choice {
                    options: vec!["Red".to_string()],
                },
            ),
            normalize_question("t", "Comments", &QuestionDescriptor::Text),
        ];
        let res = run_analysis("f", "Form", &qs, &[], &AnalysisRules::DEFAULT_RULES);
        assert_eq!(res.meta.analyzed_responses, 0);
        assert_eq!(res.summaries.len(), 3);
        let scale = &res.summaries[0];
        assert_eq!(scale.options.len(), 5);
        assert!(scale.options.iter().all(|o| o.count == 0 && o.rate == 0.0));
        assert!(res.summaries[1].options.is_empty());
        assert_eq!(
            res.summaries[2].text,
            Some(TextStat {
                count: 0,
                samples: vec![],
            })
        );
    }

    #[test]
    fn summaries_follow_question_order() {
        let qs = vec![
            normalize_question("b", "B", &QuestionDescriptor::Text),
            normalize_question("a", "A", &QuestionDescriptor::Text),
        ];
        let sets = vec![RawAnswerSet::new(Some("r1".to_string()))];
        let res = run_analysis("f", "Title", &qs, &sets, &AnalysisRules::DEFAULT_RULES);
        let ids: Vec<&str> = res.summaries.iter().map(|s| s.question_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(res.meta.title, "Title");
        assert_eq!(res.meta.form_id, "f");
        assert_eq!(res.meta.analyzed_responses, 1);
    }

    #[test]
    fn rates_stay_in_bounds() {
        let q = scale_question();
        let sets: Vec<RawAnswerSet> = ["1", "2", "2", "3", "5", "5", "5"]
            .iter()
            .map(|v| answers("s", &[*v]))
            .collect();
        let res = run_analysis("f", "Form", &[q], &sets, &AnalysisRules::DEFAULT_RULES);
        let s = &res.summaries[0];
        assert!(s.options.iter().all(|o| (0.0..=100.0).contains(&o.rate)));
        let total: u64 = s.options.iter().map(|o| o.count).sum();
        assert!(total <= s.answered_count);
    }
}
