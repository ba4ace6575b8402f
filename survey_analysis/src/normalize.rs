//! Conversion of the raw form items into canonical questions.

use log::{debug, warn};

use crate::config::*;

/// Turns one question payload into a canonical question.
///
/// The title is provided separately because it is carried by the containing item.
/// This function never fails: shapes that are not understood become `Unknown`.
pub fn normalize_question(id: &str, title: &str, descriptor: &QuestionDescriptor) -> Question {
    let (kind, options) = match descriptor {
        QuestionDescriptor::Choice { options } => (QuestionKind::SingleChoice, options.clone()),
        QuestionDescriptor::Text | QuestionDescriptor::Date | QuestionDescriptor::Time => {
            (QuestionKind::Text, Vec::new())
        }
        QuestionDescriptor::Scale {
            low,
            high,
            low_label,
            high_label,
        } => {
            let low = low.unwrap_or(1);
            let high = high.unwrap_or(low);
            let options = scale_options(
                low,
                high,
                low_label.as_deref().unwrap_or(""),
                high_label.as_deref().unwrap_or(""),
            );
            (QuestionKind::Scale, options)
        }
        QuestionDescriptor::Unknown => (QuestionKind::Unknown, Vec::new()),
    };
    Question {
        id: id.to_string(),
        title: title.to_string(),
        kind,
        options,
    }
}

/// The widest range of scores a linear scale may have.
pub const MAX_SCALE_SPAN: i64 = 100;

/// The labels of a linear scale, in ascending order of score.
///
/// The end points are annotated with their labels when they have one: `1 (Bad)`.
/// An inverted range, or one wider than `MAX_SCALE_SPAN`, collapses to the single option `low`.
pub fn scale_options(low: i32, high: i32, low_label: &str, high_label: &str) -> Vec<String> {
    let last = if (high as i64) - (low as i64) > MAX_SCALE_SPAN {
        warn!(
            "scale_options: the range {}..{} is too wide, keeping only {}",
            low, high, low
        );
        low
    } else {
        high.max(low)
    };
    (low..=last)
        .map(|i| {
            if i == low && !low_label.trim().is_empty() {
                format!("{} ({})", i, low_label)
            } else if i == high && !high_label.trim().is_empty() {
                format!("{} ({})", i, high_label)
            } else {
                i.to_string()
            }
        })
        .collect()
}

/// Expands a grid into one question per row.
///
/// All the rows share the column labels of the grid. Each row keeps its own id, which is
/// the id the answers are recorded against.
pub fn flatten_grid(grid: &GridDescriptor) -> Vec<Question> {
    let (kind, options) = match &grid.columns {
        Some(cols) => {
            let kind = match cols.choice_type {
                GridChoiceType::Checkbox => QuestionKind::MultiChoice,
                GridChoiceType::Radio => QuestionKind::SingleChoice,
            };
            (kind, cols.options.clone())
        }
        None => (QuestionKind::SingleChoice, Vec::new()),
    };
    grid.rows
        .iter()
        .map(|row| Question {
            id: row.id.clone(),
            title: format!("{} - {}", grid.title, row.title),
            kind,
            options: options.clone(),
        })
        .collect()
}

/// The canonical question list of a form, in the order of the items.
pub fn canonical_questions(items: &[FormItem]) -> Vec<Question> {
    let mut res: Vec<Question> = Vec::new();
    for item in items.iter() {
        match item {
            FormItem::Question {
                id,
                title,
                descriptor,
            } => {
                res.push(normalize_question(id, title, descriptor));
            }
            FormItem::Grid(grid) => {
                let rows = flatten_grid(grid);
                debug!(
                    "canonical_questions: grid {:?} expanded to {} rows",
                    grid.title,
                    rows.len()
                );
                res.extend(rows);
            }
            FormItem::Other => {}
        }
    }
    res
}
