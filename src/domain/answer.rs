//! Raw questionnaire answers, as collected from the presentation layer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One respondent's answer to one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawAnswer {
    /// Numeric entry (age)
    Number(f64),
    /// A single selected label
    Choice(String),
    /// A set of selected labels (no duplicates by construction)
    Selection(BTreeSet<String>),
}

impl RawAnswer {
    /// Build a selection from any iterator of labels.
    pub fn selection<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Selection(labels.into_iter().map(Into::into).collect())
    }

    /// Short description of the answer shape, for error messages.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Choice(_) => "single choice",
            Self::Selection(_) => "selection",
        }
    }
}

/// All answers of one session, keyed by question name.
///
/// Ephemeral: built per submission and dropped after scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerSheet {
    answers: BTreeMap<String, RawAnswer>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer, replacing any previous one.
    pub fn insert(&mut self, question: impl Into<String>, answer: RawAnswer) {
        self.answers.insert(question.into(), answer);
    }

    /// Builder-style numeric answer.
    #[must_use]
    pub fn with_number(mut self, question: impl Into<String>, value: f64) -> Self {
        self.insert(question, RawAnswer::Number(value));
        self
    }

    /// Builder-style single-choice answer.
    #[must_use]
    pub fn with_choice(mut self, question: impl Into<String>, label: impl Into<String>) -> Self {
        self.insert(question, RawAnswer::Choice(label.into()));
        self
    }

    /// Builder-style multi-choice answer.
    #[must_use]
    pub fn with_selection<I, S>(mut self, question: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(question, RawAnswer::selection(labels));
        self
    }

    #[must_use]
    pub fn get(&self, question: &str) -> Option<&RawAnswer> {
        self.answers.get(question)
    }

    pub fn remove(&mut self, question: &str) -> Option<RawAnswer> {
        self.answers.remove(question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_deduplicates() {
        let answer = RawAnswer::selection(["节食", "节食", "偏食挑食"]);
        match answer {
            RawAnswer::Selection(labels) => assert_eq!(labels.len(), 2),
            other => panic!("unexpected answer {other:?}"),
        }
    }

    #[test]
    fn test_sheet_builder_replaces() {
        let sheet = AnswerSheet::new()
            .with_number("age", 30.0)
            .with_number("age", 31.0)
            .with_choice("sleep_duration", "大于7小时/天");

        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.get("age"), Some(&RawAnswer::Number(31.0)));
    }
}
