//! Answer encoder: raw answers to numeric features.
//!
//! Encoding is a pure function of the question and the answer. Validation
//! failures are returned as values; the caller re-prompts and must not score.

use std::collections::BTreeSet;

use super::{AnswerSheet, FeatureVector, QuestionKind, QuestionSpec, Questionnaire, RawAnswer};

/// A recoverable problem with one answer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{question}: no option selected")]
    MissingSelection { question: String },

    #[error("{question}: \"{exclusive}\" cannot be combined with other options")]
    ConflictingSelection { question: String, exclusive: String },

    #[error("{question}: select at least one option or \"{exclusive}\"")]
    EmptySelection { question: String, exclusive: String },

    #[error("{question}: unknown option \"{label}\"")]
    UnknownOption { question: String, label: String },

    #[error("{question}: expected a {expected} answer, got a {actual}")]
    AnswerKindMismatch {
        question: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{question}: {value} is not a valid number")]
    InvalidNumber { question: String, value: f64 },
}

impl ValidationError {
    /// Name of the question the error belongs to.
    #[must_use]
    pub fn question(&self) -> &str {
        match self {
            Self::MissingSelection { question }
            | Self::ConflictingSelection { question, .. }
            | Self::EmptySelection { question, .. }
            | Self::UnknownOption { question, .. }
            | Self::AnswerKindMismatch { question, .. }
            | Self::InvalidNumber { question, .. } => question,
        }
    }
}

fn expected_shape(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::Numeric => "number",
        QuestionKind::SingleChoice => "single choice",
        _ => "selection",
    }
}

/// Encode one answer into one feature value.
///
/// # Errors
/// Returns a `ValidationError` when the answer violates the item's rules.
pub fn encode(spec: &QuestionSpec, answer: &RawAnswer) -> Result<f64, ValidationError> {
    match (spec.kind, answer) {
        (QuestionKind::Numeric, RawAnswer::Number(value)) => {
            if value.is_finite() {
                Ok(*value)
            } else {
                Err(ValidationError::InvalidNumber {
                    question: spec.name.clone(),
                    value: *value,
                })
            }
        }
        (QuestionKind::SingleChoice, RawAnswer::Choice(label)) => spec
            .option(label)
            .map(|o| o.value)
            .ok_or_else(|| ValidationError::UnknownOption {
                question: spec.name.clone(),
                label: label.clone(),
            }),
        (kind, RawAnswer::Selection(labels)) if kind.is_multi() => encode_selection(spec, labels),
        (kind, other) => Err(ValidationError::AnswerKindMismatch {
            question: spec.name.clone(),
            expected: expected_shape(kind),
            actual: other.shape(),
        }),
    }
}

fn encode_selection(
    spec: &QuestionSpec,
    labels: &BTreeSet<String>,
) -> Result<f64, ValidationError> {
    if let Some(unknown) = labels.iter().find(|l| spec.option(l).is_none()) {
        return Err(ValidationError::UnknownOption {
            question: spec.name.clone(),
            label: unknown.clone(),
        });
    }

    let exclusive = spec.exclusive_label.clone().unwrap_or_default();
    let has_exclusive = labels.iter().any(|l| spec.is_exclusive(l));

    if has_exclusive && labels.len() > 1 {
        return Err(ValidationError::ConflictingSelection {
            question: spec.name.clone(),
            exclusive,
        });
    }
    if has_exclusive {
        return Ok(0.0);
    }
    if labels.is_empty() {
        return Err(ValidationError::EmptySelection {
            question: spec.name.clone(),
            exclusive,
        });
    }

    let value = match spec.kind {
        QuestionKind::MultiChoiceBinned => match labels.len() {
            1 => 0.0,
            2..=4 => 1.0,
            _ => 2.0,
        },
        _ => 1.0,
    };
    Ok(value)
}

/// Encode a full answer sheet in canonical order.
///
/// Every item is checked; all validation errors are returned together so the
/// presentation layer can flag each offending item at once.
///
/// # Errors
/// Returns every `ValidationError` found, in questionnaire order.
pub fn validate_and_encode(
    questionnaire: &Questionnaire,
    answers: &AnswerSheet,
) -> Result<FeatureVector, Vec<ValidationError>> {
    let mut values = Vec::with_capacity(questionnaire.len());
    let mut errors = Vec::new();

    for spec in &questionnaire.questions {
        let encoded = match answers.get(&spec.name) {
            Some(answer) => encode(spec, answer),
            None if spec.kind.is_multi() => Err(ValidationError::EmptySelection {
                question: spec.name.clone(),
                exclusive: spec.exclusive_label.clone().unwrap_or_default(),
            }),
            None => Err(ValidationError::MissingSelection {
                question: spec.name.clone(),
            }),
        };

        match encoded {
            Ok(value) => values.push(value),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(FeatureVector::new(values))
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NONE_OF_THE_ABOVE;

    fn questionnaire() -> Questionnaire {
        Questionnaire::lifestyle_v1()
    }

    fn spec(name: &str) -> QuestionSpec {
        questionnaire().get(name).expect("question exists").clone()
    }

    fn sample_sheet() -> AnswerSheet {
        AnswerSheet::new()
            .with_number("age", 30.0)
            .with_choice("household_registration", "城镇")
            .with_selection("residential_comfort", ["绿化好"])
            .with_choice("hobbies", "一般（拥有1 - 3个兴趣爱好）")
            .with_choice("personality", "成熟稳重")
            .with_choice("physical_exercise", "5～7天/周")
            .with_choice("sleep_duration", "大于7小时/天")
            .with_selection("unhealthy_diet", [NONE_OF_THE_ABOVE])
            .with_choice("internet_use", "小于1小时/天")
            .with_selection("life_events", [NONE_OF_THE_ABOVE])
    }

    #[test]
    fn test_single_choice_is_total() {
        for q in questionnaire()
            .questions
            .iter()
            .filter(|q| q.kind == QuestionKind::SingleChoice)
        {
            for option in &q.options {
                let value = encode(q, &RawAnswer::Choice(option.label.clone()))
                    .expect("Every declared label should encode");
                assert!((value - option.value).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn test_personality_collapses_three_labels() {
        let q = spec("personality");
        let values: Vec<f64> = ["急躁好胜", "忍气吞声", "焦虑易怒", "成熟稳重"]
            .iter()
            .map(|l| encode(&q, &RawAnswer::Choice((*l).into())).expect("encodes"))
            .collect();
        assert_eq!(values, vec![1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unknown_single_choice_label() {
        let q = spec("sleep_duration");
        let err = encode(&q, &RawAnswer::Choice("12小时".into())).expect_err("Should reject");
        assert!(matches!(err, ValidationError::UnknownOption { .. }));
    }

    #[test]
    fn test_diet_exclusive_rules() {
        let q = spec("unhealthy_diet");

        assert_eq!(encode(&q, &RawAnswer::selection([NONE_OF_THE_ABOVE])), Ok(0.0));
        assert_eq!(encode(&q, &RawAnswer::selection(["节食"])), Ok(1.0));
        assert_eq!(
            encode(
                &q,
                &RawAnswer::selection(["节食", "暴饮暴食", "偏食挑食", "口味偏咸"])
            ),
            Ok(1.0)
        );
        assert!(matches!(
            encode(&q, &RawAnswer::selection(["节食", NONE_OF_THE_ABOVE])),
            Err(ValidationError::ConflictingSelection { .. })
        ));
        assert!(matches!(
            encode(&q, &RawAnswer::selection(Vec::<String>::new())),
            Err(ValidationError::EmptySelection { .. })
        ));
    }

    #[test]
    fn test_residential_comfort_bins() {
        let q = spec("residential_comfort");
        let labels = ["绿化好", "空气质量好", "噪音小", "住房精致", "居住宽敞", "邻里和睦"];
        let expected = [0.0, 1.0, 1.0, 1.0, 2.0, 2.0];

        for (count, want) in (1..=labels.len()).zip(expected) {
            let answer = RawAnswer::selection(labels[..count].iter().copied());
            assert_eq!(encode(&q, &answer), Ok(want), "count {count}");
        }

        assert_eq!(encode(&q, &RawAnswer::selection([NONE_OF_THE_ABOVE])), Ok(0.0));
        assert!(matches!(
            encode(&q, &RawAnswer::selection(["噪音小", NONE_OF_THE_ABOVE])),
            Err(ValidationError::ConflictingSelection { .. })
        ));
    }

    #[test]
    fn test_life_events_count_insensitive() {
        let q = spec("life_events");
        assert_eq!(encode(&q, &RawAnswer::selection(["退休"])), Ok(1.0));
        assert_eq!(
            encode(&q, &RawAnswer::selection(["退休", "与人不和", "出现经济问题"])),
            Ok(1.0)
        );
        assert_eq!(encode(&q, &RawAnswer::selection([NONE_OF_THE_ABOVE])), Ok(0.0));
    }

    #[test]
    fn test_age_accepts_any_finite_number() {
        let q = spec("age");
        assert_eq!(encode(&q, &RawAnswer::Number(30.0)), Ok(30.0));
        assert_eq!(encode(&q, &RawAnswer::Number(-4.0)), Ok(-4.0));
        assert!(matches!(
            encode(&q, &RawAnswer::Number(f64::NAN)),
            Err(ValidationError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let q = spec("age");
        let err = encode(&q, &RawAnswer::Choice("30".into())).expect_err("Should reject");
        assert!(matches!(err, ValidationError::AnswerKindMismatch { expected: "number", .. }));
    }

    #[test]
    fn test_validate_and_encode_reference_respondent() {
        let v = validate_and_encode(&questionnaire(), &sample_sheet()).expect("Should encode");
        assert_eq!(
            v.as_slice(),
            &[30.0, 1.0, 0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 2.0, 0.0]
        );
    }

    #[test]
    fn test_validate_and_encode_collects_all_errors() {
        let mut sheet = sample_sheet()
            .with_selection("unhealthy_diet", ["节食", NONE_OF_THE_ABOVE])
            .with_selection("life_events", Vec::<String>::new());
        sheet.remove("hobbies");

        let errors = validate_and_encode(&questionnaire(), &sheet).expect_err("Should fail");
        let questions: Vec<&str> = errors.iter().map(ValidationError::question).collect();
        assert_eq!(questions, vec!["hobbies", "unhealthy_diet", "life_events"]);
        assert!(matches!(errors[0], ValidationError::MissingSelection { .. }));
        assert!(matches!(errors[1], ValidationError::ConflictingSelection { .. }));
        assert!(matches!(errors[2], ValidationError::EmptySelection { .. }));
    }

    #[test]
    fn test_missing_multi_choice_is_empty_selection() {
        let mut sheet = sample_sheet();
        sheet.remove("residential_comfort");
        let errors = validate_and_encode(&questionnaire(), &sheet).expect_err("Should fail");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::EmptySelection { .. }));
    }
}
