//! Assessment service: Orchestrates one questionnaire submission.
//!
//! This service coordinates:
//! - Answer validation and encoding
//! - Classifier prediction
//! - Threshold-relative scoring
//! - Optional feature attribution

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{
    score, validate_and_encode, AnswerSheet, Explanation, FeatureVector, Questionnaire,
    ScoreResult, ScoringConfig,
};
use crate::ports::{Classifier, Explainer};
use crate::SubhealthError;

/// Result of a submitted questionnaire.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub features: FeatureVector,
    pub score: ScoreResult,

    /// Attribution chart data, when the explainer succeeded
    pub explanation: Option<Explanation>,

    /// Why attribution is missing, when the explainer failed
    pub analysis_error: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Service running the encode -> predict -> score -> explain pipeline.
///
/// Collaborators are loaded once and shared read-only; each call to
/// [`AssessmentService::assess`] is independent.
pub struct AssessmentService<C, E>
where
    C: Classifier + ?Sized,
    E: Explainer,
{
    questionnaire: Arc<Questionnaire>,
    classifier: Arc<C>,
    explainer: Option<Arc<E>>,
    scoring: ScoringConfig,
    display_names: Vec<String>,
}

impl<C, E> AssessmentService<C, E>
where
    C: Classifier + ?Sized,
    E: Explainer,
{
    /// Create a new assessment service.
    ///
    /// # Errors
    /// Returns `Configuration` if the classifier's features do not follow
    /// the questionnaire's canonical order.
    pub fn new(
        questionnaire: Arc<Questionnaire>,
        classifier: Arc<C>,
        explainer: Option<Arc<E>>,
        scoring: ScoringConfig,
    ) -> Result<Self, SubhealthError> {
        questionnaire.validate()?;
        questionnaire.check_feature_order(classifier.feature_names())?;

        let display_names = questionnaire
            .questions
            .iter()
            .map(|q| q.display_name.clone())
            .collect();

        tracing::info!(
            "Assessment service ready (schema={}, threshold={:.4} [{:?}], amplification={:?}, explain={})",
            questionnaire.version,
            scoring.threshold(),
            scoring.source(),
            scoring.amplification(),
            explainer.is_some()
        );

        Ok(Self {
            questionnaire,
            classifier,
            explainer,
            scoring,
            display_names,
        })
    }

    #[must_use]
    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    /// Validate and encode a sheet without scoring it.
    ///
    /// # Errors
    /// Returns `Validation` with every failing item.
    pub fn encode(&self, answers: &AnswerSheet) -> Result<FeatureVector, SubhealthError> {
        Ok(validate_and_encode(&self.questionnaire, answers)?)
    }

    /// Run the full pipeline for one submission.
    ///
    /// Explainer failures do not fail the assessment; they are reported in
    /// `analysis_error` next to the score.
    ///
    /// # Errors
    /// Returns `Validation` for bad answers, `Prediction` if the classifier
    /// fails, and `Configuration` if its output is not a probability.
    pub fn assess(&self, answers: &AnswerSheet) -> Result<Assessment, SubhealthError> {
        tracing::debug!("Step 1: Validating {} answers...", answers.len());
        let features = self.encode(answers).inspect_err(|e| {
            tracing::debug!("Submission rejected: {e}");
        })?;

        features.check_len(self.classifier.n_features())?;

        tracing::debug!("Step 2: Running classifier...");
        let raw = self
            .classifier
            .predict_proba(&features)
            .map_err(SubhealthError::Prediction)?;

        tracing::debug!("Step 3: Scoring...");
        let score = score(raw, &self.scoring)?;

        let (explanation, analysis_error) = match &self.explainer {
            Some(explainer) => {
                tracing::debug!("Step 4: Computing attributions...");
                match explainer.explain(self.classifier.as_ref(), &features, &self.display_names) {
                    Ok(explanation) => (Some(explanation), None),
                    Err(e) => {
                        tracing::warn!("Attribution failed: {e}");
                        (None, Some(SubhealthError::Prediction(e).to_string()))
                    }
                }
            }
            None => (None, None),
        };

        tracing::info!(
            "Assessment complete: tier={}, rescaled={:.1}%",
            score.risk_tier,
            score.percentage()
        );

        Ok(Assessment {
            features,
            score,
            explanation,
            analysis_error,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RiskTier, ValidationError, NONE_OF_THE_ABOVE};
    use crate::ports::ModelError;

    struct FixedClassifier {
        names: Vec<String>,
        output: Result<f64, ModelError>,
    }

    impl FixedClassifier {
        fn returning(output: Result<f64, ModelError>) -> Self {
            Self {
                names: Questionnaire::lifestyle_v1()
                    .feature_names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
                output,
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            self.output.clone()
        }
    }

    struct FailingExplainer;

    impl Explainer for FailingExplainer {
        fn explain<C: Classifier + ?Sized>(
            &self,
            _classifier: &C,
            _features: &FeatureVector,
            _display_names: &[String],
        ) -> Result<Explanation, ModelError> {
            Err(ModelError::Explanation("backend offline".into()))
        }
    }

    fn reference_sheet() -> AnswerSheet {
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

    fn service(
        output: Result<f64, ModelError>,
        explainer: Option<Arc<FailingExplainer>>,
    ) -> AssessmentService<FixedClassifier, FailingExplainer> {
        AssessmentService::new(
            Arc::new(Questionnaire::lifestyle_v1()),
            Arc::new(FixedClassifier::returning(output)),
            explainer,
            ScoringConfig::default(),
        )
        .expect("Should build service")
    }

    #[test]
    fn test_assess_reference_respondent() {
        let assessment = service(Ok(0.95), None)
            .assess(&reference_sheet())
            .expect("Should assess");

        assert_eq!(
            assessment.features.as_slice(),
            &[30.0, 1.0, 0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 2.0, 0.0]
        );
        assert!((assessment.score.rescaled_probability - 0.5).abs() < 1e-12);
        assert_eq!(assessment.score.risk_tier, RiskTier::Medium);
        assert!(assessment.explanation.is_none());
        assert!(assessment.analysis_error.is_none());
    }

    #[test]
    fn test_validation_errors_block_scoring() {
        let mut sheet = reference_sheet()
            .with_selection("unhealthy_diet", [NONE_OF_THE_ABOVE, "节食"]);
        sheet.remove("hobbies");

        let err = service(Ok(0.5), None).assess(&sheet).expect_err("Should reject");
        match err {
            SubhealthError::Validation(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, ValidationError::ConflictingSelection { .. })));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prediction_failure() {
        let err = service(Err(ModelError::Prediction("boom".into())), None)
            .assess(&reference_sheet())
            .expect_err("Should fail");
        assert!(matches!(err, SubhealthError::Prediction(_)));
        assert!(err.to_string().starts_with("Prediction or analysis failed"));
    }

    #[test]
    fn test_out_of_range_probability() {
        let err = service(Ok(1.5), None)
            .assess(&reference_sheet())
            .expect_err("Should fail");
        assert!(matches!(err, SubhealthError::Configuration(_)));
    }

    #[test]
    fn test_explainer_failure_keeps_score() {
        let assessment = service(Ok(0.2), Some(Arc::new(FailingExplainer)))
            .assess(&reference_sheet())
            .expect("Score survives explainer failure");

        assert_eq!(assessment.score.risk_tier, RiskTier::Low);
        assert!(assessment.explanation.is_none());
        let message = assessment.analysis_error.expect("Should report analysis error");
        assert!(message.contains("backend offline"));
    }

    #[test]
    fn test_rejects_misordered_classifier() {
        let mut classifier = FixedClassifier::returning(Ok(0.5));
        classifier.names.swap(0, 1);
        let result = AssessmentService::<_, FailingExplainer>::new(
            Arc::new(Questionnaire::lifestyle_v1()),
            Arc::new(classifier),
            None,
            ScoringConfig::default(),
        );
        assert!(matches!(result, Err(SubhealthError::Configuration(_))));
    }
}
