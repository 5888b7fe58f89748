//! Questionnaire schema for the sub-health lifestyle screening.
//!
//! The item table is declared once, as data, and is independent of the
//! encoding rules in `encoder`. Item order is the canonical feature order
//! the classifier was trained on.

use serde::{Deserialize, Serialize};

use super::ConfigurationError;

/// Version tag of the built-in questionnaire table.
pub const SCHEMA_VERSION: &str = "lifestyle-v1";

/// Label of the "none of the above" option shared by multi-choice items.
pub const NONE_OF_THE_ABOVE: &str = "以上都没有";

/// How an item is answered and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free numeric entry (age)
    Numeric,
    /// Exactly one option, encoded through the option table
    SingleChoice,
    /// Any non-exclusive selection encodes as 1
    MultiChoiceExclusive,
    /// Any non-exclusive selection encodes as 1, regardless of count
    MultiChoiceAdditive,
    /// Non-exclusive selections are bucketed by count
    MultiChoiceBinned,
}

impl QuestionKind {
    /// Whether answers are a set of labels.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            Self::MultiChoiceExclusive | Self::MultiChoiceAdditive | Self::MultiChoiceBinned
        )
    }
}

/// One selectable option and its encoded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: f64,
}

/// Static description of one questionnaire item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Stable identifier, also the model's feature name
    pub name: String,

    /// Prompt shown to the respondent
    pub prompt: String,

    /// English label used in attribution charts
    pub display_name: String,

    pub kind: QuestionKind,

    /// Ordered option table (empty for numeric items)
    #[serde(default)]
    pub options: Vec<ChoiceOption>,

    /// The option that may not be combined with any other
    #[serde(default)]
    pub exclusive_label: Option<String>,
}

impl QuestionSpec {
    /// Look up an option by label.
    #[must_use]
    pub fn option(&self, label: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.label == label)
    }

    /// Whether `label` is the exclusive option of this item.
    #[must_use]
    pub fn is_exclusive(&self, label: &str) -> bool {
        self.exclusive_label.as_deref() == Some(label)
    }
}

/// An ordered, versioned set of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub version: String,
    pub questions: Vec<QuestionSpec>,
}

struct ItemDef {
    name: &'static str,
    prompt: &'static str,
    display_name: &'static str,
    kind: QuestionKind,
    options: &'static [(&'static str, f64)],
    exclusive: Option<&'static str>,
}

const LIFESTYLE_V1: [ItemDef; 10] = [
    ItemDef {
        name: "age",
        prompt: "年龄",
        display_name: "Age",
        kind: QuestionKind::Numeric,
        options: &[],
        exclusive: None,
    },
    ItemDef {
        name: "household_registration",
        prompt: "户籍类型",
        display_name: "Household Registration Type",
        kind: QuestionKind::SingleChoice,
        options: &[
            ("农村", 0.0),
            ("城镇", 1.0),
            ("三、四线城市", 2.0),
            ("一、二线城市", 3.0),
        ],
        exclusive: None,
    },
    ItemDef {
        name: "residential_comfort",
        prompt: "居住环境舒适度",
        display_name: "Residential Environment Comfort",
        kind: QuestionKind::MultiChoiceBinned,
        options: &[
            ("绿化好", 1.0),
            ("空气质量好", 1.0),
            ("噪音小", 1.0),
            ("住房精致", 1.0),
            ("居住宽敞", 1.0),
            ("邻里和睦", 1.0),
            (NONE_OF_THE_ABOVE, 0.0),
        ],
        exclusive: Some(NONE_OF_THE_ABOVE),
    },
    ItemDef {
        name: "hobbies",
        prompt: "兴趣爱好",
        display_name: "Hobbies",
        kind: QuestionKind::SingleChoice,
        options: &[
            ("没有", 2.0),
            ("一般（拥有1 - 3个兴趣爱好）", 1.0),
            ("广泛（拥有大于3个兴趣爱好）", 0.0),
        ],
        exclusive: None,
    },
    ItemDef {
        name: "personality",
        prompt: "性格类型",
        display_name: "Personality Type",
        kind: QuestionKind::SingleChoice,
        options: &[
            ("急躁好胜", 1.0),
            ("忍气吞声", 1.0),
            ("焦虑易怒", 1.0),
            ("成熟稳重", 0.0),
        ],
        exclusive: None,
    },
    ItemDef {
        name: "physical_exercise",
        prompt: "体育锻炼",
        display_name: "Physical Exercise",
        kind: QuestionKind::SingleChoice,
        options: &[("几乎不", 0.0), ("2～4天/周", 1.0), ("5～7天/周", 2.0)],
        exclusive: None,
    },
    ItemDef {
        name: "sleep_duration",
        prompt: "睡眠持续时长",
        display_name: "Sleep Duration",
        kind: QuestionKind::SingleChoice,
        options: &[("小于7小时/天", 0.0), ("大于7小时/天", 1.0)],
        exclusive: None,
    },
    ItemDef {
        name: "unhealthy_diet",
        prompt: "不良饮食习惯",
        display_name: "Unhealthy Eating Habits",
        kind: QuestionKind::MultiChoiceExclusive,
        options: &[
            ("饮食时间不规律", 1.0),
            ("节食", 1.0),
            ("暴饮暴食", 1.0),
            ("偏食挑食", 1.0),
            ("口味偏咸", 1.0),
            ("以零食替代正餐", 1.0),
            (NONE_OF_THE_ABOVE, 0.0),
        ],
        exclusive: Some(NONE_OF_THE_ABOVE),
    },
    ItemDef {
        name: "internet_use",
        prompt: "网络使用（非工作学习需要）",
        display_name: "Internet Use (Non-Work/Study)",
        kind: QuestionKind::SingleChoice,
        options: &[
            ("小于1小时/天", 2.0),
            ("1～4小时/天", 1.0),
            ("大于4小时/天", 0.0),
        ],
        exclusive: None,
    },
    ItemDef {
        name: "life_events",
        prompt: "近期重大生活事件（近半年）",
        display_name: "Major Life Events in Recent Half-Year",
        kind: QuestionKind::MultiChoiceAdditive,
        options: &[
            ("退休", 1.0),
            ("爱情或婚姻出现问题", 1.0),
            ("与人不和", 1.0),
            ("身边人病重或去世", 1.0),
            ("自己生病已痊愈", 1.0),
            ("丢失贵重财务", 1.0),
            ("出现经济问题", 1.0),
            ("陷入法律纠纷", 1.0),
            ("发生事故意外", 1.0),
            ("子女教育问题", 1.0),
            (NONE_OF_THE_ABOVE, 0.0),
        ],
        exclusive: Some(NONE_OF_THE_ABOVE),
    },
];

impl Questionnaire {
    /// The built-in lifestyle questionnaire (10 items).
    #[must_use]
    pub fn lifestyle_v1() -> Self {
        let questions = LIFESTYLE_V1
            .iter()
            .map(|item| QuestionSpec {
                name: item.name.to_string(),
                prompt: item.prompt.to_string(),
                display_name: item.display_name.to_string(),
                kind: item.kind,
                options: item
                    .options
                    .iter()
                    .map(|(label, value)| ChoiceOption {
                        label: (*label).to_string(),
                        value: *value,
                    })
                    .collect(),
                exclusive_label: item.exclusive.map(str::to_string),
            })
            .collect();

        Self {
            version: SCHEMA_VERSION.to_string(),
            questions,
        }
    }

    /// Number of items (and features).
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up a question by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&QuestionSpec> {
        self.questions.iter().find(|q| q.name == name)
    }

    /// Feature names in canonical order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<&str> {
        self.questions.iter().map(|q| q.name.as_str()).collect()
    }

    /// Check that the feature names of a model match this questionnaire,
    /// both in length and order.
    ///
    /// # Errors
    /// Returns the first mismatch found.
    pub fn check_feature_order<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<(), ConfigurationError> {
        if names.len() != self.len() {
            return Err(ConfigurationError::FeatureCountMismatch {
                expected: self.len(),
                actual: names.len(),
            });
        }

        for (position, (question, name)) in self.questions.iter().zip(names).enumerate() {
            if question.name != name.as_ref() {
                return Err(ConfigurationError::FeatureOrderMismatch {
                    position,
                    expected: question.name.clone(),
                    actual: name.as_ref().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validate the structural invariants of the schema.
    ///
    /// # Errors
    /// Returns `ConfigurationError::InvalidSchema` describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |msg: String| Err(ConfigurationError::InvalidSchema(msg));

        if self.questions.is_empty() {
            return invalid("questionnaire has no questions".into());
        }

        let mut seen = std::collections::BTreeSet::new();
        for q in &self.questions {
            if !seen.insert(q.name.as_str()) {
                return invalid(format!("duplicate question name {}", q.name));
            }

            let mut labels = std::collections::BTreeSet::new();
            for option in &q.options {
                if !labels.insert(option.label.as_str()) {
                    return invalid(format!("{}: duplicate option {}", q.name, option.label));
                }
                if !option.value.is_finite() {
                    return invalid(format!(
                        "{}: option {} has no finite value",
                        q.name, option.label
                    ));
                }
            }

            match q.kind {
                QuestionKind::Numeric => {
                    if !q.options.is_empty() || q.exclusive_label.is_some() {
                        return invalid(format!("{}: numeric items take no options", q.name));
                    }
                }
                QuestionKind::SingleChoice => {
                    if q.options.is_empty() {
                        return invalid(format!("{}: single-choice item without options", q.name));
                    }
                    if q.exclusive_label.is_some() {
                        return invalid(format!(
                            "{}: single-choice item cannot be exclusive",
                            q.name
                        ));
                    }
                }
                _ => {
                    let Some(exclusive) = q.exclusive_label.as_deref() else {
                        return invalid(format!(
                            "{}: multi-choice item needs an exclusive option",
                            q.name
                        ));
                    };
                    if q.option(exclusive).is_none() {
                        return invalid(format!(
                            "{}: exclusive option {exclusive} is not among the options",
                            q.name
                        ));
                    }
                    if q.options.len() < 2 {
                        return invalid(format!(
                            "{}: multi-choice item needs selectable options",
                            q.name
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self::lifestyle_v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifestyle_v1_is_valid() {
        let q = Questionnaire::lifestyle_v1();
        assert_eq!(q.len(), 10);
        q.validate().expect("Built-in schema should validate");
    }

    #[test]
    fn test_canonical_order() {
        let q = Questionnaire::lifestyle_v1();
        assert_eq!(
            q.feature_names(),
            vec![
                "age",
                "household_registration",
                "residential_comfort",
                "hobbies",
                "personality",
                "physical_exercise",
                "sleep_duration",
                "unhealthy_diet",
                "internet_use",
                "life_events",
            ]
        );
    }

    #[test]
    fn test_check_feature_order() {
        let q = Questionnaire::lifestyle_v1();
        let names: Vec<String> = q.feature_names().iter().map(|s| s.to_string()).collect();
        assert!(q.check_feature_order(&names).is_ok());

        let mut swapped = names.clone();
        swapped.swap(1, 2);
        assert!(matches!(
            q.check_feature_order(&swapped),
            Err(ConfigurationError::FeatureOrderMismatch { position: 1, .. })
        ));

        assert!(matches!(
            q.check_feature_order(&names[..9]),
            Err(ConfigurationError::FeatureCountMismatch {
                expected: 10,
                actual: 9
            })
        ));
    }

    #[test]
    fn test_validate_rejects_missing_exclusive_option() {
        let mut q = Questionnaire::lifestyle_v1();
        let diet = q
            .questions
            .iter_mut()
            .find(|q| q.name == "unhealthy_diet")
            .expect("diet item");
        diet.options.retain(|o| o.label != NONE_OF_THE_ABOVE);
        assert!(matches!(q.validate(), Err(ConfigurationError::InvalidSchema(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_labels() {
        let mut q = Questionnaire::lifestyle_v1();
        q.questions[1].options.push(ChoiceOption {
            label: "城镇".into(),
            value: 4.0,
        });
        assert!(q.validate().is_err());
    }
}
