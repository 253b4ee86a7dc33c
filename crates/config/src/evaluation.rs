//! Evaluation scoring configuration
//!
//! Weights, rating buckets, the resolution mapping table, and the
//! compliance rule set are configuration, not hard-coded magic: a QA
//! reviewer must be able to audit every score back to these values.

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Weights for the composite final rating; must sum to 1.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatingWeights {
    #[serde(default = "default_third")]
    pub resolution: f32,
    #[serde(default = "default_third")]
    pub compliance: f32,
    #[serde(default = "default_third")]
    pub satisfaction: f32,
}

fn default_third() -> f32 {
    1.0 / 3.0
}

impl Default for RatingWeights {
    fn default() -> Self {
        Self {
            resolution: default_third(),
            compliance: default_third(),
            satisfaction: default_third(),
        }
    }
}

/// One verdict bucket: ratings at or above `min` (and below the next
/// higher bucket) carry `label`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingBucket {
    pub min: f32,
    pub label: String,
}

/// One row of the resolution mapping table: the customer's final-segment
/// sentiment confidence at or above `min_confidence` maps to `negative`
/// or `non_negative` depending on the ending label
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResolutionBucket {
    pub min_confidence: f32,
    pub negative: u8,
    pub non_negative: u8,
}

/// Compliance rule kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceRuleKind {
    /// The pattern must appear in the agent's transcript
    RequiredPhrase,
    /// The pattern must not appear in the agent's transcript
    ProhibitedPhrase,
}

/// One compliance rule: a regex checked against the agent's cleaned text,
/// contributing a fixed point deduction from the baseline when violated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRule {
    /// Rule identifier (e.g. "RECORDING_DISCLOSURE")
    pub id: String,
    pub kind: ComplianceRuleKind,
    /// Regex pattern (case-insensitivity goes in the pattern itself)
    pub pattern: String,
    /// Points deducted when the rule is violated
    pub points: u8,
}

/// Evaluation scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Final rating weights
    #[serde(default)]
    pub weights: RatingWeights,

    /// Verdict buckets, highest threshold first
    #[serde(default = "default_buckets")]
    pub buckets: Vec<RatingBucket>,

    /// Resolution mapping table, highest confidence threshold first
    #[serde(default = "default_resolution_table")]
    pub resolution: Vec<ResolutionBucket>,

    /// Compliance rules checked over the agent's transcript
    #[serde(default = "default_compliance_rules")]
    pub compliance_rules: Vec<ComplianceRule>,

    /// How strongly the customer's Negative tonal value drags the
    /// satisfaction score down from the baseline of 10
    #[serde(default = "default_satisfaction_negative_weight")]
    pub satisfaction_negative_weight: f32,
}

fn default_buckets() -> Vec<RatingBucket> {
    vec![
        RatingBucket {
            min: 8.0,
            label: "Excellent".to_string(),
        },
        RatingBucket {
            min: 6.0,
            label: "Satisfactory".to_string(),
        },
        RatingBucket {
            min: 4.0,
            label: "Needs Improvement".to_string(),
        },
        RatingBucket {
            min: 1.0,
            label: "Poor".to_string(),
        },
    ]
}

fn default_resolution_table() -> Vec<ResolutionBucket> {
    vec![
        ResolutionBucket {
            min_confidence: 0.75,
            negative: 2,
            non_negative: 9,
        },
        ResolutionBucket {
            min_confidence: 0.4,
            negative: 3,
            non_negative: 8,
        },
        ResolutionBucket {
            min_confidence: 0.0,
            negative: 5,
            non_negative: 7,
        },
    ]
}

fn default_compliance_rules() -> Vec<ComplianceRule> {
    vec![
        ComplianceRule {
            id: "RECORDING_DISCLOSURE".to_string(),
            kind: ComplianceRuleKind::RequiredPhrase,
            pattern: r"(?i)\b(call (is|may be) (being )?recorded|recorded line|quality and training)\b"
                .to_string(),
            points: 2,
        },
        ComplianceRule {
            id: "OPENING_GREETING".to_string(),
            kind: ComplianceRuleKind::RequiredPhrase,
            pattern: r"(?i)\b(hello|hi|good (morning|afternoon|evening)|thank you for calling|how (can|may) i help)\b"
                .to_string(),
            points: 1,
        },
        ComplianceRule {
            id: "PROHIBITED_LANGUAGE".to_string(),
            kind: ComplianceRuleKind::ProhibitedPhrase,
            pattern: r"(?i)\b(shut up|stupid|idiot|useless|scam)\b".to_string(),
            points: 3,
        },
    ]
}

fn default_satisfaction_negative_weight() -> f32 {
    9.0
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            weights: RatingWeights::default(),
            buckets: default_buckets(),
            resolution: default_resolution_table(),
            compliance_rules: default_compliance_rules(),
            satisfaction_negative_weight: default_satisfaction_negative_weight(),
        }
    }
}

impl EvaluationConfig {
    /// Validate the scoring configuration; run once at startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_weights()?;
        self.validate_buckets()?;
        self.validate_resolution()?;
        self.validate_rules()?;

        if !(0.0..=9.0).contains(&self.satisfaction_negative_weight) {
            return Err(ConfigError::InvalidValue {
                field: "evaluation.satisfaction_negative_weight".to_string(),
                message: format!(
                    "Must be between 0.0 and 9.0, got {}",
                    self.satisfaction_negative_weight
                ),
            });
        }

        Ok(())
    }

    fn validate_weights(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        for (field, value) in [
            ("evaluation.weights.resolution", w.resolution),
            ("evaluation.weights.compliance", w.compliance),
            ("evaluation.weights.satisfaction", w.satisfaction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be between 0.0 and 1.0, got {}", value),
                });
            }
        }

        let sum = w.resolution + w.compliance + w.satisfaction;
        if (sum - 1.0).abs() > 1e-3 {
            return Err(ConfigError::InvalidValue {
                field: "evaluation.weights".to_string(),
                message: format!("Weights must sum to 1.0, got {}", sum),
            });
        }
        Ok(())
    }

    /// Buckets must be total and non-overlapping across [1, 10]:
    /// strictly descending thresholds with the lowest at 1.0 or below.
    fn validate_buckets(&self) -> Result<(), ConfigError> {
        if self.buckets.is_empty() {
            return Err(ConfigError::MissingField("evaluation.buckets".to_string()));
        }

        for pair in self.buckets.windows(2) {
            if pair[1].min >= pair[0].min {
                return Err(ConfigError::InvalidValue {
                    field: "evaluation.buckets".to_string(),
                    message: format!(
                        "Thresholds must strictly descend; '{}' ({}) does not sit below '{}' ({})",
                        pair[1].label, pair[1].min, pair[0].label, pair[0].min
                    ),
                });
            }
        }

        let lowest = self.buckets.last().unwrap();
        if lowest.min > 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "evaluation.buckets".to_string(),
                message: format!(
                    "Lowest bucket '{}' starts at {}, leaving ratings below it unlabeled",
                    lowest.label, lowest.min
                ),
            });
        }

        if self.buckets.iter().any(|b| b.label.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "evaluation.buckets".to_string(),
                message: "Bucket labels cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    fn validate_resolution(&self) -> Result<(), ConfigError> {
        if self.resolution.is_empty() {
            return Err(ConfigError::MissingField("evaluation.resolution".to_string()));
        }

        for pair in self.resolution.windows(2) {
            if pair[1].min_confidence >= pair[0].min_confidence {
                return Err(ConfigError::InvalidValue {
                    field: "evaluation.resolution".to_string(),
                    message: "Confidence thresholds must strictly descend".to_string(),
                });
            }
        }

        let lowest = self.resolution.last().unwrap();
        if lowest.min_confidence > 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "evaluation.resolution".to_string(),
                message: "Lowest confidence bucket must start at 0.0".to_string(),
            });
        }

        for bucket in &self.resolution {
            if !(1..=10).contains(&bucket.negative) || !(1..=10).contains(&bucket.non_negative) {
                return Err(ConfigError::InvalidValue {
                    field: "evaluation.resolution".to_string(),
                    message: "Resolution scores must be in [1, 10]".to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_rules(&self) -> Result<(), ConfigError> {
        for rule in &self.compliance_rules {
            if rule.id.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "evaluation.compliance_rules".to_string(),
                    message: "Rule id cannot be empty".to_string(),
                });
            }
            if rule.points == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("evaluation.compliance_rules.{}", rule.id),
                    message: "Rule must deduct at least 1 point".to_string(),
                });
            }
            regex::Regex::new(&rule.pattern).map_err(|e| ConfigError::InvalidValue {
                field: format!("evaluation.compliance_rules.{}", rule.id),
                message: format!("Invalid pattern: {}", e),
            })?;
        }
        Ok(())
    }

    /// Verdict label for a final rating; thresholds are matched highest
    /// first, so the first bucket at or below the rating wins
    pub fn verdict_for(&self, rating: f32) -> &str {
        self.buckets
            .iter()
            .find(|b| rating >= b.min)
            .map(|b| b.label.as_str())
            // Sub-1.0 inputs fall through to the lowest bucket
            .unwrap_or_else(|| self.buckets.last().map(|b| b.label.as_str()).unwrap_or(""))
    }

    /// Resolution sub-score for the customer's ending sentiment
    pub fn resolution_for(&self, ending_negative: bool, confidence: f32) -> u8 {
        let bucket = self
            .resolution
            .iter()
            .find(|b| confidence >= b.min_confidence)
            .or_else(|| self.resolution.last());

        match bucket {
            Some(b) if ending_negative => b.negative,
            Some(b) => b.non_negative,
            None => 5,
        }
    }
}
