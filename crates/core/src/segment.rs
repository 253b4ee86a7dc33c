//! Diarized transcript segments and speaker role types

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One diarized utterance as emitted by the transcription capability.
///
/// `speaker_id` is the diarizer's opaque token (e.g. "A", "SPEAKER_00");
/// role resolution maps it to a semantic role. Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
    /// Opaque diarization speaker token
    pub speaker_id: String,
    /// Utterance text
    pub text: String,
}

impl Segment {
    pub fn new(
        start: f64,
        end: f64,
        speaker_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            speaker_id: speaker_id.into(),
            text: text.into(),
        }
    }
}

/// The two semantic parties of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerRole {
    Agent,
    Customer,
}

impl SpeakerRole {
    pub fn label(&self) -> &'static str {
        match self {
            SpeakerRole::Agent => "Agent",
            SpeakerRole::Customer => "Customer",
        }
    }

    /// Parse a canonical role label. Anything outside the fixed role set
    /// is rejected; role overrides are validated through this.
    pub fn parse(label: &str) -> Result<Self> {
        match label {
            "Agent" => Ok(SpeakerRole::Agent),
            "Customer" => Ok(SpeakerRole::Customer),
            other => Err(AnalysisError::Config(format!(
                "unknown speaker role '{}', expected 'Agent' or 'Customer'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Report keys: the two roles plus the whole-call aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKey {
    Agent,
    Customer,
    Overall,
}

impl RoleKey {
    pub const ALL: [RoleKey; 3] = [RoleKey::Agent, RoleKey::Customer, RoleKey::Overall];

    pub fn label(&self) -> &'static str {
        match self {
            RoleKey::Agent => "Agent",
            RoleKey::Customer => "Customer",
            RoleKey::Overall => "Overall",
        }
    }
}

impl From<SpeakerRole> for RoleKey {
    fn from(role: SpeakerRole) -> Self {
        match role {
            SpeakerRole::Agent => RoleKey::Agent,
            SpeakerRole::Customer => RoleKey::Customer,
        }
    }
}

/// Mapping from diarized speaker ids to semantic roles.
///
/// Derived once per call and immutable thereafter. Every speaker id that
/// appears in the segment set resolves to exactly one role.
#[derive(Debug, Clone, Default)]
pub struct RoleAssignment {
    roles: HashMap<String, SpeakerRole>,
    /// Distinct diarized speakers observed before any merge
    pub num_speakers: usize,
}

impl RoleAssignment {
    pub fn new(roles: HashMap<String, SpeakerRole>, num_speakers: usize) -> Self {
        Self { roles, num_speakers }
    }

    pub fn role_of(&self, speaker_id: &str) -> Option<SpeakerRole> {
        self.roles.get(speaker_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Speaker-count hints forwarded to the diarizer.
///
/// Both bounds live in [1, 10] with `min <= max`; validated at the
/// request boundary before any work is done.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpeakerHints {
    pub min_speakers: u8,
    pub max_speakers: u8,
}

impl Default for SpeakerHints {
    fn default() -> Self {
        Self {
            min_speakers: 1,
            max_speakers: 2,
        }
    }
}

impl SpeakerHints {
    pub fn new(min_speakers: u8, max_speakers: u8) -> Result<Self> {
        let hints = Self {
            min_speakers,
            max_speakers,
        };
        hints.validate()?;
        Ok(hints)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.min_speakers) || !(1..=10).contains(&self.max_speakers) {
            return Err(AnalysisError::Config(format!(
                "speaker hints must be in [1, 10], got min={} max={}",
                self.min_speakers, self.max_speakers
            )));
        }
        if self.min_speakers > self.max_speakers {
            return Err(AnalysisError::Config(format!(
                "min_speakers ({}) exceeds max_speakers ({})",
                self.min_speakers, self.max_speakers
            )));
        }
        Ok(())
    }
}

/// Output of the transcription capability: ordered raw segments plus the
/// detected language. An empty segment list is a valid result (silence).
#[derive(Debug, Clone, Default)]
pub struct Transcription {
    pub segments: Vec<Segment>,
    pub language: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(SpeakerRole::parse("Agent").unwrap(), SpeakerRole::Agent);
        assert_eq!(SpeakerRole::parse("Customer").unwrap(), SpeakerRole::Customer);
        assert!(SpeakerRole::parse("agent").is_err());
        assert!(SpeakerRole::parse("IVR").is_err());
    }

    #[test]
    fn test_hint_bounds() {
        assert!(SpeakerHints::new(1, 2).is_ok());
        assert!(SpeakerHints::new(0, 2).is_err());
        assert!(SpeakerHints::new(1, 11).is_err());
        assert!(SpeakerHints::new(3, 2).is_err());
    }

    #[test]
    fn test_hint_defaults() {
        let hints = SpeakerHints::default();
        assert_eq!(hints.min_speakers, 1);
        assert_eq!(hints.max_speakers, 2);
        assert!(hints.validate().is_ok());
    }

    #[test]
    fn test_assignment_lookup() {
        let mut roles = HashMap::new();
        roles.insert("A".to_string(), SpeakerRole::Agent);
        roles.insert("B".to_string(), SpeakerRole::Customer);
        let assignment = RoleAssignment::new(roles, 2);

        assert_eq!(assignment.role_of("A"), Some(SpeakerRole::Agent));
        assert_eq!(assignment.role_of("C"), None);
        assert_eq!(assignment.num_speakers, 2);
    }
}
