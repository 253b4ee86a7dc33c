//! Speaker role resolution
//!
//! Maps opaque diarization speaker ids to the semantic roles Agent and
//! Customer. The default heuristic follows call-center convention: the
//! agent opens the call, so the speaker of the first segment is Agent.

use call_qa_core::{AnalysisError, Result, RoleAssignment, Segment, SpeakerRole};
use std::collections::HashMap;

/// Resolves diarized speakers into the two canonical roles
#[derive(Debug, Clone, Default)]
pub struct SpeakerRoleResolver {
    /// Deployment-level overrides: diarizer id → canonical role.
    /// Labels are validated against the role set at config load.
    overrides: HashMap<String, SpeakerRole>,
}

impl SpeakerRoleResolver {
    pub fn new(overrides: HashMap<String, SpeakerRole>) -> Self {
        Self { overrides }
    }

    /// Build a resolver from the raw config map, rejecting non-canonical
    /// labels
    pub fn from_labels(labels: &HashMap<String, String>) -> Result<Self> {
        let mut overrides = HashMap::new();
        for (speaker_id, label) in labels {
            overrides.insert(speaker_id.clone(), SpeakerRole::parse(label)?);
        }
        Ok(Self::new(overrides))
    }

    /// Resolve every speaker id in the segment set to exactly one role.
    ///
    /// - Two speakers: first-segment speaker is Agent, the other Customer.
    /// - More than two: speakers beyond the first two (by order of first
    ///   appearance) merge into Customer. The canonical report supports
    ///   exactly two parties; this is a documented lossy policy.
    /// - Fewer than two: the lone speaker is Agent; the absent role is
    ///   filled downstream with neutral defaults.
    ///
    /// Fails with `AmbiguousSpeakers` only when overrides ask for two
    /// different roles for the same speaker id.
    pub fn resolve(&self, segments: &[Segment]) -> Result<RoleAssignment> {
        // Distinct speakers in order of first appearance
        let mut speakers: Vec<&str> = Vec::new();
        for segment in segments {
            if !speakers.contains(&segment.speaker_id.as_str()) {
                speakers.push(&segment.speaker_id);
            }
        }

        self.check_override_conflicts()?;

        let mut roles: HashMap<String, SpeakerRole> = HashMap::new();

        // Overrides bind first
        for speaker in &speakers {
            if let Some(role) = self.overrides.get(*speaker) {
                roles.insert((*speaker).to_string(), *role);
            }
        }

        // Heuristic fills the rest: opener is Agent, next distinct speaker
        // is Customer, everyone after that merges into Customer
        let agent_taken = roles.values().any(|r| *r == SpeakerRole::Agent);
        let mut next_unassigned_role = if agent_taken {
            SpeakerRole::Customer
        } else {
            SpeakerRole::Agent
        };

        for speaker in &speakers {
            if roles.contains_key(*speaker) {
                continue;
            }
            roles.insert((*speaker).to_string(), next_unassigned_role);
            next_unassigned_role = SpeakerRole::Customer;
        }

        if speakers.len() > 2 {
            tracing::warn!(
                speakers = speakers.len(),
                "More than two diarized speakers; extras merged into Customer"
            );
        }

        Ok(RoleAssignment::new(roles, speakers.len()))
    }

    /// Overrides conflict when two entries naming the same diarizer token
    /// (compared case-insensitively) request different canonical roles
    fn check_override_conflicts(&self) -> Result<()> {
        let mut seen: HashMap<String, SpeakerRole> = HashMap::new();
        for (speaker_id, role) in &self.overrides {
            let key = speaker_id.to_ascii_lowercase();
            if let Some(existing) = seen.get(&key) {
                if existing != role {
                    return Err(AnalysisError::AmbiguousSpeakers(format!(
                        "speaker '{}' is mapped to both {} and {}",
                        speaker_id, existing, role
                    )));
                }
            }
            seen.insert(key, *role);
        }
        Ok(())
    }
}
