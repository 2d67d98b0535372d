use serde::{Deserialize, Serialize};

/// Pipeline lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Uninitialized,
    /// Plan, window and histories built; computation task parked
    Configured,
    Running,
    /// Computation task suspended; acquisition may continue
    Stopped,
}

impl PipelineState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, target),
            (Uninitialized, Configured) |
            (Configured, Running) |
            (Running, Stopped) |
            (Stopped, Running)
        )
    }

    /// Get human-readable state name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Configured => "Configured",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::Uninitialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineState::*;

    #[test]
    fn test_valid_transitions() {
        assert!(Uninitialized.can_transition_to(&Configured));
        assert!(Configured.can_transition_to(&Running));
        assert!(Running.can_transition_to(&Stopped));
        assert!(Stopped.can_transition_to(&Running));
    }

    #[test]
    fn test_no_teardown_or_skips() {
        for state in [Configured, Running, Stopped] {
            assert!(!state.can_transition_to(&Uninitialized));
        }
        assert!(!Uninitialized.can_transition_to(&Running));
        assert!(!Configured.can_transition_to(&Stopped));
        assert!(!Running.can_transition_to(&Configured));
        assert!(!Running.can_transition_to(&Running));
    }

    #[test]
    fn test_default_is_uninitialized() {
        assert_eq!(PipelineState::default(), Uninitialized);
        assert_eq!(Uninitialized.name(), "Uninitialized");
    }
}
