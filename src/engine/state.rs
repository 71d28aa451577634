use serde::{Deserialize, Serialize};

/// Lifecycle of a background loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    /// Never started, or joined after stopping
    Idle,

    /// Iterating
    Running,

    /// Asked to stop; finishing its current iteration
    Stopping,

    /// Task has exited
    Stopped,
}

impl LoopState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &LoopState) -> bool {
        use LoopState::*;

        matches!(
            (self, target),
            (Idle, Running) |

            (Running, Stopping) |
            // Loop ended on its own (disconnect, panic)
            (Running, Stopped) |

            (Stopping, Stopped) |

            (Stopped, Running) |
            (Stopped, Idle)
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
            Self::Stopped => "Stopped",
        }
    }
}

impl Default for LoopState {
    fn default() -> Self {
        Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(LoopState::Idle.can_transition_to(&LoopState::Running));
        assert!(LoopState::Running.can_transition_to(&LoopState::Stopping));
        assert!(LoopState::Stopping.can_transition_to(&LoopState::Stopped));
        assert!(LoopState::Stopped.can_transition_to(&LoopState::Running));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!LoopState::Idle.can_transition_to(&LoopState::Stopping));
        assert!(!LoopState::Stopping.can_transition_to(&LoopState::Running));
        assert!(!LoopState::Running.can_transition_to(&LoopState::Idle));
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(LoopState::default().name(), "Idle");
    }
}
