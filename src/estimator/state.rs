use serde::{Deserialize, Serialize};

/// Fill level of a session's sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowState {
    /// Fewer than `capacity` samples; no rate is attempted
    Filling { samples: usize, capacity: usize },

    /// Window full; every frame evicts the oldest sample and runs the analysis
    Ready,
}

impl WindowState {
    pub fn from_fill(samples: usize, capacity: usize) -> Self {
        if samples >= capacity {
            Self::Ready
        } else {
            Self::Filling { samples, capacity }
        }
    }

    /// A window only grows until full and never empties while the session lives
    pub fn can_transition_to(&self, target: &WindowState) -> bool {
        use WindowState::*;

        match (self, target) {
            (Filling { samples: a, capacity: c1 }, Filling { samples: b, capacity: c2 }) => {
                c1 == c2 && b >= a
            }
            (Filling { .. }, Ready) | (Ready, Ready) => true,
            (Ready, Filling { .. }) => false,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Filling { .. } => "Filling",
            Self::Ready => "Ready",
        }
    }
}
