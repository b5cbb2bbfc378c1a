//! Window statistics aggregation.

use pulse_core::{Sample, WindowStats};
use serde::{Deserialize, Serialize};

/// What `recompute` returns for an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyWindowPolicy {
    /// Keep the last stats computed over a non-empty window.
    #[default]
    KeepLast,
    /// Report all-zero stats.
    Zero,
}

/// Recomputes avg/min/max from the full window contents on every call.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    policy: EmptyWindowPolicy,
    last: WindowStats,
}

impl StatsAggregator {
    pub fn new(policy: EmptyWindowPolicy) -> Self {
        Self {
            policy,
            last: WindowStats::default(),
        }
    }

    /// Recompute stats over `samples`.
    pub fn recompute<'a, I>(&mut self, samples: I) -> WindowStats
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        match WindowStats::from_values(samples.into_iter().map(|s| s.value)) {
            Some(stats) => self.last = stats,
            None => {
                if self.policy == EmptyWindowPolicy::Zero {
                    self.last = WindowStats::default();
                }
            }
        }
        self.last
    }

    /// Stats from the most recent `recompute`.
    pub fn current(&self) -> WindowStats {
        self.last
    }

    pub fn policy(&self) -> EmptyWindowPolicy {
        self.policy
    }
}
