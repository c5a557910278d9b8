//! Handler priorities and fan-out ordering.

use serde::{Deserialize, Serialize};

/// Priority of a handler binding.
///
/// Only consulted when the bus runs with [`FanOutOrder::Priority`]; under the
/// default [`FanOutOrder::Registration`] it is carried but ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

impl Priority {
    /// All priorities, highest first.
    pub fn in_order() -> [Priority; 5] {
        [
            Priority::Highest,
            Priority::High,
            Priority::Normal,
            Priority::Low,
            Priority::Lowest,
        ]
    }
}

/// How the bus orders matching bindings for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOutOrder {
    /// Listener registration order, then declaration order within a listener.
    #[default]
    Registration,
    /// Highest priority first; ties keep registration order.
    Priority,
}
