//! Emission policies: whether the downstream generation step runs for a key.

use serde::{Deserialize, Serialize};

use crate::entry::{ChangeReason, Entry};

/// Decides whether generated output must be produced for an entry.
pub trait EmitPolicy: Send + Sync {
    /// Returns `true` if the generation step should run for `entry`.
    fn should_emit(&self, entry: &Entry) -> bool;
}

/// Built-in emission policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmitMode {
    /// Emit for every key. The change flags are carried as metadata only.
    #[default]
    Always,
    /// Emit only for keys that are changed, unevaluated, or seen for the
    /// first time.
    ///
    /// First-seen keys always emit so that a cold cache never suppresses
    /// output, even under [`FirstRunPolicy::Unchanged`](crate::FirstRunPolicy::Unchanged).
    ChangedOnly,
}

impl EmitPolicy for EmitMode {
    fn should_emit(&self, entry: &Entry) -> bool {
        match self {
            Self::Always => true,
            Self::ChangedOnly => match entry.changed() {
                None => true,
                Some(changed) => changed || entry.reason() == Some(ChangeReason::FirstSeen),
            },
        }
    }
}

impl<F> EmitPolicy for F
where
    F: Fn(&Entry) -> bool + Send + Sync,
{
    fn should_emit(&self, entry: &Entry) -> bool {
        self(entry)
    }
}
