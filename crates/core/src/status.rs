//! Job status enums and their lifecycle state machines.
//!
//! Both job kinds share the same shape: an initial state, a single
//! in-progress state, a success terminal and a failure terminal. Transitions
//! are expressed as data so callers can validate a move before writing it.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::JobId;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Upper-case wire name, e.g. `"RUNNING"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Parse an upper-case wire name.
            pub fn parse(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Prompt migration lifecycle status.
    MigrationStatus {
        Draft => "DRAFT",
        Running => "RUNNING",
        Completed => "COMPLETED",
        /// Only reachable through an injected completion failure.
        Failed => "FAILED",
    }
}

define_status_enum! {
    /// Prompt evaluation lifecycle status.
    EvaluationStatus {
        Queued => "QUEUED",
        Running => "RUNNING",
        Done => "DONE",
        /// Only reachable through an injected completion failure.
        Error => "ERROR",
    }
}

/// Shared view of a job status enum used by the lifecycle checks.
pub trait LifecycleStatus: Copy + PartialEq + std::fmt::Display + 'static {
    /// Statuses reachable in one step from `self`.
    fn valid_transitions(self) -> &'static [Self];

    /// Upper-case wire name.
    fn name(self) -> &'static str;

    /// `true` when no further transition is defined.
    fn is_terminal(self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Check whether a transition from `self` to `to` is valid.
    fn can_transition(self, to: Self) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl LifecycleStatus for MigrationStatus {
    fn valid_transitions(self) -> &'static [Self] {
        match self {
            MigrationStatus::Draft => &[MigrationStatus::Running],
            MigrationStatus::Running => &[MigrationStatus::Completed, MigrationStatus::Failed],
            MigrationStatus::Completed | MigrationStatus::Failed => &[],
        }
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

impl LifecycleStatus for EvaluationStatus {
    fn valid_transitions(self) -> &'static [Self] {
        match self {
            EvaluationStatus::Queued => &[EvaluationStatus::Running],
            EvaluationStatus::Running => &[EvaluationStatus::Done, EvaluationStatus::Error],
            EvaluationStatus::Done | EvaluationStatus::Error => &[],
        }
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

/// Validate a state transition, returning [`CoreError::InvalidTransition`]
/// for moves the state machine does not allow.
pub fn validate_transition<S: LifecycleStatus>(
    entity: &'static str,
    id: JobId,
    from: S,
    to: S,
) -> Result<(), CoreError> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity,
            id,
            from: from.name(),
            to: to.name(),
        })
    }
}
