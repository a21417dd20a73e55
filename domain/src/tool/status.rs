//! Tool run status: a primary run state plus independent overlay flags.
//!
//! The primary state is exclusive; the two overlays are plain booleans that
//! survive every primary transition.
//!
//! ```text
//! Idle ──> Running ──> Done
//!   ▲         │          │
//!   └─────────┴── Error ─┘   (markNotDone returns to Idle from anywhere)
//!
//! overlays: OOT (out of time), OOS (out of scope)
//! ```

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary execution state of a tool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Done,
    Error,
}

impl RunState {
    /// The persisted flag for this state; `Idle` has none.
    pub fn flag(&self) -> Option<StatusFlag> {
        match self {
            RunState::Idle => None,
            RunState::Running => Some(StatusFlag::Running),
            RunState::Done => Some(StatusFlag::Done),
            RunState::Error => Some(StatusFlag::Error),
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
            RunState::Done => write!(f, "done"),
            RunState::Error => write!(f, "error"),
        }
    }
}

/// Persisted status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusFlag {
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "OOT")]
    OutOfTime,
    #[serde(rename = "OOS")]
    OutOfScope,
}

impl StatusFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFlag::Running => "running",
            StatusFlag::Done => "done",
            StatusFlag::Error => "error",
            StatusFlag::OutOfTime => "OOT",
            StatusFlag::OutOfScope => "OOS",
        }
    }

    fn primary(&self) -> Option<RunState> {
        match self {
            StatusFlag::Running => Some(RunState::Running),
            StatusFlag::Done => Some(RunState::Done),
            StatusFlag::Error => Some(RunState::Error),
            StatusFlag::OutOfTime | StatusFlag::OutOfScope => None,
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatusFlag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(StatusFlag::Running),
            "done" => Ok(StatusFlag::Done),
            "error" => Ok(StatusFlag::Error),
            "oot" => Ok(StatusFlag::OutOfTime),
            "oos" => Ok(StatusFlag::OutOfScope),
            _ => Err(DomainError::InvalidStatus(s.to_string())),
        }
    }
}

/// Primary state plus the OOT / OOS overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSet {
    state: RunState,
    out_of_time: bool,
    out_of_scope: bool,
}

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a persisted flag list.
    ///
    /// Repeated flags are tolerated; two different primary flags are not.
    pub fn from_flags(flags: &[StatusFlag]) -> Result<Self, DomainError> {
        let mut set = Self::default();
        let mut primary: Option<StatusFlag> = None;
        for flag in flags {
            match flag.primary() {
                Some(state) => {
                    if let Some(previous) = primary
                        && previous != *flag
                    {
                        return Err(DomainError::ConflictingStatus(
                            previous.to_string(),
                            flag.to_string(),
                        ));
                    }
                    primary = Some(*flag);
                    set.state = state;
                }
                None if *flag == StatusFlag::OutOfTime => set.out_of_time = true,
                None => set.out_of_scope = true,
            }
        }
        Ok(set)
    }

    /// Parse raw flag strings, rejecting anything outside the vocabulary.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, DomainError> {
        let flags = raw
            .iter()
            .map(|s| s.as_ref().parse::<StatusFlag>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_flags(&flags)
    }

    /// Flags in persisted order: primary first, then OOS, then OOT.
    pub fn flags(&self) -> Vec<StatusFlag> {
        let mut flags = Vec::with_capacity(3);
        if let Some(flag) = self.state.flag() {
            flags.push(flag);
        }
        if self.out_of_scope {
            flags.push(StatusFlag::OutOfScope);
        }
        if self.out_of_time {
            flags.push(StatusFlag::OutOfTime);
        }
        flags
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_out_of_time(&self) -> bool {
        self.out_of_time
    }

    pub fn is_out_of_scope(&self) -> bool {
        self.out_of_scope
    }

    /// Replace the primary state; overlays are left alone.
    pub fn set_state(&mut self, state: RunState) {
        self.state = state;
    }

    /// Returns `true` when the flag set changed.
    pub fn set_out_of_time(&mut self) -> bool {
        !std::mem::replace(&mut self.out_of_time, true)
    }

    /// Returns `true` when the flag set changed.
    pub fn set_in_time(&mut self) -> bool {
        std::mem::replace(&mut self.out_of_time, false)
    }

    /// Returns `true` when the flag set changed.
    pub fn set_out_of_scope(&mut self) -> bool {
        !std::mem::replace(&mut self.out_of_scope, true)
    }

    /// Returns `true` when the flag set changed.
    pub fn set_in_scope(&mut self) -> bool {
        std::mem::replace(&mut self.out_of_scope, false)
    }
}

impl fmt::Display for StatusSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags: Vec<&str> = self.flags().iter().map(|flag| flag.as_str()).collect();
        if flags.is_empty() {
            write!(f, "{}", RunState::Idle)
        } else {
            write!(f, "{}", flags.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_vocabulary() {
        let set = StatusSet::parse(&["running", "OOS", "OOT"]).unwrap();
        assert_eq!(set.state(), RunState::Running);
        assert!(set.is_out_of_scope());
        assert!(set.is_out_of_time());
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        let err = StatusSet::parse(&["done", "paused"]).unwrap_err();
        assert_eq!(err, DomainError::InvalidStatus("paused".to_string()));
    }

    #[test]
    fn test_parse_rejects_two_primary_states() {
        let err = StatusSet::parse(&["running", "done"]).unwrap_err();
        assert!(matches!(err, DomainError::ConflictingStatus(_, _)));
    }

    #[test]
    fn test_repeated_flags_are_tolerated() {
        let set = StatusSet::parse(&["OOT", "OOT", "done", "done"]).unwrap();
        assert_eq!(set.flags(), vec![StatusFlag::Done, StatusFlag::OutOfTime]);
    }

    #[test]
    fn test_set_out_of_time_is_idempotent() {
        let mut once = StatusSet::new();
        assert!(once.set_out_of_time());

        let mut twice = StatusSet::new();
        twice.set_out_of_time();
        assert!(!twice.set_out_of_time());

        assert_eq!(once, twice);
        assert_eq!(twice.flags(), vec![StatusFlag::OutOfTime]);
    }

    #[test]
    fn test_in_scope_is_noop_when_already_in_scope() {
        let mut set = StatusSet::new();
        assert!(!set.set_in_scope());
        assert!(set.set_out_of_scope());
        assert!(!set.set_out_of_scope());
        assert!(set.set_in_scope());
        assert!(!set.is_out_of_scope());
    }

    #[test]
    fn test_state_change_keeps_overlays() {
        let mut set = StatusSet::new();
        set.set_out_of_scope();
        set.set_out_of_time();
        set.set_state(RunState::Running);
        set.set_state(RunState::Error);
        assert!(set.is_out_of_scope());
        assert!(set.is_out_of_time());
        assert_eq!(
            set.flags(),
            vec![StatusFlag::Error, StatusFlag::OutOfScope, StatusFlag::OutOfTime]
        );
    }

    #[test]
    fn test_flag_serde_names() {
        assert_eq!(serde_json::to_string(&StatusFlag::OutOfTime).unwrap(), "\"OOT\"");
        assert_eq!(serde_json::to_string(&StatusFlag::Done).unwrap(), "\"done\"");
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusSet::new().to_string(), "idle");
        let set = StatusSet::parse(&["done", "OOT"]).unwrap();
        assert_eq!(set.to_string(), "done,OOT");
    }
}
