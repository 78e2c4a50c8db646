//! Provisioning workflow states

use std::fmt;

/// Class of a provisioning failure, mapped to an exit status by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Malformed input: ports, monitor URL, routes, env entries, limits
    InvalidSyntax,
    /// Well-formed input the platform refuses, or a rejected image reference
    BusinessRule,
    /// Image metadata unavailable or unusable
    BadImage,
    /// The app runner rejected the creation request
    CreationFailed,
    /// Instances did not become ready in time; the app keeps starting
    TimedOut,
    /// Unexpected environment or lookup failure
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::InvalidSyntax => "invalid syntax",
            FailureKind::BusinessRule => "command failed",
            FailureKind::BadImage => "bad image",
            FailureKind::CreationFailed => "creation failed",
            FailureKind::TimedOut => "timed out",
            FailureKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisioningState {
    Start,
    MetadataFetched,
    ConfigDerived,
    RouteResolved,
    AppCreated,
    InstancesReady,
    DescriptorPublished,
    Done,
    Failed(FailureKind),
}

impl ProvisioningState {
    /// Successor on the happy path, `None` for terminal states
    pub fn next(self) -> Option<Self> {
        use ProvisioningState::*;
        match self {
            Start => Some(MetadataFetched),
            MetadataFetched => Some(ConfigDerived),
            ConfigDerived => Some(RouteResolved),
            RouteResolved => Some(AppCreated),
            AppCreated => Some(InstancesReady),
            InstancesReady => Some(DescriptorPublished),
            DescriptorPublished => Some(Done),
            Done | Failed(_) => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisioningState::Start => f.write_str("start"),
            ProvisioningState::MetadataFetched => f.write_str("metadata-fetched"),
            ProvisioningState::ConfigDerived => f.write_str("config-derived"),
            ProvisioningState::RouteResolved => f.write_str("route-resolved"),
            ProvisioningState::AppCreated => f.write_str("app-created"),
            ProvisioningState::InstancesReady => f.write_str("instances-ready"),
            ProvisioningState::DescriptorPublished => f.write_str("descriptor-published"),
            ProvisioningState::Done => f.write_str("done"),
            ProvisioningState::Failed(kind) => write!(f, "failed ({})", kind),
        }
    }
}

/// Tracks the states a single run has passed through
#[derive(Debug, Clone)]
pub struct StateTracker {
    history: Vec<ProvisioningState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            history: vec![ProvisioningState::Start],
        }
    }

    pub fn current(&self) -> ProvisioningState {
        *self
            .history
            .last()
            .unwrap_or(&ProvisioningState::Start)
    }

    /// Moves to the next happy-path state and returns it
    pub fn advance(&mut self) -> ProvisioningState {
        let current = self.current();
        let next = current.next();
        debug_assert!(next.is_some(), "cannot advance from {}", current);
        let next = next.unwrap_or(current);
        if next != current {
            self.history.push(next);
        }
        next
    }

    pub fn fail(&mut self, kind: FailureKind) -> ProvisioningState {
        let failed = ProvisioningState::Failed(kind);
        if !self.current().is_terminal() {
            self.history.push(failed);
        }
        failed
    }

    pub fn history(&self) -> &[ProvisioningState] {
        &self.history
    }

    pub fn into_history(self) -> Vec<ProvisioningState> {
        self.history
    }
}
