//! Run identity: the correlation key for everything a run produces.

use std::fmt;

/// Identifies one benchmark run: which worker instance is executing which
/// benchmark project.
///
/// Constructed once, before the benchmark process starts, and never mutated
/// afterwards. Every status report and result bundle the run emits carries
/// this identity, and the collector keys progress state and the storage path
/// off it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunIdentity {
    instance_name: String,
    project_name: String,
}

impl RunIdentity {
    /// Creates a new run identity.
    #[must_use]
    pub fn new(instance_name: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            project_name: project_name.into(),
        }
    }

    /// The human-assigned worker instance name.
    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// The benchmark project being executed.
    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.instance_name, self.project_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_accessors() {
        let identity = RunIdentity::new("worker-1", "Intro");
        assert_eq!(identity.instance_name(), "worker-1");
        assert_eq!(identity.project_name(), "Intro");
        assert_eq!(identity.to_string(), "worker-1/Intro");
    }
}
