//! Collaborator availability, resolved once at the boundary.

/// A collaborator that is either usable or known to be offline.
///
/// Components branch on this instead of probing a client for credentials; an
/// `Unavailable` collaborator is never called.
#[derive(Debug, Clone)]
pub enum Availability<C> {
    Available(C),
    /// Offline, with a human-readable reason (e.g. missing credential).
    Unavailable(String),
}

impl<C> Availability<C> {
    /// Build a collaborator from the API key stored in `var`.
    ///
    /// A missing or blank variable yields `Unavailable` rather than an error.
    pub fn from_env(var: &str, build: impl FnOnce(String) -> C) -> Self {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Availability::Available(build(key)),
            _ => Availability::Unavailable(format!("{} not set", var)),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    pub fn get(&self) -> Option<&C> {
        match self {
            Availability::Available(client) => Some(client),
            Availability::Unavailable(_) => None,
        }
    }

    /// Reason the collaborator is offline, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Availability::Available(_) => None,
            Availability::Unavailable(reason) => Some(reason),
        }
    }
}

impl<C, E: std::fmt::Display> Availability<Result<C, E>> {
    /// A collaborator whose construction failed counts as offline.
    pub fn flatten(self) -> Availability<C> {
        match self {
            Availability::Available(Ok(client)) => Availability::Available(client),
            Availability::Available(Err(e)) => Availability::Unavailable(e.to_string()),
            Availability::Unavailable(reason) => Availability::Unavailable(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_variable_is_unavailable() {
        let avail: Availability<String> =
            Availability::from_env("REGASSIST_TEST_KEY_THAT_IS_NEVER_SET", |k| k);
        assert!(!avail.is_available());
        assert!(avail.get().is_none());
        assert!(avail.unavailable_reason().unwrap().contains("REGASSIST_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_available_exposes_client() {
        let avail = Availability::Available(7u32);
        assert!(avail.is_available());
        assert_eq!(avail.get(), Some(&7));
        assert!(avail.unavailable_reason().is_none());
    }

    #[test]
    fn test_failed_construction_flattens_to_unavailable() {
        let failed: Availability<Result<u32, String>> = Availability::Available(Err("bad client".into()));
        assert_eq!(failed.flatten().unavailable_reason(), Some("bad client"));

        let built: Availability<Result<u32, String>> = Availability::Available(Ok(3));
        assert_eq!(built.flatten().get(), Some(&3));
    }
}
