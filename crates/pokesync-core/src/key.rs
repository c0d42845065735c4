//! Identity keys for stored objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid object key '{0}': expected <namespace>/<name>")]
    Malformed(String),
    #[error("Object name must not be empty")]
    EmptyName,
}

/// Identity of a stored object: `(namespace, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Returns a key for another object in the same namespace.
    #[must_use]
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::new(self.namespace.clone(), name)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ObjectKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, name) = s
            .split_once('/')
            .ok_or_else(|| KeyError::Malformed(s.to_string()))?;
        if name.is_empty() {
            return Err(KeyError::EmptyName);
        }
        if namespace.is_empty() || name.contains('/') {
            return Err(KeyError::Malformed(s.to_string()));
        }
        Ok(Self::new(namespace, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let key = ObjectKey::new("default", "pikachu-sync");
        assert_eq!(key.to_string(), "default/pikachu-sync");
        assert_eq!("default/pikachu-sync".parse::<ObjectKey>(), Ok(key));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            "no-namespace".parse::<ObjectKey>(),
            Err(KeyError::Malformed(_))
        ));
        assert_eq!("default/".parse::<ObjectKey>(), Err(KeyError::EmptyName));
        assert!("a/b/c".parse::<ObjectKey>().is_err());
    }

    #[test]
    fn test_sibling_keeps_namespace() {
        let key = ObjectKey::new("team-a", "spec");
        assert_eq!(key.sibling("doc"), ObjectKey::new("team-a", "doc"));
    }
}
