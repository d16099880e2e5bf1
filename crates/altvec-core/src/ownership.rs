//! Who is responsible for freeing a wrapped buffer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ownership mode of a wrapped native buffer. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    /// Native code keeps the buffer alive and frees it. The binding never deallocates.
    Borrowed,
    /// The binding is the sole owner; the buffer is freed once, when the
    /// host collector finds the wrapping value unreachable.
    Owned,
}

impl Ownership {
    pub fn is_owned(self) -> bool {
        matches!(self, Ownership::Owned)
    }
}

impl From<bool> for Ownership {
    fn from(owner: bool) -> Self {
        if owner {
            Ownership::Owned
        } else {
            Ownership::Borrowed
        }
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ownership::Borrowed => f.write_str("borrowed"),
            Ownership::Owned => f.write_str("owned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_flag_maps_to_mode() {
        assert_eq!(Ownership::from(true), Ownership::Owned);
        assert_eq!(Ownership::from(false), Ownership::Borrowed);
        assert!(Ownership::Owned.is_owned());
        assert!(!Ownership::Borrowed.is_owned());
    }

    #[test]
    fn serializes_lowercase() {
        let s = serde_json::to_string(&Ownership::Owned).unwrap();
        assert_eq!(s, "\"owned\"");
        let back: Ownership = serde_json::from_str("\"borrowed\"").unwrap();
        assert_eq!(back, Ownership::Borrowed);
    }
}
