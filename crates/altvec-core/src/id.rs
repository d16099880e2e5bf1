//! Strongly-typed identifiers shared by the host and the binding.
//!
//! Both are issued in increasing order starting at 1; a host never reissues
//! an id, so a stale `ValueId` can always be told apart from a live one.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! new_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(v: u64) -> Self {
                Self(v)
            }
            pub const fn get(self) -> u64 {
                self.0
            }
            /// The id handed out after this one. Ids are never reused.
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

new_id!(ClassId);
new_id!(ValueId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_advance_and_display_with_their_kind() {
        let v = ValueId::new(7);
        assert_eq!(v.next().get(), 8);
        assert!(v < v.next());
        assert_eq!(v.to_string(), "ValueId(7)");
        assert_eq!(ClassId::new(1).to_string(), "ClassId(1)");
    }
}
