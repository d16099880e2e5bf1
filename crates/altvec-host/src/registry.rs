//! Process-wide class registry.
//!
//! Classes are registered once (typically at library load) and never change
//! afterwards. Every `Runtime` in the process shares the same table, so a
//! `ClassId` is meaningful across runtimes.

use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;

use altvec_core::{AltRealMethods, ClassId};

use crate::error::{HostError, Result};

/// Registered class: identity, names, and its capability table.
#[derive(Clone, Copy)]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: &'static str,
    pub namespace: &'static str,
    pub methods: &'static dyn AltRealMethods,
}

impl std::fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

static CLASSES: Lazy<RwLock<Vec<ClassInfo>>> = Lazy::new(|| RwLock::new(Vec::new()));

/// Register an alternative-representation real class.
///
/// Fails if `(name, namespace)` is already taken.
pub fn register_altreal_class(
    name: &'static str,
    namespace: &'static str,
    methods: &'static dyn AltRealMethods,
) -> Result<ClassId> {
    let mut classes = CLASSES.write().unwrap_or_else(PoisonError::into_inner);
    if classes
        .iter()
        .any(|c| c.name == name && c.namespace == namespace)
    {
        return Err(HostError::DuplicateClass { name, namespace });
    }

    // Ids start at 1 so a zeroed id never aliases a real class.
    let id = ClassId::new(classes.len() as u64 + 1);
    classes.push(ClassInfo {
        id,
        name,
        namespace,
        methods,
    });

    #[cfg(feature = "tracing")]
    tracing::debug!(%id, name, namespace, "registered altreal class");

    Ok(id)
}

/// Look up a registered class.
pub fn class_info(id: ClassId) -> Option<ClassInfo> {
    let classes = CLASSES.read().unwrap_or_else(PoisonError::into_inner);
    let idx = usize::try_from(id.get()).ok()?.checked_sub(1)?;
    classes.get(idx).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::tests::SliceClass;

    static REG_TEST_CLASS: SliceClass = SliceClass;

    #[test]
    fn register_and_lookup() {
        let id = register_altreal_class("reg_lookup", "host-tests", &REG_TEST_CLASS).unwrap();
        let info = class_info(id).expect("class registered");
        assert_eq!(info.name, "reg_lookup");
        assert_eq!(info.namespace, "host-tests");
        assert_eq!(info.id, id);
    }

    #[test]
    fn duplicate_name_in_namespace_is_rejected() {
        register_altreal_class("reg_dup", "host-tests", &REG_TEST_CLASS).unwrap();
        let err = register_altreal_class("reg_dup", "host-tests", &REG_TEST_CLASS).unwrap_err();
        assert!(matches!(err, HostError::DuplicateClass { .. }));

        // Same name in another namespace is a different class.
        register_altreal_class("reg_dup", "other-tests", &REG_TEST_CLASS).unwrap();
    }

    #[test]
    fn unknown_ids_resolve_to_none() {
        assert!(class_info(ClassId::new(0)).is_none());
        assert!(class_info(ClassId::new(u64::MAX)).is_none());
    }
}
