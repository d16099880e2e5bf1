//! The opaque internal slot of a host object.
//!
//! The host allocates and owns the object; the class that built it decides
//! what goes in the slot. The host never inspects the contents.

use std::any::Any;
use std::fmt;

#[derive(Default)]
pub struct Slot(Option<Box<dyn Any + Send + Sync>>);

impl Slot {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the contents as `T`. `None` if the slot is empty or holds another type.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut().and_then(|v| v.downcast_mut::<T>())
    }

    /// Remove the contents, leaving the slot empty.
    pub fn take(&mut self) -> Option<Box<dyn Any + Send + Sync>> {
        self.0.take()
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(_) => f.write_str("Slot(<occupied>)"),
            None => f.write_str("Slot(<empty>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access() {
        let mut slot = Slot::new(41u32);
        assert!(slot.get::<String>().is_none());
        *slot.get_mut::<u32>().unwrap() += 1;
        assert_eq!(slot.get::<u32>(), Some(&42));
        assert!(slot.take().is_some());
        assert!(slot.is_empty());
        assert!(slot.get::<u32>().is_none());
    }
}
