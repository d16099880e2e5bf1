//! Collector callback for owned buffers.

use altvec_host::Object;

use crate::handle::resolve_mut;

/// Free the owned buffer behind a `native_doubles` value.
///
/// Registered once per owned value at construction. A second invocation
/// finds the handle already released and does nothing, so a collector that
/// calls it twice cannot double-free. Returns `true` only on the call that
/// actually freed the buffer.
pub fn finalize(obj: &mut Object) -> bool {
    let Some(handle) = obj
        .as_altrep_mut()
        .and_then(|a| resolve_mut(a.data1_mut()))
    else {
        #[cfg(feature = "tracing")]
        tracing::warn!("finalizer called on a value without a buffer handle");
        return false;
    };

    // SAFETY: the deallocator was paired with this allocation when the value
    // was constructed (`wrap` is unsafe for exactly that reason).
    let freed = unsafe { handle.release() };

    #[cfg(feature = "tracing")]
    {
        if freed {
            tracing::debug!(len = handle.len(), "released owned buffer");
        } else {
            tracing::warn!(len = handle.len(), "finalizer called on an already released buffer");
        }
    }

    freed
}
