//! The managed heap, its collector, and generic vector dispatch.
//!
//! Concurrency: dispatch takes the heap's read lock, so reads of the same
//! value from several threads proceed in parallel. Allocation, rooting and
//! collection take the write lock. Finalizers run while the write lock is
//! held and must not call back into the runtime.
//!
//! Finalizers must not panic either. A panic unwinds out of the collection:
//! the remaining finalizers of that value are dropped unrun and the rest of
//! the dead set stays in the heap until the next collection.

use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use altvec_core::{AltvecConfig, ClassId, Inspection, RuntimeConfig, Slot, ValueId};

use crate::error::{HostError, Result};
use crate::object::{AltrepObject, Cell, Object, PendingFinalizer, Value};
use crate::protect::RootGuard;
use crate::registry::{class_info, ClassInfo};
use crate::tracking::{GcSnapshot, GcStats};

/// Outcome of one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GcReport {
    pub swept: usize,
    pub finalized: usize,
}

struct Heap {
    cells: HashMap<ValueId, Cell>,
    /// Root counts. Protect guards and preserve calls share the same count.
    roots: HashMap<ValueId, usize>,
    next_id: ValueId,
    allocs_since_gc: usize,
}

impl Heap {
    fn new() -> Self {
        Self {
            cells: HashMap::new(),
            roots: HashMap::new(),
            next_id: ValueId::new(1),
            allocs_since_gc: 0,
        }
    }

    fn next_value_id(&mut self) -> ValueId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    fn cell(&self, id: ValueId) -> Result<&Cell> {
        self.cells.get(&id).ok_or(HostError::Collected(id))
    }

    fn cell_mut(&mut self, id: ValueId) -> Result<&mut Cell> {
        self.cells.get_mut(&id).ok_or(HostError::Collected(id))
    }
}

pub struct Runtime {
    cfg: RuntimeConfig,
    heap: RwLock<Heap>,
    stats: GcStats,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Runtime {
    pub fn new(cfg: RuntimeConfig) -> Self {
        Self {
            cfg,
            heap: RwLock::new(Heap::new()),
            stats: GcStats::new(),
        }
    }

    /// Build a runtime from the full workspace config, validating it first.
    pub fn from_config(cfg: &AltvecConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self::new(cfg.runtime_config()))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.cfg
    }

    fn read(&self) -> RwLockReadGuard<'_, Heap> {
        self.heap.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Heap> {
        self.heap.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ----- allocation -----

    /// Allocate a managed real vector.
    pub fn alloc_real(&self, data: Vec<f64>) -> Value {
        self.alloc(Object::Real(data), Vec::new())
    }

    /// Allocate an object of a registered class whose internal slot is `data1`.
    pub fn new_altrep(&self, class: ClassId, data1: Slot) -> Result<Value> {
        if class_info(class).is_none() {
            return Err(HostError::UnknownClass(class));
        }
        Ok(self.alloc(Object::AltReal(AltrepObject::new(class, data1)), Vec::new()))
    }

    /// Like [`new_altrep`](Self::new_altrep), with `callback` registered as
    /// the value's finalizer under the same write lock that inserts it.
    ///
    /// No collection on another thread can observe the value without its
    /// finalizer, so a hook that releases `data1` always runs.
    pub fn new_altrep_with_finalizer<F>(
        &self,
        class: ClassId,
        data1: Slot,
        on_exit: bool,
        callback: F,
    ) -> Result<Value>
    where
        F: FnOnce(&mut Object) + Send + Sync + 'static,
    {
        if class_info(class).is_none() {
            return Err(HostError::UnknownClass(class));
        }
        let pending = PendingFinalizer {
            on_exit,
            callback: Box::new(callback),
        };
        Ok(self.alloc(
            Object::AltReal(AltrepObject::new(class, data1)),
            vec![pending],
        ))
    }

    fn alloc(&self, object: Object, finalizers: Vec<PendingFinalizer>) -> Value {
        let mut heap = self.write();

        if self.cfg.gc_interval > 0 && heap.allocs_since_gc >= self.cfg.gc_interval {
            self.collect_locked(&mut heap);
        }

        let id = heap.next_value_id();
        heap.allocs_since_gc += 1;
        let mut cell = Cell::new(object);
        cell.finalizers = finalizers;
        heap.cells.insert(id, cell);
        self.stats.record_live(heap.cells.len());
        Value(id)
    }

    // ----- finalizers -----

    /// Register `callback` to run once, after `value` becomes unreachable.
    ///
    /// With `on_exit`, the callback also runs when the runtime is dropped
    /// while the value is still alive (if the runtime is configured to
    /// finalize on exit).
    pub fn register_finalizer<F>(&self, value: Value, on_exit: bool, callback: F) -> Result<()>
    where
        F: FnOnce(&mut Object) + Send + Sync + 'static,
    {
        let mut heap = self.write();
        heap.cell_mut(value.0)?.finalizers.push(PendingFinalizer {
            on_exit,
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Run and consume `value`'s pending finalizers without sweeping it.
    ///
    /// The object stays in the heap in whatever state its finalizers left it,
    /// which lets callers observe use-after-finalization behavior.
    pub fn run_finalizer_now(&self, value: Value) -> Result<usize> {
        let mut heap = self.write();
        let n = heap.cell_mut(value.0)?.run_finalizers(|_| true);
        self.stats.record_finalized(n);
        Ok(n)
    }

    // ----- roots -----

    /// Root `value` until the returned guard is dropped.
    pub fn protect(&self, value: Value) -> Result<RootGuard<'_>> {
        self.root(value)?;
        Ok(RootGuard::new(self, value))
    }

    /// Root `value` until a matching [`release`](Self::release).
    pub fn preserve(&self, value: Value) -> Result<()> {
        self.root(value)
    }

    /// Drop one root from `value`. Releasing an unrooted value is a no-op.
    pub fn release(&self, value: Value) {
        self.unroot(value);
    }

    fn root(&self, value: Value) -> Result<()> {
        let mut heap = self.write();
        heap.cell(value.0)?;
        *heap.roots.entry(value.0).or_insert(0) += 1;
        Ok(())
    }

    pub(crate) fn unroot(&self, value: Value) {
        let mut heap = self.write();
        if let Some(count) = heap.roots.get_mut(&value.0) {
            *count -= 1;
            if *count == 0 {
                heap.roots.remove(&value.0);
            }
        }
    }

    pub fn is_live(&self, value: Value) -> bool {
        self.read().cells.contains_key(&value.0)
    }

    pub fn live_count(&self) -> usize {
        self.read().cells.len()
    }

    // ----- collection -----

    /// Sweep every value not reachable from a root, running its finalizers first.
    pub fn collect(&self) -> GcReport {
        let mut heap = self.write();
        self.collect_locked(&mut heap)
    }

    fn collect_locked(&self, heap: &mut Heap) -> GcReport {
        let mut dead: Vec<ValueId> = heap
            .cells
            .keys()
            .filter(|id| !heap.roots.contains_key(*id))
            .copied()
            .collect();
        dead.sort_unstable();

        let mut report = GcReport::default();
        for id in dead {
            if let Some(mut cell) = heap.cells.remove(&id) {
                report.finalized += cell.run_finalizers(|_| true);
                report.swept += 1;
            }
        }
        heap.allocs_since_gc = 0;
        self.stats.record_collection(report.swept, report.finalized);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            swept = report.swept,
            finalized = report.finalized,
            live = heap.cells.len(),
            "collection finished"
        );

        report
    }

    pub fn stats(&self) -> GcSnapshot {
        self.stats.snapshot()
    }

    // ----- dispatch -----

    pub(crate) fn with_object<R>(
        &self,
        value: Value,
        f: impl FnOnce(&Object) -> Result<R>,
    ) -> Result<R> {
        let heap = self.read();
        f(&heap.cell(value.0)?.object)
    }

    /// Class of an alternative-representation value, `None` for managed vectors.
    pub fn class_of(&self, value: Value) -> Result<Option<ClassId>> {
        self.with_object(value, |obj| Ok(obj.as_altrep().map(AltrepObject::class)))
    }

    pub fn length(&self, value: Value) -> Result<usize> {
        self.with_object(value, |obj| match obj {
            Object::Real(v) => Ok(v.len()),
            Object::AltReal(a) => Ok(methods(a)?.methods.length(a.data1())),
        })
    }

    /// Element at `index`. The dispatch layer owns the bounds check; classes
    /// are only ever called with a valid index.
    pub fn real_elt(&self, value: Value, index: usize) -> Result<f64> {
        self.with_object(value, |obj| match obj {
            Object::Real(v) => v.get(index).copied().ok_or(HostError::IndexOutOfBounds {
                index,
                length: v.len(),
            }),
            Object::AltReal(a) => {
                let class = methods(a)?;
                let length = class.methods.length(a.data1());
                if index >= length {
                    return Err(HostError::IndexOutOfBounds { index, length });
                }
                // SAFETY: index < length was checked just above.
                Ok(unsafe { class.methods.elt(a.data1(), index) })
            }
        })
    }

    /// Copy up to `count` elements from `start` into `out[..count]`; returns
    /// how many were actually written.
    ///
    /// # Panics
    ///
    /// If `out.len() < count`.
    pub fn get_region(
        &self,
        value: Value,
        start: usize,
        count: usize,
        out: &mut [f64],
    ) -> Result<usize> {
        let out = &mut out[..count];
        self.with_object(value, |obj| object_region(obj, start, out))
    }

    /// Live address of the value's contiguous storage, without copying.
    pub fn dataptr_or_null(&self, value: Value) -> Result<Option<NonNull<f64>>> {
        self.with_object(value, |obj| match obj {
            Object::Real(v) => Ok(NonNull::new(v.as_ptr() as *mut f64)),
            Object::AltReal(a) => Ok(methods(a)?.methods.dataptr_or_null(a.data1())),
        })
    }

    /// Human-readable description of any value.
    pub fn inspect(&self, value: Value) -> Result<String> {
        self.with_object(value, |obj| match obj {
            Object::Real(v) => Ok(format!("real (len={})", v.len())),
            Object::AltReal(a) => Ok(methods(a)?.methods.inspect(a.data1()).to_string()),
        })
    }

    /// Structured inspection of an alternative-representation value.
    pub fn inspect_altrep(&self, value: Value) -> Result<Inspection> {
        self.with_object(value, |obj| match obj {
            Object::Real(_) => Err(HostError::NotAltrep(value.0)),
            Object::AltReal(a) => Ok(methods(a)?.methods.inspect(a.data1())),
        })
    }

    /// Explicit managed copy. This is the only operation that copies the
    /// contents of a class-backed vector into the host heap.
    pub fn duplicate(&self, value: Value) -> Result<Value> {
        let data = self.with_object(value, |obj| match obj {
            Object::Real(v) => Ok(v.clone()),
            Object::AltReal(a) => {
                let class = methods(a)?;
                let mut data = vec![0.0; class.methods.length(a.data1())];
                let n = class.methods.get_region(a.data1(), 0, &mut data);
                data.truncate(n);
                Ok(data)
            }
        })?;
        Ok(self.alloc_real(data))
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if !self.cfg.finalize_on_exit {
            return;
        }
        let heap = self.heap.get_mut().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<ValueId> = heap.cells.keys().copied().collect();
        ids.sort_unstable();

        let mut finalized = 0;
        for id in ids {
            if let Some(cell) = heap.cells.get_mut(&id) {
                finalized += cell.run_finalizers(|f| f.on_exit);
            }
        }
        self.stats.record_finalized(finalized);

        #[cfg(feature = "tracing")]
        tracing::debug!(finalized, "ran on-exit finalizers");
    }
}

fn methods(a: &AltrepObject) -> Result<ClassInfo> {
    class_info(a.class()).ok_or(HostError::UnknownClass(a.class()))
}

pub(crate) fn object_region(obj: &Object, start: usize, out: &mut [f64]) -> Result<usize> {
    match obj {
        Object::Real(v) => {
            if start >= v.len() {
                return Ok(0);
            }
            let n = out.len().min(v.len() - start);
            out[..n].copy_from_slice(&v[start..start + n]);
            Ok(n)
        }
        Object::AltReal(a) => Ok(methods(a)?.methods.get_region(a.data1(), start, out)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::registry::register_altreal_class;
    use altvec_core::{AltRealMethods, Ownership};
    use once_cell::sync::OnceCell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Minimal class storing its elements as a `Vec<f64>` in the slot.
    pub(crate) struct SliceClass;

    impl SliceClass {
        fn data(data1: &Slot) -> &[f64] {
            data1.get::<Vec<f64>>().expect("slice class slot")
        }
    }

    impl AltRealMethods for SliceClass {
        fn length(&self, data1: &Slot) -> usize {
            Self::data(data1).len()
        }

        fn inspect(&self, data1: &Slot) -> Inspection {
            let d = Self::data(data1);
            Inspection {
                class: "slice".into(),
                length: d.len(),
                address: d.as_ptr() as usize,
                ownership: Ownership::Owned,
            }
        }

        fn dataptr_or_null(&self, data1: &Slot) -> Option<NonNull<f64>> {
            NonNull::new(Self::data(data1).as_ptr() as *mut f64)
        }

        unsafe fn elt(&self, data1: &Slot, i: usize) -> f64 {
            *Self::data(data1).get_unchecked(i)
        }

        fn get_region(&self, data1: &Slot, start: usize, out: &mut [f64]) -> usize {
            let d = Self::data(data1);
            if start >= d.len() {
                return 0;
            }
            let n = out.len().min(d.len() - start);
            out[..n].copy_from_slice(&d[start..start + n]);
            n
        }
    }

    static SLICE: SliceClass = SliceClass;

    fn slice_class() -> ClassId {
        static ID: OnceCell<ClassId> = OnceCell::new();
        *ID.get_or_init(|| register_altreal_class("slice", "runtime-tests", &SLICE).unwrap())
    }

    fn slice_value(rt: &Runtime, data: Vec<f64>) -> Value {
        rt.new_altrep(slice_class(), Slot::new(data)).unwrap()
    }

    #[test]
    fn dispatch_routes_to_class_table() {
        let rt = Runtime::default();
        let v = slice_value(&rt, vec![1.0, 2.0, 3.0]);

        assert_eq!(rt.length(v).unwrap(), 3);
        assert_eq!(rt.real_elt(v, 1).unwrap(), 2.0);
        assert_eq!(rt.class_of(v).unwrap(), Some(slice_class()));
        assert!(rt.inspect(v).unwrap().starts_with("slice (len=3"));

        let mut out = [0.0; 8];
        assert_eq!(rt.get_region(v, 1, 8, &mut out).unwrap(), 2);
        assert_eq!(&out[..2], &[2.0, 3.0]);
    }

    #[test]
    fn dispatch_bounds_checks_before_elt() {
        let rt = Runtime::default();
        let v = slice_value(&rt, vec![1.0]);
        let err = rt.real_elt(v, 1).unwrap_err();
        assert!(matches!(
            err,
            HostError::IndexOutOfBounds {
                index: 1,
                length: 1
            }
        ));
    }

    #[test]
    fn managed_vectors_dispatch_natively() {
        let rt = Runtime::default();
        let v = rt.alloc_real(vec![5.0, 6.0]);
        assert_eq!(rt.length(v).unwrap(), 2);
        assert_eq!(rt.real_elt(v, 0).unwrap(), 5.0);
        assert_eq!(rt.class_of(v).unwrap(), None);
        assert_eq!(rt.inspect(v).unwrap(), "real (len=2)");
        assert!(matches!(rt.inspect_altrep(v), Err(HostError::NotAltrep(_))));

        let mut out = [0.0; 4];
        assert_eq!(rt.get_region(v, 2, 4, &mut out).unwrap(), 0);
    }

    #[test]
    fn unknown_class_is_rejected() {
        let rt = Runtime::default();
        let err = rt
            .new_altrep(ClassId::new(u64::MAX), Slot::empty())
            .unwrap_err();
        assert!(matches!(err, HostError::UnknownClass(_)));
    }

    #[test]
    fn unrooted_values_are_swept_and_finalized_once() {
        let rt = Runtime::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let v = slice_value(&rt, vec![1.0]);
        let h = Arc::clone(&hits);
        rt.register_finalizer(v, false, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let report = rt.collect();
        assert_eq!(report, GcReport { swept: 1, finalized: 1 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!rt.is_live(v));
        assert!(matches!(rt.length(v), Err(HostError::Collected(_))));

        assert_eq!(rt.collect(), GcReport::default());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn finalizer_given_at_allocation_runs_on_interval_collection() {
        let rt = Runtime::new(RuntimeConfig {
            gc_interval: 1,
            ..RuntimeConfig::default()
        });
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let v = rt
            .new_altrep_with_finalizer(slice_class(), Slot::new(vec![1.0]), true, move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert!(rt.is_live(v));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // The next allocation collects first; `v` goes with its hook attached.
        rt.alloc_real(vec![]);
        assert!(!rt.is_live(v));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let err = rt
            .new_altrep_with_finalizer(ClassId::new(u64::MAX), Slot::empty(), true, |_| {})
            .unwrap_err();
        assert!(matches!(err, HostError::UnknownClass(_)));
    }

    #[test]
    fn panicking_finalizer_leaves_the_rest_for_the_next_collection() {
        let rt = Runtime::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let first = rt.alloc_real(vec![]);
        rt.register_finalizer(first, false, |_| panic!("finalizer failed"))
            .unwrap();
        let second = rt.alloc_real(vec![]);
        let h = Arc::clone(&hits);
        rt.register_finalizer(second, false, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| rt.collect()));
        assert!(outcome.is_err());
        assert!(!rt.is_live(first));
        assert!(rt.is_live(second));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // The poisoned heap lock is recovered and the survivor is swept.
        assert_eq!(rt.collect(), GcReport { swept: 1, finalized: 1 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn protected_values_survive_until_guard_drops() {
        let rt = Runtime::default();
        let v = rt.alloc_real(vec![1.0]);
        {
            let guard = rt.protect(v).unwrap();
            assert_eq!(guard.value(), v);
            assert_eq!(rt.collect().swept, 0);
            assert!(rt.is_live(v));
        }
        assert_eq!(rt.collect().swept, 1);
        assert!(!rt.is_live(v));
    }

    #[test]
    fn preserve_is_counted() {
        let rt = Runtime::default();
        let v = rt.alloc_real(vec![]);
        rt.preserve(v).unwrap();
        rt.preserve(v).unwrap();
        rt.release(v);
        rt.collect();
        assert!(rt.is_live(v));
        rt.release(v);
        rt.collect();
        assert!(!rt.is_live(v));
        // Extra releases are harmless.
        rt.release(v);
    }

    #[test]
    fn run_finalizer_now_consumes_callbacks() {
        let rt = Runtime::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let v = slice_value(&rt, vec![1.0]);
        let h = Arc::clone(&hits);
        rt.register_finalizer(v, true, move |obj| {
            h.fetch_add(1, Ordering::SeqCst);
            obj.as_altrep_mut().unwrap().data1_mut().take();
        })
        .unwrap();

        assert_eq!(rt.run_finalizer_now(v).unwrap(), 1);
        assert_eq!(rt.run_finalizer_now(v).unwrap(), 0);
        assert!(rt.is_live(v));
        assert_eq!(rt.collect().finalized, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(rt.stats().finalizers_run, 1);
    }

    #[test]
    fn on_exit_finalizers_run_on_drop() {
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let rt = Runtime::default();
            let keep = rt.alloc_real(vec![1.0]);
            rt.preserve(keep).unwrap();

            let h = Arc::clone(&hits);
            rt.register_finalizer(keep, true, move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
            let h = Arc::clone(&hits);
            rt.register_finalizer(keep, false, move |_| {
                h.fetch_add(100, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn on_exit_can_be_disabled() {
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let rt = Runtime::new(RuntimeConfig {
                finalize_on_exit: false,
                ..RuntimeConfig::default()
            });
            let v = rt.alloc_real(vec![]);
            let h = Arc::clone(&hits);
            rt.register_finalizer(v, true, move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn allocation_triggers_collection_at_interval() {
        let rt = Runtime::new(RuntimeConfig {
            gc_interval: 2,
            ..RuntimeConfig::default()
        });
        let a = rt.alloc_real(vec![]);
        let b = rt.alloc_real(vec![]);
        let _guard = rt.protect(b).unwrap();
        let c = rt.alloc_real(vec![]);

        assert!(!rt.is_live(a));
        assert!(rt.is_live(b));
        assert!(rt.is_live(c));
        assert_eq!(rt.stats().collections, 1);
    }

    #[test]
    fn duplicate_makes_a_managed_copy() {
        let rt = Runtime::default();
        let v = slice_value(&rt, vec![4.0, 5.0]);
        let copy = rt.duplicate(v).unwrap();
        assert_eq!(rt.class_of(copy).unwrap(), None);
        assert_eq!(rt.real_elt(copy, 1).unwrap(), 5.0);
        assert_ne!(
            rt.dataptr_or_null(copy).unwrap(),
            rt.dataptr_or_null(v).unwrap()
        );
    }

    #[test]
    fn peak_live_tracks_heap_size() {
        let rt = Runtime::default();
        for _ in 0..3 {
            rt.alloc_real(vec![]);
        }
        rt.collect();
        rt.alloc_real(vec![]);
        assert_eq!(rt.stats().peak_live, 3);
        assert_eq!(rt.live_count(), 1);
    }

    #[test]
    fn from_config_validates() {
        let bad = AltvecConfig {
            region_chunk: 0,
            ..AltvecConfig::default()
        };
        assert!(matches!(Runtime::from_config(&bad), Err(HostError::Core(_))));
        assert!(Runtime::from_config(&AltvecConfig::default()).is_ok());
    }
}
