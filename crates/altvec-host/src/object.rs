//! Host object representation.

use std::fmt;

use altvec_core::{ClassId, Slot, ValueId};

/// Copyable handle to an object in a [`Runtime`](crate::Runtime)'s heap.
///
/// A `Value` does not keep its object alive; root it with
/// [`Runtime::protect`](crate::Runtime::protect) or
/// [`Runtime::preserve`](crate::Runtime::preserve).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(pub(crate) ValueId);

impl Value {
    pub fn id(self) -> ValueId {
        self.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.0.get())
    }
}

/// An object of a registered alternative-representation class.
///
/// The host owns the wrapper; the class only supplies the tag and what goes
/// in `data1`.
#[derive(Debug)]
pub struct AltrepObject {
    class: ClassId,
    data1: Slot,
}

impl AltrepObject {
    pub(crate) fn new(class: ClassId, data1: Slot) -> Self {
        Self { class, data1 }
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn data1(&self) -> &Slot {
        &self.data1
    }

    pub fn data1_mut(&mut self) -> &mut Slot {
        &mut self.data1
    }
}

#[derive(Debug)]
pub enum Object {
    /// Managed real vector living in the host heap.
    Real(Vec<f64>),
    /// Vector whose storage is provided by a registered class.
    AltReal(AltrepObject),
}

impl Object {
    pub fn as_altrep(&self) -> Option<&AltrepObject> {
        match self {
            Object::AltReal(a) => Some(a),
            Object::Real(_) => None,
        }
    }

    pub fn as_altrep_mut(&mut self) -> Option<&mut AltrepObject> {
        match self {
            Object::AltReal(a) => Some(a),
            Object::Real(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Object::Real(_) => "real",
            Object::AltReal(_) => "altreal",
        }
    }
}

/// Collector callback. Runs at most once, after its value becomes unreachable.
pub type Finalizer = Box<dyn FnOnce(&mut Object) + Send + Sync>;

pub(crate) struct PendingFinalizer {
    pub(crate) on_exit: bool,
    pub(crate) callback: Finalizer,
}

/// Heap cell: the object plus any finalizers registered against it.
pub(crate) struct Cell {
    pub(crate) object: Object,
    pub(crate) finalizers: Vec<PendingFinalizer>,
}

impl Cell {
    pub(crate) fn new(object: Object) -> Self {
        Self {
            object,
            finalizers: Vec::new(),
        }
    }

    /// Run (and consume) the pending finalizers selected by `select`.
    /// Returns how many ran.
    pub(crate) fn run_finalizers(&mut self, select: impl Fn(&PendingFinalizer) -> bool) -> usize {
        let (run, keep): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.finalizers).into_iter().partition(|f| select(f));
        self.finalizers = keep;
        let n = run.len();
        for f in run {
            (f.callback)(&mut self.object);
        }
        n
    }
}
