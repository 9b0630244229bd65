//! State Cell Implementation
//!
//! A state cell is the leaf of the signal graph: a value set from outside,
//! read by computations.
//!
//! # How State Cells Work
//!
//! 1. When read while a computation is being evaluated, the cell appends
//!    that computation's recorder to its dependents.
//!
//! 2. When set to a value that differs from the current one, the cell
//!    stores it, emits [`ChangeEvent::Changed`] with a reference to itself,
//!    then invokes every recorded dependent in recording order.
//!
//! 3. Setting an equal value does nothing at all. This is the only
//!    memoization gate for leaf cells.
//!
//! Dependents are never pruned and never deduplicated.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;

use super::channel::{ChangeChannel, ChangeEvent};
use super::context::ReactiveContext;
use super::subscriber::{cascade, Dependents};

struct StateInner<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    value: RwLock<T>,
    dependents: Dependents,
    changes: ChangeChannel<StateCell<T>>,
}

/// A mutable reactive cell holding a value of type `T`.
///
/// Clones share the same cell.
///
/// # Example
///
/// ```rust
/// use tendril_core::reactive::StateCell;
///
/// let count = StateCell::new(0);
/// count.set(5);
/// count.update(|c| c + 1);
/// assert_eq!(count.get(), 6);
/// ```
pub struct StateCell<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    inner: Arc<StateInner<T>>,
}

impl<T> StateCell<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new cell with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(StateInner {
                value: RwLock::new(value),
                dependents: Mutex::new(SmallVec::new()),
                changes: ChangeChannel::new(),
            }),
        }
    }

    /// Get the current value.
    ///
    /// If a computation is being evaluated, it is recorded as a dependent.
    pub fn get(&self) -> T {
        ReactiveContext::track(&self.inner.dependents);
        self.get_untracked()
    }

    /// Get the current value without recording a dependency.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Replace the value.
    ///
    /// Notifies and cascades only if `value` differs from the current value.
    pub fn set(&self, value: T) {
        let changed = {
            let mut guard = self.inner.value.write();
            if *guard != value {
                *guard = value;
                true
            } else {
                false
            }
        };

        if !changed {
            return;
        }

        tracing::trace!(
            dependents = self.dependent_count(),
            "state cell changed"
        );
        self.inner.changes.emit(ChangeEvent::Changed, self);
        cascade(&self.inner.dependents);
    }

    /// Set the value computed from the previous one.
    ///
    /// `f` runs on a copy of the previous value with no lock held, so it may
    /// read or write this cell.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let previous = self.get_untracked();
        self.set(f(&previous));
    }

    /// Register a handler for change notifications.
    ///
    /// The handler runs before any dependent computation is notified.
    pub fn on_change<F>(&self, handler: F)
    where
        F: Fn(&StateCell<T>) + Send + Sync + 'static,
    {
        self.inner.changes.on(ChangeEvent::Changed, handler);
    }

    /// Number of recorded dependents, duplicates included.
    pub fn dependent_count(&self) -> usize {
        self.inner.dependents.lock().len()
    }

    /// Check whether two handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for StateCell<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for StateCell<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCell")
            .field("value", &self.get_untracked())
            .field("dependent_count", &self.dependent_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Python Bindings
// ----------------------------------------------------------------------------

#[cfg(feature = "python")]
pub use python::PySignal;

#[cfg(feature = "python")]
mod python {
    use std::sync::Arc;

    use pyo3::prelude::*;

    use super::StateCell;

    /// A Python object stored in a state cell.
    ///
    /// Equality is object identity, so assigning the same object is a no-op
    /// while assigning an equal-but-distinct object notifies.
    #[derive(Clone)]
    struct PyValue(Arc<Py<PyAny>>);

    impl PartialEq for PyValue {
        fn eq(&self, other: &Self) -> bool {
            Arc::ptr_eq(&self.0, &other.0) || self.0.as_ptr() == other.0.as_ptr()
        }
    }

    /// Python-exposed state cell.
    ///
    /// Only plain state is exposed: computed cells and effects are not, so a
    /// signal created from Python never gains dependents.
    #[pyclass(name = "Signal")]
    pub struct PySignal {
        cell: StateCell<PyValue>,
    }

    #[pymethods]
    impl PySignal {
        /// Create a new signal with the given initial value.
        #[new]
        fn new(value: PyObject) -> Self {
            Self {
                cell: StateCell::new(PyValue(Arc::new(value))),
            }
        }

        /// Read the value, recording a dependency if tracking is active.
        fn get(&self, py: Python<'_>) -> PyObject {
            self.cell.get().0.clone_ref(py)
        }

        /// Replace the value.
        fn set(&self, value: PyObject) {
            self.cell.set(PyValue(Arc::new(value)));
        }

        /// The current value, read without tracking.
        #[getter]
        fn value(&self, py: Python<'_>) -> PyObject {
            self.cell.get_untracked().0.clone_ref(py)
        }

        fn __repr__(&self, py: Python<'_>) -> String {
            let value = self.cell.get_untracked();
            let repr = value
                .0
                .bind(py)
                .repr()
                .map(|r| r.to_string())
                .unwrap_or_else(|_| "?".to_string());
            format!("Signal(value={repr})")
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
