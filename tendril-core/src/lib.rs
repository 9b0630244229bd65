//! Tendril Core
//!
//! This crate provides the core runtime for the Tendril signal graph: mutable
//! state cells, memoized computed cells and effects, with automatic
//! dependency discovery and synchronous change propagation.
//!
//! The crate is designed to be used both as a native Rust library and, with
//! the `python` feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! - `reactive`: the cells, the tracking context and change channels
//! - `error`: the crate's error type
//!
//! # Example
//!
//! ```rust
//! use tendril_core::reactive::{create_effect, create_memo, create_signal};
//!
//! let (count, set_count) = create_signal(0);
//!
//! let reader = count.clone();
//! let doubled = create_memo(move || reader.get() * 2)?;
//!
//! let shown = doubled.clone();
//! create_effect(move |_| {
//!     println!("Count: {}, Doubled: {}", count.get(), shown.get());
//! })?;
//!
//! // Effect re-runs, prints: "Count: 5, Doubled: 10"
//! set_count.set(5);
//! assert_eq!(doubled.get(), 10);
//! # Ok::<(), tendril_core::ReactiveError>(())
//! ```

pub mod error;
pub mod reactive;

pub use error::{ReactiveError, Result};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types and functions.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<reactive::PySignal>()?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
