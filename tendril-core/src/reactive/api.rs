//! Convenience constructors.
//!
//! These hand out narrow accessors instead of the cells themselves: a
//! signal becomes a [`Getter`]/[`Setter`] pair and a memo a read-only
//! [`Memo`]. Behavior is exactly that of the underlying cells.

use super::effect::{Effect, EffectContext};
use super::memo::Computed;
use super::signal::StateCell;
use crate::error::Result;

/// Read half of a signal created by [`create_signal`].
pub struct Getter<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    cell: StateCell<T>,
}

impl<T> Getter<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Read the value, recording a dependency if tracking is active.
    pub fn get(&self) -> T {
        self.cell.get()
    }
}

impl<T> Clone for Getter<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

/// Write half of a signal created by [`create_signal`].
pub struct Setter<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    cell: StateCell<T>,
}

impl<T> Setter<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Replace the value.
    pub fn set(&self, value: T) {
        self.cell.set(value);
    }

    /// Replace the value with one computed from the previous value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        self.cell.update(f);
    }
}

impl<T> Clone for Setter<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

/// Read-only view of a computed cell created by [`create_memo`].
pub struct Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    cell: Computed<T>,
}

impl<T> Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Read the value, recomputing first if it is stale.
    pub fn get(&self) -> T {
        self.cell.get()
    }
}

impl<T> Clone for Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

/// Create a state cell and return its read and write halves.
pub fn create_signal<T>(value: T) -> (Getter<T>, Setter<T>)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let cell = StateCell::new(value);
    (Getter { cell: cell.clone() }, Setter { cell })
}

/// Create a computed cell and return a getter for it.
pub fn create_memo<T, F>(compute: F) -> Result<Memo<T>>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Ok(Memo {
        cell: Computed::new(compute)?,
    })
}

/// Create an effect. It runs once now and again after each change.
pub fn create_effect<F>(run: F) -> Result<()>
where
    F: Fn(&EffectContext) + Send + Sync + 'static,
{
    Effect::new(run)?;
    Ok(())
}
