//! Reducers and reducer subscriptions.
//!
//! A reducer turns `(current value, action)` into the next value of a key.
//! Its output is written through the owning store, so the validator still
//! decides whether it is kept.

mod handle;
mod registry;

pub use handle::ReducerHandle;
pub use registry::{Reducer, ReducerRegistry, ReducerSlot, Subscription};
