//! Runtime module: process lifecycle: boot, serve, shutdown.

pub mod boot;
pub mod lifecycle;
pub mod serve;
pub mod stop;

pub use lifecycle::{Lifecycle, LifecycleEvent, LifecycleHandle, Outcome};
