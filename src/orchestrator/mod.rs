//! Background side of a watch session.
//!
//! This module owns the periodic executor, the process runner it drives, and
//! the stop signal shared with the render loop. The TUI layer only consumes
//! what it publishes.

mod executor;
mod process;
mod signal;

pub(crate) use executor::PeriodicExecutor;
pub(crate) use process::ProcessRunner;
pub(crate) use signal::StopSignal;
