//! External processing stages
//!
//! Both stages are separate executables. They are spawned per request, waited
//! on asynchronously and killed if they outlive their time budget.

mod command;
mod effect;
mod segment;

pub use command::{Launcher, StageError};
pub use effect::EffectStage;
pub use segment::SegmentationStage;

#[cfg(test)]
pub(crate) use command::tests::{counting_script, invocations};
