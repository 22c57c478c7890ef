//! Configuration sections, one per concern.

mod connector;
mod daemon;
mod registry;

pub use connector::*;
pub use daemon::*;
pub use registry::*;
