//! Data models shared between sources, the aggregator and the RPC layer.

mod history;
mod metric;
mod snapshot;

pub use history::*;
pub use metric::*;
pub use snapshot::*;
