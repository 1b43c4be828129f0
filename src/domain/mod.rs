mod filename;
mod resolve;
mod snapshot;

pub use filename::*;
pub use resolve::*;
pub use snapshot::*;
