mod config;
mod fetch;
mod logging;
mod source;
mod sync;

pub use config::*;
pub use fetch::*;
pub use logging::*;
pub use source::*;
pub use sync::*;
