pub mod classify;
pub mod cost;
pub mod decide;
pub mod failure;
pub mod injection;
pub mod truncate;
pub mod usage;

pub use classify::*;
pub use cost::*;
pub use decide::*;
pub use failure::*;
pub use injection::*;
pub use truncate::*;
pub use usage::*;
