pub mod error;
pub mod failure;
pub mod ledger;
pub mod provider;
pub mod session;
pub mod switcher;
mod util;

pub use error::*;
pub use failure::*;
pub use ledger::*;
pub use provider::*;
pub use session::*;
pub use switcher::*;
pub use util::*;
