pub mod config;
pub mod prefs;
pub mod session;
pub mod todo;

pub use config::*;
pub use prefs::*;
pub use session::*;
pub use todo::*;
