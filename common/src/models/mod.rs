pub mod profile;
pub mod session;

pub use profile::*;
pub use session::*;
