pub mod messages;
pub mod config;
pub mod models;
pub mod utils;

pub use self::config::*;
pub use self::messages::*;
pub use self::models::*;
pub use self::utils::*;
