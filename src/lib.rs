pub mod bounds;
pub mod config;
pub mod error;
pub mod formats;
pub mod handlers;
pub mod resolver;
pub mod slice;
pub mod ticket;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
