pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod models;
pub mod storage;
pub mod sync;

pub use error::{HotSauceError, Result};
