pub mod allocation;
pub mod clock;
pub mod codec;
pub mod config;
pub mod config_payload;
pub mod descriptor;
pub mod duration;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod payload;
pub mod repr;
pub mod session;
pub mod value;

pub use error::{Error, Result};
