pub mod artifact;
pub mod config;
pub mod context_card;
pub mod credentials;
pub mod diagram;
pub mod discovery;
pub mod error;
pub mod io;
pub mod manifest;
pub mod paths;
pub mod prd;
pub mod prompt;

pub use error::{MiseError, Result};
