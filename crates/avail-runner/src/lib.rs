pub mod config;
pub mod runner;
pub mod update;

pub use config::*;
pub use runner::*;
pub use update::*;
