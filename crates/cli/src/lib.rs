pub mod browser;
pub mod cli;
pub mod commands;
pub mod daemon;
pub mod error;
pub mod logging;
pub mod names;
pub mod paths;
pub mod profile;
pub mod testing;
pub mod wrapper;
