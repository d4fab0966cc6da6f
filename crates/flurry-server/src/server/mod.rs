pub mod config;
pub mod daemon;
pub mod lockfile;
pub mod service;
pub mod telemetry;
#[cfg(test)]
pub mod testing;
pub mod worker;
