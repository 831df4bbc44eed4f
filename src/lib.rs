pub mod cli;
pub mod config;
pub mod health;
pub mod http;
pub mod monitor;
pub mod telemetry;

#[cfg(test)]
mod test_utils;
