pub mod aggregator;
pub mod config;
pub mod display;
pub mod scheduler;
pub mod sink;
pub mod snapshot;
pub mod sources;

#[cfg(test)]
mod testing;
