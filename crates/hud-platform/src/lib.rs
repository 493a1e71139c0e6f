//! Data model and adapter seams shared by the HUD crates.

pub mod reading;
pub mod readings;
pub mod sensor;
pub mod source;

pub use reading::{FetchError, Reading};
