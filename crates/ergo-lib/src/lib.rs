pub mod analysis;
pub mod config;
pub mod error;
pub mod io;
pub mod plot;
pub mod resample;
pub mod signal;
pub mod store;
pub mod synth;

pub use config::*;
pub use error::*;
pub use signal::*;
