#![forbid(unsafe_code)]

pub mod analytics;
pub mod model;
pub mod session;
pub mod time;

pub use time::Clock;
