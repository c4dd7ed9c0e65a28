// Common test utilities

pub mod fixtures;
pub mod harness;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use fixtures::*;
pub use harness::*;

#[cfg(feature = "postgres")]
pub use postgres::*;
