//! Type definitions

pub mod customer;
pub mod day;
pub mod error;
pub mod messages;
pub mod route;
pub mod tech;
pub mod temp_assignment;

pub use customer::*;
pub use day::*;
pub use error::*;
pub use messages::*;
pub use route::*;
pub use tech::*;
pub use temp_assignment::*;
