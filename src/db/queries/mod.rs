//! Database queries

pub mod customer;
pub mod route;
pub mod tech;
pub mod temp_assignment;
