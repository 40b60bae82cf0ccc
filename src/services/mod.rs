//! Business logic services

pub mod geo;
pub mod materializer;
pub mod matrix;
pub mod optimization;
pub mod persistence;
pub mod temp_assignment;
pub mod vrp;
