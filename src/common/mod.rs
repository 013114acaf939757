//! Types, errors and channels shared by every component

pub mod channels;
pub mod errors;
pub mod types;
