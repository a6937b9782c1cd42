//! Extracts drone registrations from the FAA Aircraft Registration Database.

pub mod app;
pub mod archive;
pub mod cli;
pub mod drone;
pub mod error;
pub mod mode_s;
pub mod registry;

#[cfg(test)]
mod test_utils;
