//! CLI command implementations.

pub mod adapt;
pub mod doctor;
pub mod init;
pub mod inputs;
pub mod parse;
pub mod prompts;
