//! Collaborators the trees talk to: repository queries, status push source,
//! command execution, and tracing setup.

pub mod commands;
pub mod repo;
pub mod status;
pub mod tracing_setup;
