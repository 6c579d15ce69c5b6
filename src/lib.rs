// Repository object trees - library exposing the tree engine and its collaborators

pub mod config;
pub mod error;
pub mod panel;
pub mod services;
pub mod view;
