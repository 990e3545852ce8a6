//! Core types shared by the flowline crates.
//!
//! This crate provides the strongly-typed identifiers minted by the engine
//! and the rootcause-based `Result` alias used at crate boundaries.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ExecutionId, ParseIdError, WorkflowId};
