//! Bounded readiness polling and a container smoke workflow built on it.
//!
//! - [`readiness`] polls an HTTP or TCP address until it answers or a
//!   deadline passes.
//! - [`container`] drives the container engine.
//! - [`workflow`] runs a container, waits for it, smoke tests it, and cleans
//!   up.

pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod readiness;
pub mod settings;
pub mod smoke;
pub mod util;
pub mod workflow;
