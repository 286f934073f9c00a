//! multistep - server-driven multi-step form wizards
//!
//! The wizard core (step state machine, step cache, manager and request
//! handler), the REST surface exposing it and the client-side controller
//! that drives a wizard region through a transport.

pub mod client;
pub mod config;
pub mod forms;
pub mod logging;
pub mod records;
pub mod rest;
pub mod templates;
pub mod wizard;
