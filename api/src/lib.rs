//! HTTP surface for the progress pipeline, content authoring and password
//! reset. `main.rs` wires these together; tests build the same router over an
//! in-memory store.

pub mod response;
pub mod routes;
pub mod services;
pub mod state;
