//! Job-application autofill engine and its HTTP surface.
//!
//! The engine (`autofill`) works against any page that implements `dom::DocumentTree`.
//! The binary serves it over HTTP against `dom::VirtualDocument`; embedders with a live
//! page implement the traits themselves and can arm the page watcher.

pub mod autofill;
pub mod config;
pub mod db;
pub mod dom;
pub mod errors;
pub mod models;
pub mod resume;
pub mod routes;
pub mod state;
pub mod store;
