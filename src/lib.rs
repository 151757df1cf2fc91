//! BuildIT: build guides for electronics and robotics projects, generated from a
//! parts kit ("build" mode) or from a goal ("reverse" mode).

pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod routes;
pub mod store;
