pub mod config;
pub mod notes;
pub mod state;
pub mod store;

pub use notes::{app, request, response, router};
