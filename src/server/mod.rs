/// Routes about authentication
pub mod auth;
pub mod context;
/// Cookie helpers
pub mod cookie;
/// CORS Handle
pub mod cors;
/// Request parameters
pub mod params;
/// Predefined includes
pub mod preclude;
/// JSON envelope
pub mod result;
/// Routes
pub mod route;
/// Services
pub mod service;
/// Expired token sweep
pub mod timer;
/// Traits
pub mod traits;
#[cfg(test)]
mod unittest;
