pub mod config;
pub mod dto;
pub mod errors;
pub mod middleware;
pub mod models;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
