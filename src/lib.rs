pub mod attendance;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod paths;
pub mod persistence;
pub mod roster;
pub mod routes;
pub mod state;
pub mod store;

#[cfg(test)]
pub mod testing;
