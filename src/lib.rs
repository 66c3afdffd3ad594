pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod provider;
pub mod resolver;
pub mod routes;
pub mod state;
