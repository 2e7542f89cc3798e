pub mod config;
pub mod dtos;
pub mod error;
pub mod handler;
pub mod money;
pub mod processor;
pub mod routes;
