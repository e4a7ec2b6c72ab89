pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod qbo;
pub mod repos;
pub mod routes;
pub mod services;
