pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod services;
pub mod util;
