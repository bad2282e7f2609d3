pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod i18n;
pub mod models;
pub mod notify;
pub mod password;
pub mod routes;
pub mod scheduler;
pub mod search;
pub mod security;
pub mod server;
pub mod uploads;
pub mod validation;
