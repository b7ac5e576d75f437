//! Interfaces layer - transports in front of the application services

pub mod http;
