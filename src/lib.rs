// src/lib.rs

pub mod applications;
pub mod auth;
pub mod database;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod identity;
pub mod import;
pub mod jobs;
pub mod models;
pub mod otp;
pub mod search;
pub mod web;

pub use web::start_web_server;
