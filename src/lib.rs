//! Library crate for live-quiz-back, exposing modules for binaries and integration tests.

mod catalog;
mod config;
pub mod dao;
mod dto;
mod error;
pub mod routes;
pub mod services;
pub mod state;
