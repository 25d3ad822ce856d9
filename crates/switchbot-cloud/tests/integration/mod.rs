//! Integration Tests Module
//!
//! - `mock_vendor`: axum stand-in for the command endpoint
//! - `dispatch_flow`: one click -> signed request -> classified result
//! - `concurrency_flow`: independent in-flight commands


mod concurrency_flow;
mod dispatch_flow;
