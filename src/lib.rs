//! Unlimited Corp - Real-time task assignment and notification core
//!
//! This crate matches pending tasks to idle employee agents, publishes the
//! resulting domain events on an in-process bus, and pushes them to live
//! WebSocket clients scoped by tenant and user.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
