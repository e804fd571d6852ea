// src/core/handler/mod.rs

pub mod actions;
pub mod command_router;
pub mod transaction_handler;

pub use command_router::{RouteResponse, Router};
