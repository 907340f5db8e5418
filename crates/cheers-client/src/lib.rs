pub mod api;
pub mod controller;
pub mod error;
pub mod session;
pub mod state;
