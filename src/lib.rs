pub mod config;
pub mod controller;
pub mod indicator;
pub mod messages;
pub mod motor;
pub mod runtime;
pub mod speed;
pub mod transport;
