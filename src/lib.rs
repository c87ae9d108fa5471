// src/lib.rs

pub mod animation;
pub mod config;
pub mod controllers;
pub mod errors;
pub mod models;
pub mod services;
pub mod utilities;
pub mod views;

pub use errors::{Error, Result};
