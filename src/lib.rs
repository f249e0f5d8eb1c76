pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod efficiency;
pub mod logging;
pub mod models;
pub mod mvi;
pub mod navigation;
pub mod notify;
pub mod poi;
pub mod reminder;
pub mod repository;
pub mod tui;
pub mod utils;
pub mod validation;
pub mod viewmodel;

pub use config::Config;
pub use database::Database;
pub use models::{FuelLog, MaintenanceRecord, Reminder, User, Vehicle};
pub use utils::Profile;
