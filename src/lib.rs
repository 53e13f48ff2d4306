pub mod cli;
pub mod display;
pub mod error;
pub mod lecture;
pub mod manager;
pub mod models;
pub mod password;
pub mod schema;
pub mod settings;
pub mod summary;
pub mod web;

pub use crate::error::{Error, Result};
use crate::manager::AttendanceManager;
use crate::settings::Settings;

/// Opens the database named in `settings`, creating and migrating it if needed.
pub fn create_default_manager(settings: &Settings) -> Result<AttendanceManager> {
    AttendanceManager::connect(&settings.database_url)
}
