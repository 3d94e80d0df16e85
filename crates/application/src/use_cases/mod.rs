//! Application use cases (business logic orchestration).

mod settings;
mod uninstall;

pub use settings::{SETTINGS_KEY, SettingsError, SettingsService};
pub use uninstall::Uninstall;
