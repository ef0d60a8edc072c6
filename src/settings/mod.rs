mod service;

pub use service::{SettingsPatch, SettingsService};
