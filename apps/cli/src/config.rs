use std::{collections::HashMap, env, fs};

pub const DEFAULT_API_URL: &str = "https://dummyjson.com/users";

#[derive(Debug, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Defaults, overridden by `contacts.toml` in the working directory,
/// overridden by the `CONTACTS_API_URL` environment variable.
pub fn load_settings() -> Settings {
    apply_sources(
        Settings::default(),
        fs::read_to_string("contacts.toml").ok().as_deref(),
        env::var("CONTACTS_API_URL").ok(),
    )
}

fn apply_sources(mut settings: Settings, file_raw: Option<&str>, env_url: Option<String>) -> Settings {
    if let Some(raw) = file_raw {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
            if let Some(v) = file_cfg.get("api_url") {
                settings.api_url = v.clone();
            }
        }
    }
    if let Some(v) = env_url {
        settings.api_url = v;
    }
    settings
}
