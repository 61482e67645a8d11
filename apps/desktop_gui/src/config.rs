use std::{collections::HashMap, fs};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub menu_api_url: String,
    pub menu_api_key: String,
    pub database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            menu_api_url: "https://2uo0wskuv5.microcms.io/api/v1/menu".into(),
            // Credential baked in at build time; runtime environment wins.
            menu_api_key: option_env!("MENU_API_KEY").unwrap_or("").into(),
            database_url: "sqlite://./data/orders.db".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("app.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_file_values(&mut settings, &file_cfg);
        }
    }

    if let Ok(v) = std::env::var("MENU_API_URL") {
        settings.menu_api_url = v;
    }
    if let Ok(v) = std::env::var("APP__MENU_API_URL") {
        settings.menu_api_url = v;
    }

    if let Ok(v) = std::env::var("MENU_API_KEY") {
        settings.menu_api_key = v;
    }
    if let Ok(v) = std::env::var("APP__MENU_API_KEY") {
        settings.menu_api_key = v;
    }

    if let Ok(v) = std::env::var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Ok(v) = std::env::var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    settings
}

fn apply_file_values(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("menu_api_url") {
        settings.menu_api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("menu_api_key") {
        settings.menu_api_key = v.clone();
    }
    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
}
