use std::{
    fs,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

const DEFAULT_ALLOWED_ORIGIN: &str = "https://knowledge-knockout-ivory.vercel.app";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub questions_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".into(),
            port: 5000,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.into()],
            questions_path: None,
        }
    }
}

impl Settings {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .bind_host
            .trim()
            .parse()
            .with_context(|| format!("invalid bind host '{}'", self.bind_host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_host: Option<String>,
    port: Option<u16>,
    allowed_origins: Option<Vec<String>>,
    questions_path: Option<PathBuf>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new("server.toml"), |key| std::env::var(key).ok())
}

/// Defaults, then `file` if present, then environment. Later sources win.
pub fn load_settings_from(file: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(error) => warn!(path = %file.display(), %error, "ignoring unparsable settings file"),
        }
    }

    let lookup = |plain: &str, prefixed: &str| env(prefixed).or_else(|| env(plain));

    if let Some(v) = lookup("BIND_HOST", "APP__BIND_HOST") {
        settings.bind_host = v;
    }
    if let Some(v) = lookup("PORT", "APP__PORT") {
        match v.trim().parse::<u16>() {
            Ok(port) => settings.port = port,
            Err(_) => warn!(value = %v, "ignoring invalid PORT"),
        }
    }
    if let Some(v) = lookup("ALLOWED_ORIGINS", "APP__ALLOWED_ORIGINS") {
        settings.allowed_origins = v.split(',').map(str::to_string).collect();
    }
    if let Some(v) = lookup("QUESTIONS_PATH", "APP__QUESTIONS_PATH") {
        settings.questions_path = Some(PathBuf::from(v));
    }

    settings.allowed_origins = normalize_origins(&settings.allowed_origins);
    settings
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.bind_host {
        settings.bind_host = v;
    }
    if let Some(v) = file_cfg.port {
        settings.port = v;
    }
    if let Some(v) = file_cfg.allowed_origins {
        settings.allowed_origins = v;
    }
    if let Some(v) = file_cfg.questions_path {
        settings.questions_path = Some(v);
    }
}

/// Browsers send `Origin` without a trailing slash, so configured entries are trimmed to match.
fn normalize_origins(raw: &[String]) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for origin in raw {
        let origin = origin.trim().trim_end_matches('/');
        if origin.is_empty() || origins.iter().any(|existing| existing == origin) {
            continue;
        }
        origins.push(origin.to_string());
    }
    origins
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
