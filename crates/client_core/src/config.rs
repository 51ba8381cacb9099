use std::{collections::HashMap, fmt, fs};

use shared::protocol::UPDATE_MODEL_PATH;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Public tunnel in front of the model update service.
pub const DEFAULT_API_URL: &str = "https://zoologically-postprostate-reggie.ngrok-free.dev";
/// The service when run on the same machine.
pub const LOCAL_DEV_API_URL: &str = "http://localhost:5075";
pub const SETTINGS_FILE: &str = "flap_controller.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid api url {raw:?}: {source}")]
    InvalidEndpoint {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("api url {raw:?} must use http or https")]
    UnsupportedScheme { raw: String },
}

pub fn load_settings() -> Settings {
    let file_contents = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from_sources(file_contents.as_deref(), |name| std::env::var(name).ok())
}

/// Default, then the settings file, then `FLAP_API_URL`, then `APP__API_URL`.
pub fn settings_from_sources(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("api_url") {
                    settings.api_url = v.clone();
                }
            }
            Err(err) => warn!(file = SETTINGS_FILE, "ignoring unreadable settings file: {err}"),
        }
    }

    for name in ["FLAP_API_URL", "APP__API_URL"] {
        if let Some(v) = env(name).filter(|v| !v.trim().is_empty()) {
            settings.api_url = v;
        }
    }

    settings
}

/// Root URL of the model update service, stored without a trailing slash so
/// service-relative paths can be appended verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    base: String,
}

impl ServiceEndpoint {
    pub fn parse(raw: &str) -> Result<Self, SettingsError> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|source| SettingsError::InvalidEndpoint {
            raw: raw.to_string(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::UnsupportedScheme {
                raw: raw.to_string(),
            });
        }

        Ok(Self {
            base: trimmed.trim_end_matches('/').to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    pub fn update_url(&self) -> String {
        self.resolve(UPDATE_MODEL_PATH)
    }

    /// Resolves a path returned by the service against this endpoint.
    pub fn resolve(&self, path: &str) -> String {
        if let Ok(absolute) = Url::parse(path) {
            if matches!(absolute.scheme(), "http" | "https") {
                return path.to_string();
            }
        }
        if path.starts_with('/') {
            format!("{}{path}", self.base)
        } else {
            format!("{}/{path}", self.base)
        }
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_to_tunnel_endpoint() {
        assert_eq!(settings_from_sources(None, no_env).api_url, DEFAULT_API_URL);
    }

    #[test]
    fn file_then_env_override_in_order() {
        let file = r#"api_url = "http://from-file:1""#;
        assert_eq!(
            settings_from_sources(Some(file), no_env).api_url,
            "http://from-file:1"
        );

        let env = |name: &str| match name {
            "FLAP_API_URL" => Some("http://flap-env:2".to_string()),
            _ => None,
        };
        assert_eq!(
            settings_from_sources(Some(file), env).api_url,
            "http://flap-env:2"
        );

        let both = |name: &str| match name {
            "FLAP_API_URL" => Some("http://flap-env:2".to_string()),
            "APP__API_URL" => Some("http://app-env:3".to_string()),
            _ => None,
        };
        assert_eq!(
            settings_from_sources(Some(file), both).api_url,
            "http://app-env:3"
        );
    }

    #[test]
    fn blank_env_values_and_bad_files_are_ignored() {
        let env = |_: &str| Some("   ".to_string());
        assert_eq!(
            settings_from_sources(Some("not = [valid"), env).api_url,
            DEFAULT_API_URL
        );
    }

    #[test]
    fn endpoint_drops_trailing_slash() {
        let endpoint = ServiceEndpoint::parse("http://localhost:5075/").expect("parse");
        assert_eq!(endpoint.as_str(), "http://localhost:5075");
        assert_eq!(
            endpoint.update_url(),
            "http://localhost:5075/SolidWorks/update"
        );
    }

    #[test]
    fn endpoint_rejects_non_http_urls() {
        assert!(matches!(
            ServiceEndpoint::parse("ftp://example.com"),
            Err(SettingsError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            ServiceEndpoint::parse("not a url"),
            Err(SettingsError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn resolves_service_paths() {
        let endpoint = ServiceEndpoint::parse("http://host:1").expect("parse");
        assert_eq!(endpoint.resolve("/p.png"), "http://host:1/p.png");
        assert_eq!(endpoint.resolve("p.png"), "http://host:1/p.png");
        assert_eq!(
            endpoint.resolve("/files/pdf?id=7"),
            "http://host:1/files/pdf?id=7"
        );
        assert_eq!(
            endpoint.resolve("https://cdn.example.com/p.png"),
            "https://cdn.example.com/p.png"
        );
    }
}
