//! Runtime settings, read from `config.toml` and `ATTENDANCE__*` environment variables.

use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Path of the `sqlite3` database file.
    pub database_url: String,
    pub server: ServerSettings,
    pub session: SessionSettings,
    /// The single admin account. Admin login is refused when this is not configured.
    #[serde(default)]
    pub admin: Option<AdminCredentials>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Secret for signing session cookies, at least 64 bytes. Sessions do not survive a
    /// restart when this is unset.
    #[serde(default)]
    pub key: Option<String>,
    pub cookie_secure: bool,
}

#[derive(Clone, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Compares a submitted username and password against the configured pair.
    pub fn verify(&self, username: &str, password: &str) -> Result<()> {
        if username.trim() == self.username && password == self.password {
            Ok(())
        } else {
            Err(Error::InvalidCredentials)
        }
    }
}

impl Settings {
    /// Loads settings from `.env`, then the config file, then the environment.
    ///
    /// Without an explicit `path`, a `config.toml` in the working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("config").required(false),
        };

        let settings = defaults()?
            .add_source(file)
            .add_source(
                Environment::with_prefix("ATTENDANCE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("database_url", "attendance.db")?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("session.cookie_secure", false)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(contents: &str) -> Settings {
        defaults()
            .unwrap()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn falls_back_to_defaults() {
        let settings = from_toml("");
        assert_eq!(settings.database_url, "attendance.db");
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.session.cookie_secure);
        assert!(settings.session.key.is_none());
        assert!(settings.admin.is_none());
    }

    #[test]
    fn reads_admin_credentials() {
        let settings = from_toml(
            r#"
            database_url = "/var/lib/attendance.db"

            [server]
            port = 9000

            [admin]
            username = "registrar"
            password = "s3cret"
            "#,
        );

        assert_eq!(settings.database_url, "/var/lib/attendance.db");
        assert_eq!(settings.server.port, 9000);
        assert!(!format!("{settings:?}").contains("s3cret"));

        let admin = settings.admin.unwrap();
        assert!(admin.verify(" registrar ", "s3cret").is_ok());
        assert!(matches!(
            admin.verify("registrar", "wrong"),
            Err(Error::InvalidCredentials)
        ));
    }
}
