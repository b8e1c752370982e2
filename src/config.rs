use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, warn};

use crate::error::ConfigError;

pub const DEFAULT_SMTP_HOST: &str = "smtp.qiye.163.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub smtp_host: String,
    pub smtp_port: u16,

    /// Connect with implicit TLS instead of upgrading with STARTTLS
    pub smtp_secure: bool,

    /// Also used as the `From` and `Reply-To` address of every message
    pub smtp_user: String,
    pub smtp_pass: String,

    pub template_file: Option<PathBuf>,

    /// Read from `cvs_file`, the name the deployed `.env` files use
    pub csv_file: Option<PathBuf>,

    /// No `Subject` header is sent when unset
    pub email_subject: Option<String>,

    /// Plain text alternative sent alongside the HTML body when set
    pub email_text: Option<String>,
}

impl Config {
    /// Builds the config from any key/value source, `lookup` returns `None` for absent keys
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| match lookup(key) {
            Some(val) if !val.is_empty() => Ok(val),
            _ => Err(ConfigError::Missing(key)),
        };
        let optional = |key: &str| lookup(key).filter(|val| !val.is_empty());

        let smtp_user = required("user")?;
        let smtp_pass = required("pass")?;

        let smtp_port = match optional("port") {
            Some(port) => match port.trim().parse() {
                Ok(port) => port,
                Err(_) => return Err(ConfigError::InvalidPort(port)),
            },
            None => DEFAULT_SMTP_PORT,
        };

        let result = Config {
            smtp_host: optional("host").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port,
            smtp_secure: lookup("secure").as_deref() == Some("true"),
            smtp_user,
            smtp_pass,
            template_file: optional("template_file").map(PathBuf::from),
            csv_file: optional("cvs_file").map(PathBuf::from),
            email_subject: optional("email_subject"),
            email_text: optional("email_text"),
        };
        debug!("Loaded config: {result:?}");
        Ok(result)
    }
}

// Hand written so the password never ends up in the logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_secure", &self.smtp_secure)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_pass", &"********")
            .field("template_file", &self.template_file)
            .field("csv_file", &self.csv_file)
            .field("email_subject", &self.email_subject)
            .field("email_text", &self.email_text.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Loads `path` into the process environment without overriding variables that are already set
///
/// A missing file is only an error when the user asked for it explicitly
pub fn load_env_file(path: &Path, explicit: bool) -> anyhow::Result<()> {
    debug!("Loading environment from: {path:?}");
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if !explicit && e.not_found() => {
            warn!("No env file found at {path:?}, using process environment only");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load env file {path:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use rstest::rstest;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key: &str| map.get(key).map(|val| val.to_string())
    }

    #[test]
    fn defaults_applied() {
        // Arrange
        let env = [("user", "me@acme.test"), ("pass", "secret")];

        // Act
        let actual = Config::from_lookup(lookup_from(&env)).unwrap();

        // Assert
        assert_eq!(actual.smtp_host, DEFAULT_SMTP_HOST);
        assert_eq!(actual.smtp_port, 587);
        assert!(!actual.smtp_secure);
        assert_eq!(actual.template_file, None);
        assert_eq!(actual.csv_file, None);
        assert_eq!(actual.email_subject, None);
        assert_eq!(actual.email_text, None);
    }

    #[test]
    fn all_values_read() {
        // Arrange
        let env = [
            ("host", "mail.acme.test"),
            ("port", "465"),
            ("secure", "true"),
            ("user", "me@acme.test"),
            ("pass", "secret"),
            ("template_file", "tpl/welcome.html"),
            ("cvs_file", "csv/list.csv"),
            ("email_subject", "Hello"),
            ("email_text", "Hello there"),
        ];

        // Act
        let actual = Config::from_lookup(lookup_from(&env)).unwrap();

        // Assert
        assert_eq!(actual.smtp_host, "mail.acme.test");
        assert_eq!(actual.smtp_port, 465);
        assert!(actual.smtp_secure);
        assert_eq!(actual.template_file, Some(PathBuf::from("tpl/welcome.html")));
        assert_eq!(actual.csv_file, Some(PathBuf::from("csv/list.csv")));
        assert_eq!(actual.email_subject.as_deref(), Some("Hello"));
        assert_eq!(actual.email_text.as_deref(), Some("Hello there"));
    }

    #[rstest]
    #[case(&[("pass", "secret")], ConfigError::Missing("user"))]
    #[case(&[("user", ""), ("pass", "secret")], ConfigError::Missing("user"))]
    #[case(&[("user", "me@acme.test")], ConfigError::Missing("pass"))]
    #[case(&[("user", "me@acme.test"), ("pass", "")], ConfigError::Missing("pass"))]
    #[case(
        &[("user", "me@acme.test"), ("pass", "secret"), ("port", "smtp")],
        ConfigError::InvalidPort("smtp".into())
    )]
    #[case(
        &[("user", "me@acme.test"), ("pass", "secret"), ("port", "70000")],
        ConfigError::InvalidPort("70000".into())
    )]
    fn invalid(#[case] env: &[(&str, &str)], #[case] expected: ConfigError) {
        let actual = Config::from_lookup(lookup_from(env)).unwrap_err();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", false)]
    #[case("1", false)]
    #[case("false", false)]
    fn secure_flag(#[case] value: &str, #[case] expected: bool) {
        let env = [("user", "u"), ("pass", "p"), ("secure", value)];
        let actual = Config::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(actual.smtp_secure, expected);
    }

    #[test]
    fn debug_hides_password() {
        let env = [("user", "me@acme.test"), ("pass", "hunter2")];
        let config = Config::from_lookup(lookup_from(&env)).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn missing_default_env_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(&dir.path().join(".env"), false).is_ok());
    }

    #[test]
    fn missing_explicit_env_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(&dir.path().join("prod.env"), true).is_err());
    }
}
