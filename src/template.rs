use std::path::Path;

use log::debug;

use crate::error::MailerError;

/// Token replaced by the recipient's display name
pub const NAME_PLACEHOLDER: &str = "{{name}}";

/// Email body loaded once and rendered per recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    /// Reads the file as is, the placeholder does not have to be present
    pub async fn load(path: &Path) -> Result<Self, MailerError> {
        debug!("Loading template from: {path:?}");
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| MailerError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self(body))
    }

    /// Replaces only the first placeholder, later ones are left untouched
    pub fn render(&self, name: &str) -> String {
        self.0.replacen(NAME_PLACEHOLDER, name, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
