use std::{fmt::Display, io::Read, path::Path};

use csv::{ReaderBuilder, Trim};
use log::debug;
use serde::Deserialize;

use crate::error::{MailerError, ParseError};

const FIELD_COUNT: usize = 4;

/// One row of the recipient list
///
/// Columns are positional: `CompanyName,Person,Email,TelNo`
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub company_name: String,
    pub person_name: String,
    pub email: String,
    pub phone: String,
}

impl Recipient {
    /// Name to greet and to show in the `To` header, prefers the person over the company
    pub fn display_name(&self) -> &str {
        if self.person_name.is_empty() {
            &self.company_name
        } else {
            &self.person_name
        }
    }
}

impl Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.display_name(), self.email)
    }
}

/// Reads every recipient from the CSV file at `path`, in file order
pub async fn load_recipients(path: &Path) -> Result<Vec<Recipient>, MailerError> {
    debug!("Loading recipients from: {path:?}");
    let contents = tokio::fs::read(path)
        .await
        .map_err(|source| MailerError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    let result = parse_recipients(contents.as_slice()).map_err(|source| MailerError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded {} recipients from {path:?}", result.len());
    Ok(result)
}

/// Decodes four column rows, there is no header row so the first line is a recipient too
pub fn parse_recipients<R: Read>(reader: R) -> Result<Vec<Recipient>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut result = Vec::new();
    for record in reader.records() {
        let record = record?;
        // A line of only whitespace trims down to a single empty field
        if record.len() == 1 && record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != FIELD_COUNT {
            return Err(ParseError::FieldCount {
                line: record.position().map_or(0, |pos| pos.line()),
                found: record.len(),
            });
        }
        result.push(record.deserialize(None)?);
    }
    Ok(result)
}
