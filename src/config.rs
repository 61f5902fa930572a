//! Dremio connection settings from the JSON properties file
//!
//! The properties file is a flat JSON object:
//!
//! ```json
//! {
//!     "access_token": "token_if_you_have_one_or_can_be_empty",
//!     "dremio_base_url": "https://your_dremio_server_domain_name",
//!     "password": "your_dremio_password",
//!     "username": "your_dremio_username",
//!     "verify_certificates": "True_or_False"
//! }
//! ```
//!
//! The file is rewritten whenever the access token is refreshed, so keys
//! this crate does not know about are carried along untouched.

use crate::dremio::error::{DremioError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Default properties file name, resolved against the working directory
pub const PROPERTY_FILENAME: &str = "dremio_api_properties.json";

pub const KEY_BASE_URL: &str = "dremio_base_url";
pub const KEY_USERNAME: &str = "username";
pub const KEY_PASSWORD: &str = "password";
pub const KEY_VERIFY_CERTIFICATES: &str = "verify_certificates";
pub const KEY_ACCESS_TOKEN: &str = "access_token";

/// Keys that must be present, in reporting order
pub const REQUIRED_KEYS: [&str; 4] = [
    KEY_BASE_URL,
    KEY_USERNAME,
    KEY_PASSWORD,
    KEY_VERIFY_CERTIFICATES,
];

/// Outcome of checking a raw properties object for required keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub missing: Vec<&'static str>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }

    fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(DremioError::MissingProperties(
                self.missing.into_iter().map(String::from).collect(),
            ))
        }
    }
}

/// Report which required keys are absent from a properties object
pub fn validate_properties(props: &Map<String, Value>) -> Validation {
    let missing = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !props.contains_key(*key))
        .collect();
    Validation { missing }
}

/// Connection settings for one Dremio server
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Current session token (None until the first login)
    pub access_token: Option<String>,
    pub verify_certificates: bool,
    /// Unrecognised keys, preserved on rewrite
    extra: Map<String, Value>,
}

impl Settings {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        verify_certificates: bool,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            access_token: None,
            verify_certificates,
            extra: Map::new(),
        }
    }

    /// Builder-style token setter
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// True when a non-empty token is stored
    pub fn has_token(&self) -> bool {
        self.access_token
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }

    /// Build settings from a parsed properties object
    pub fn from_properties(mut props: Map<String, Value>) -> Result<Self> {
        validate_properties(&props).into_result()?;

        let base_url = take_string(&mut props, KEY_BASE_URL)?;
        let username = take_string(&mut props, KEY_USERNAME)?;
        let password = take_string(&mut props, KEY_PASSWORD)?;
        let verify_certificates =
            parse_verify_flag(&take_string(&mut props, KEY_VERIFY_CERTIFICATES)?)?;

        let access_token = match props.remove(KEY_ACCESS_TOKEN) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                return Err(DremioError::Config(format!(
                    "property '{}' must be a string, found {}",
                    KEY_ACCESS_TOKEN, other
                )))
            }
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
            access_token,
            verify_certificates,
            extra: props,
        })
    }

    /// Convert back to a properties object (keys sorted by serde_json's map)
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut props = self.extra.clone();
        props.insert(KEY_BASE_URL.into(), Value::String(self.base_url.clone()));
        props.insert(KEY_USERNAME.into(), Value::String(self.username.clone()));
        props.insert(KEY_PASSWORD.into(), Value::String(self.password.clone()));
        props.insert(
            KEY_VERIFY_CERTIFICATES.into(),
            Value::String(if self.verify_certificates { "True" } else { "False" }.into()),
        );
        props.insert(
            KEY_ACCESS_TOKEN.into(),
            Value::String(self.access_token.clone().unwrap_or_default()),
        );
        props
    }
}

fn take_string(props: &mut Map<String, Value>, key: &str) -> Result<String> {
    match props.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(DremioError::Config(format!(
            "property '{}' must be a string, found {}",
            key, other
        ))),
        None => Err(DremioError::MissingProperties(vec![key.to_string()])),
    }
}

/// Parse the "True"/"False" certificate flag
///
/// Anything other than true/false (any case) is rejected rather than
/// silently meaning "verify".
pub fn parse_verify_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(DremioError::Config(format!(
            "property '{}' must be \"True\" or \"False\", found '{}'",
            KEY_VERIFY_CERTIFICATES, value
        ))),
    }
}

/// Pretty JSON with 4-space indent, sorted keys and a trailing newline
pub fn to_pretty_json(props: &Map<String, Value>) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(props, &mut ser)?;
    let mut text = String::from_utf8_lossy(&buf).into_owned();
    text.push('\n');
    Ok(text)
}

/// Template printed when the properties file is missing
pub fn properties_template() -> String {
    let mut template = Map::new();
    template.insert(
        KEY_ACCESS_TOKEN.into(),
        "token_if_you_have_one_or_can_be_empty".into(),
    );
    template.insert(
        KEY_BASE_URL.into(),
        "https://your_dremio_server_domain_name".into(),
    );
    template.insert(KEY_PASSWORD.into(), "your_dremio_password".into());
    template.insert(KEY_USERNAME.into(), "your_dremio_username".into());
    template.insert(KEY_VERIFY_CERTIFICATES.into(), "True_or_False".into());
    to_pretty_json(&template).unwrap_or_default()
}

/// Stderr text for a settings failure, or `None` for any other error
///
/// A missing file gets the usage line plus the template; missing keys get
/// one line each followed by the invalid-properties notice.
pub fn settings_failure_message(error: &DremioError) -> Option<String> {
    match error {
        DremioError::PropertiesNotFound(path) => Some(format!(
            "Error : could not find required property file {}\n  file should be formatted in json using this template:\n{}",
            path.display(),
            properties_template()
        )),
        DremioError::MissingProperties(_) => Some(format!(
            "{}\nProperties were read but were invalid. Exiting.\n",
            error
        )),
        _ => None,
    }
}

/// Where refreshed settings get written
pub trait SettingsStore {
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings backed by a JSON properties file on disk
#[derive(Debug, Clone)]
pub struct PropertiesFile {
    path: PathBuf,
}

impl PropertiesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the properties file
    pub fn load(&self) -> Result<Settings> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DremioError::PropertiesNotFound(self.path.clone()))
            }
            Err(source) => {
                return Err(DremioError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let props: Map<String, Value> = serde_json::from_str(&text)?;
        Settings::from_properties(props)
    }
}

impl SettingsStore for PropertiesFile {
    fn save(&self, settings: &Settings) -> Result<()> {
        let props = settings.to_properties();
        validate_properties(&props).into_result()?;

        let text = to_pretty_json(&props)?;
        std::fs::write(&self.path, text).map_err(|source| DremioError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!("Wrote refreshed settings to {}", self.path.display());
        Ok(())
    }
}
