//! Institution settings form. All calls carry the stored bearer credential and
//! are meant to run behind an `AccessGate`.
//!
//! The template image is checked locally before upload: JPEG, PNG, GIF or SVG,
//! recognised by both file extension and content, and at most 2 MiB.

use super::{classify_form_failure, valid_email};
use crate::{
    client::{ApiClient, ApiResponse},
    session::{AuthError, Credential},
};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, path::Path};
use tracing::{info, instrument, warn};
use url::Url;

pub const SETTINGS_PATH: &str = "/institution/api/settings/";
pub const TEMPLATE_FIELD: &str = "template";
pub const MAX_TEMPLATE_BYTES: usize = 2 * 1024 * 1024;

pub const TEMPLATE_TOO_LARGE_MESSAGE: &str = "Template image must be 2MB or smaller.";
pub const TEMPLATE_TYPE_MESSAGE: &str = "Template must be a JPEG, PNG, GIF or SVG image.";
pub const WEBSITE_INVALID_MESSAGE: &str = "Please enter a valid website URL.";
pub const EMPTY_UPDATE_MESSAGE: &str = "Nothing to update.";

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct InstitutionSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    /// Fields this client does not know about, kept as sent.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Partial update; unset fields are left untouched on the server.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl SettingsUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.website.is_none()
    }

    /// # Errors
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.is_empty() {
            return Err(AuthError::validation("non_field_errors", EMPTY_UPDATE_MESSAGE));
        }
        if let Some(email) = &self.email {
            if !valid_email(email.trim()) {
                return Err(AuthError::validation("email", super::INVALID_EMAIL_MESSAGE));
            }
        }
        if let Some(website) = &self.website {
            let parsed = Url::parse(website.trim());
            if !parsed.is_ok_and(|url| matches!(url.scheme(), "http" | "https")) {
                return Err(AuthError::validation("website", WEBSITE_INVALID_MESSAGE));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
}

impl TemplateFormat {
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Svg => "image/svg+xml",
        }
    }

    #[must_use]
    pub fn from_extension(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name).extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Recognises the format from the leading bytes.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        let head = &bytes[..bytes.len().min(1024)];
        let text = String::from_utf8_lossy(head);
        let text = text.trim_start_matches('\u{feff}').trim_start();
        if (text.starts_with("<?xml") || text.starts_with("<svg") || text.starts_with("<!--"))
            && text.contains("<svg")
        {
            return Some(Self::Svg);
        }
        None
    }
}

/// Template image validated for upload.
#[derive(Clone, Debug)]
pub struct TemplateUpload {
    file_name: String,
    format: TemplateFormat,
    bytes: Vec<u8>,
}

impl TemplateUpload {
    /// # Errors
    /// Returns a `template` validation error when the file is too large or not
    /// a supported image, or when its content does not match its extension.
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Result<Self, AuthError> {
        if bytes.len() > MAX_TEMPLATE_BYTES {
            return Err(AuthError::validation(TEMPLATE_FIELD, TEMPLATE_TOO_LARGE_MESSAGE));
        }

        let by_name = TemplateFormat::from_extension(file_name);
        let by_content = TemplateFormat::sniff(&bytes);
        match (by_name, by_content) {
            (Some(named), Some(sniffed)) if named == sniffed => Ok(Self {
                file_name: file_name.to_string(),
                format: named,
                bytes,
            }),
            _ => Err(AuthError::validation(TEMPLATE_FIELD, TEMPLATE_TYPE_MESSAGE)),
        }
    }

    #[must_use]
    pub fn format(&self) -> TemplateFormat {
        self.format
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn into_form(self) -> Result<Form, AuthError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.format.mime())
            .map_err(|err| {
                warn!("failed to build template part: {err}");
                AuthError::NetworkError
            })?;
        Ok(Form::new().part(TEMPLATE_FIELD, part))
    }
}

/// Fetches the institution settings.
///
/// # Errors
/// Returns the categorized server or transport failure.
#[instrument(skip(api, credential))]
pub async fn fetch_settings(
    api: &ApiClient,
    credential: &Credential,
) -> Result<InstitutionSettings, AuthError> {
    let response = api
        .get_with_bearer(SETTINGS_PATH, credential.expose())
        .await
        .map_err(|err| AuthError::from_transport(&err))?;
    settings_from_response(&response)
}

/// Applies a partial update and returns the settings the server now holds.
///
/// # Errors
/// Returns a validation error before sending when the update is invalid,
/// otherwise the categorized server or transport failure.
#[instrument(skip(api, credential, update))]
pub async fn update_settings(
    api: &ApiClient,
    credential: &Credential,
    update: &SettingsUpdate,
) -> Result<InstitutionSettings, AuthError> {
    update.validate()?;

    let response = api
        .patch_json_with_bearer(SETTINGS_PATH, credential.expose(), update)
        .await
        .map_err(|err| AuthError::from_transport(&err))?;
    let settings = settings_from_response(&response)?;
    info!("institution settings updated");
    Ok(settings)
}

/// Uploads a new ID card template image.
///
/// # Errors
/// Returns the categorized server or transport failure.
#[instrument(skip(api, credential, upload), fields(size = upload.len()))]
pub async fn upload_template(
    api: &ApiClient,
    credential: &Credential,
    upload: TemplateUpload,
) -> Result<InstitutionSettings, AuthError> {
    let form = upload.into_form()?;
    let response = api
        .patch_multipart_with_bearer(SETTINGS_PATH, credential.expose(), form)
        .await
        .map_err(|err| AuthError::from_transport(&err))?;
    let settings = settings_from_response(&response)?;
    info!("institution template uploaded");
    Ok(settings)
}

fn settings_from_response(response: &ApiResponse) -> Result<InstitutionSettings, AuthError> {
    if !response.is_success() {
        return Err(classify_form_failure(response));
    }
    response.json().map_err(|err| {
        warn!("settings response could not be decoded: {err}");
        AuthError::ServerError
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn template_accepts_matching_png() {
        let upload = TemplateUpload::new("card.PNG", PNG_HEADER.to_vec()).unwrap();
        assert_eq!(upload.format(), TemplateFormat::Png);
        assert_eq!(upload.format().mime(), "image/png");
    }

    #[test]
    fn template_accepts_svg_with_xml_prolog() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        let upload = TemplateUpload::new("card.svg", svg.to_vec()).unwrap();
        assert_eq!(upload.format(), TemplateFormat::Svg);
    }

    #[test]
    fn template_rejects_oversized_file() {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.resize(MAX_TEMPLATE_BYTES + 1, 0);
        assert_eq!(
            TemplateUpload::new("card.png", bytes).unwrap_err(),
            AuthError::validation(TEMPLATE_FIELD, TEMPLATE_TOO_LARGE_MESSAGE)
        );
    }

    #[test]
    fn template_accepts_exactly_two_megabytes() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF];
        bytes.resize(MAX_TEMPLATE_BYTES, 0);
        assert!(TemplateUpload::new("card.jpeg", bytes).is_ok());
    }

    #[test]
    fn template_rejects_mismatched_or_unknown_types() {
        assert!(TemplateUpload::new("card.gif", PNG_HEADER.to_vec()).is_err());
        assert!(TemplateUpload::new("card.bmp", b"BM....".to_vec()).is_err());
        assert!(TemplateUpload::new("card.png", Vec::new()).is_err());
    }

    #[test]
    fn update_validation() {
        assert!(SettingsUpdate::default().validate().is_err());

        let bad_email = SettingsUpdate {
            email: Some("not-an-email".to_string()),
            ..SettingsUpdate::default()
        };
        assert_eq!(
            bad_email.validate().unwrap_err(),
            AuthError::validation("email", crate::forms::INVALID_EMAIL_MESSAGE)
        );

        let bad_site = SettingsUpdate {
            website: Some("ftp://uni.edu".to_string()),
            ..SettingsUpdate::default()
        };
        assert_eq!(
            bad_site.validate().unwrap_err(),
            AuthError::validation("website", WEBSITE_INVALID_MESSAGE)
        );

        let ok = SettingsUpdate {
            name: Some("State University".to_string()),
            website: Some("https://uni.edu".to_string()),
            ..SettingsUpdate::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn update_serializes_only_set_fields() {
        let update = SettingsUpdate {
            phone: Some("+1 555 0100".to_string()),
            ..SettingsUpdate::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"phone":"+1 555 0100"}"#
        );
    }

    #[test]
    fn settings_keep_unknown_fields() {
        let settings: InstitutionSettings = serde_json::from_str(
            r#"{"name": "State University", "slug": "state-u", "students": 1200}"#,
        )
        .unwrap();
        assert_eq!(settings.name.as_deref(), Some("State University"));
        assert_eq!(settings.extra.get("slug"), Some(&Value::from("state-u")));
        assert!(settings.email.is_none());
    }
}
