use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Initials;

/// Path of the model update endpoint, relative to the service base endpoint.
pub const UPDATE_MODEL_PATH: &str = "/SolidWorks/update";

/// Header and query parameter that make an ngrok tunnel skip its
/// interstitial browser warning page.
pub const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";
pub const TUNNEL_BYPASS_VALUE: &str = "true";

/// File name offered when saving the generated drawing.
pub const PDF_SUGGESTED_FILENAME: &str = "Flap-Drawing.pdf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelRequest {
    pub length: f64,
    pub drawn_by: Initials,
    pub checked_by: Initials,
    pub approved: Initials,
    #[serde(with = "iso_millis")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

impl UpdateModelResponse {
    pub fn preview_path(&self) -> Option<&str> {
        non_empty(self.preview_url.as_deref())
    }

    /// The PDF path, only when the service flagged it ready and supplied it.
    pub fn ready_pdf_path(&self) -> Option<&str> {
        if self.pdf_ready != Some(true) {
            return None;
        }
        non_empty(self.pdf_url.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Timestamps as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|value| value.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn request_uses_camel_case_and_millisecond_timestamp() {
        let request = UpdateModelRequest {
            length: 125.5,
            drawn_by: Initials::new("ab"),
            checked_by: Initials::new("cd"),
            approved: Initials::new(""),
            date: Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap(),
        };

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "length": 125.5,
                "drawnBy": "AB",
                "checkedBy": "CD",
                "approved": "",
                "date": "2025-03-14T00:00:00.000Z",
            })
        );
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let body: UpdateModelResponse =
            serde_json::from_str(r#"{"message":"OK"}"#).expect("decode");
        assert_eq!(body.message, "OK");
        assert_eq!(body.preview_path(), None);
        assert_eq!(body.ready_pdf_path(), None);
    }

    #[test]
    fn pdf_path_requires_ready_flag_and_url() {
        let only_flag: UpdateModelResponse =
            serde_json::from_str(r#"{"message":"m","pdfReady":true}"#).expect("decode");
        assert_eq!(only_flag.ready_pdf_path(), None);

        let only_url: UpdateModelResponse =
            serde_json::from_str(r#"{"message":"m","pdfUrl":"/d.pdf"}"#).expect("decode");
        assert_eq!(only_url.ready_pdf_path(), None);

        let not_ready: UpdateModelResponse =
            serde_json::from_str(r#"{"message":"m","pdfReady":false,"pdfUrl":"/d.pdf"}"#)
                .expect("decode");
        assert_eq!(not_ready.ready_pdf_path(), None);

        let both: UpdateModelResponse =
            serde_json::from_str(r#"{"message":"m","pdfReady":true,"pdfUrl":"/d.pdf"}"#)
                .expect("decode");
        assert_eq!(both.ready_pdf_path(), Some("/d.pdf"));
    }

    #[test]
    fn empty_paths_count_as_absent() {
        let body: UpdateModelResponse = serde_json::from_str(
            r#"{"message":"m","previewUrl":"","pdfReady":true,"pdfUrl":""}"#,
        )
        .expect("decode");
        assert_eq!(body.preview_path(), None);
        assert_eq!(body.ready_pdf_path(), None);
    }
}
