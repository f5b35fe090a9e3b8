use crate::server::service::error::ApiError;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// JSON request body whose rejections use the `{ success, message }` envelope.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    pub key: String,
    /// Date to render `{DATE}` tokens with. Defaults to now.
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub key: String,
}

/// Body of both serial-number endpoints and of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SerialResponse {
    /// Previews never consume a number, so `usedNumber` is always 0.
    pub fn preview(generated: String) -> Self {
        Self {
            success: true,
            generated: Some(generated),
            used_number: Some(0),
            message: None,
        }
    }

    pub fn generated(generated: String, used_number: u64) -> Self {
        Self {
            success: true,
            generated: Some(generated),
            used_number: Some(used_number),
            message: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            generated: None,
            used_number: None,
            message: Some(message),
        }
    }
}

/// Parses a request date.
///
/// Accepts RFC 3339 (rendered in the offset it carries), a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` timestamp, or a bare `YYYY-MM-DD` date at
/// midnight. Blank input means "now" and yields `Ok(None)`.
pub fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDateTime>, String> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.naive_local()));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(at));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Some)
        .ok_or_else(|| format!("unrecognized date `{raw}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn accepts_supported_date_shapes() {
        let rfc = parse_date(Some("2025-03-04T23:30:00+09:00")).unwrap().unwrap();
        assert_eq!((rfc.day(), rfc.hour()), (4, 23));

        let naive = parse_date(Some("2025-03-04T08:15:30.250")).unwrap().unwrap();
        assert_eq!((naive.minute(), naive.second()), (15, 30));

        let date = parse_date(Some(" 2025-03-04 ")).unwrap().unwrap();
        assert_eq!((date.year(), date.month(), date.hour()), (2025, 3, 0));
    }

    #[test]
    fn blank_means_now() {
        assert_eq!(parse_date(None), Ok(None));
        assert_eq!(parse_date(Some("  ")), Ok(None));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_date(Some("04/03/2025")).is_err());
        assert!(parse_date(Some("2025-02-30")).is_err());
    }

    #[test]
    fn omits_absent_fields() {
        let body = serde_json::to_value(SerialResponse::failure("gone".into())).unwrap();
        assert_eq!(body, serde_json::json!({ "success": false, "message": "gone" }));

        let body = serde_json::to_value(SerialResponse::preview("A-001".into())).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "success": true, "generated": "A-001", "usedNumber": 0 })
        );
    }
}
