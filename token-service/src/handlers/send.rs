use crate::services::record_simulated_send;
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use service_core::error::AppError;
use validator::Validate;

pub const INVALID_SEND_REQUEST: &str = "tokenIndex (number) and message (string) required";
pub const TOKEN_INDEX_NOT_FOUND: &str = "tokenIndex not found";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub token_index: Number,
    #[serde(default)]
    pub channel_id: Option<Value>,
    #[validate(length(min = 1))]
    pub message: String,
}

impl SendRequest {
    /// Parse and validate a raw request body.
    ///
    /// A missing or malformed body, a body that is not a JSON object, a
    /// non-numeric `tokenIndex` and an empty or non-string `message` all
    /// collapse into the same client error.
    pub fn parse(body: &[u8]) -> Result<Self, AppError> {
        let fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                tracing::debug!("Rejected send request body: not a JSON object");
                return Err(invalid_request());
            }
            Err(e) => {
                tracing::debug!(error = %e, "Rejected send request body");
                return Err(invalid_request());
            }
        };

        let request: SendRequest = serde_json::from_value(Value::Object(fields)).map_err(|e| {
            tracing::debug!(error = %e, "Rejected send request fields");
            invalid_request()
        })?;
        request.validate().map_err(|e| {
            tracing::debug!(error = %e, "Send request failed validation");
            invalid_request()
        })?;
        Ok(request)
    }

    /// Position in the credential list named by `tokenIndex`, if it can name one.
    pub fn credential_index(&self) -> Option<usize> {
        self.token_index
            .as_u64()
            .or_else(|| {
                self.token_index
                    .as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            })
            .and_then(|index| usize::try_from(index).ok())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub ok: bool,
    pub simulated: bool,
    pub token_index: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Value>,
    pub message: String,
}

/// Pretend to post `message` with the selected credential.
///
/// Nothing leaves the process: the send is a log line and a counter.
#[tracing::instrument(skip_all)]
pub async fn simulate_send(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SendResponse>, AppError> {
    if !has_json_content_type(&headers) {
        tracing::debug!("Rejected send request without a JSON content type");
        return Err(invalid_request());
    }
    let request = SendRequest::parse(&body)?;

    if request
        .credential_index()
        .and_then(|index| state.credentials.get(index))
        .is_none()
    {
        return Err(AppError::NotFound(anyhow::anyhow!(TOKEN_INDEX_NOT_FOUND)));
    }

    tracing::info!(
        token_index = %request.token_index,
        channel_id = ?request.channel_id,
        message = %request.message,
        "[simulate-send]"
    );
    record_simulated_send();

    Ok(Json(SendResponse {
        ok: true,
        simulated: true,
        token_index: request.token_index,
        channel_id: request.channel_id,
        message: request.message,
    }))
}

/// `application/json` or any `+json` media type, parameters ignored.
pub fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
        .is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"))
}

fn invalid_request() -> AppError {
    AppError::BadRequest(anyhow::anyhow!(INVALID_SEND_REQUEST))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<SendRequest, AppError> {
        SendRequest::parse(body.as_bytes())
    }

    #[test]
    fn accepts_numeric_index_and_message() {
        let request = parse(r#"{"tokenIndex": 0, "channelId": "c1", "message": "hi"}"#).unwrap();
        assert_eq!(request.credential_index(), Some(0));
        assert_eq!(request.channel_id, Some(Value::from("c1")));
        assert_eq!(request.message, "hi");
    }

    #[test]
    fn channel_id_is_optional() {
        let request = parse(r#"{"tokenIndex": 1, "message": "hi"}"#).unwrap();
        assert!(request.channel_id.is_none());
    }

    #[test]
    fn string_index_is_rejected() {
        assert!(matches!(
            parse(r#"{"tokenIndex": "0", "message": "hi"}"#),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn empty_or_missing_message_is_rejected() {
        assert!(matches!(
            parse(r#"{"tokenIndex": 0, "message": ""}"#),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse(r#"{"tokenIndex": 0}"#),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse(r#"{"tokenIndex": 0, "message": 5}"#),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn array_body_is_rejected() {
        assert!(matches!(
            parse(r#"[0, null, "hi"]"#),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn validation_failure_uses_request_error_message() {
        let err = parse(r#"{"tokenIndex": 0, "message": ""}"#).unwrap_err();
        assert_eq!(err.to_string(), format!("Bad request: {}", INVALID_SEND_REQUEST));
    }

    #[test]
    fn json_content_types_are_recognized() {
        let mut headers = HeaderMap::new();
        assert!(!has_json_content_type(&headers));

        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!has_json_content_type(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            "Application/JSON; charset=utf-8".parse().unwrap(),
        );
        assert!(has_json_content_type(&headers));

        headers.insert(header::CONTENT_TYPE, "application/merge-patch+json".parse().unwrap());
        assert!(has_json_content_type(&headers));
    }

    #[test]
    fn empty_body_is_rejected() {
        assert!(matches!(parse(""), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn negative_and_fractional_indexes_name_nothing() {
        assert_eq!(
            parse(r#"{"tokenIndex": -1, "message": "hi"}"#)
                .unwrap()
                .credential_index(),
            None
        );
        assert_eq!(
            parse(r#"{"tokenIndex": 1.5, "message": "hi"}"#)
                .unwrap()
                .credential_index(),
            None
        );
    }

    #[test]
    fn integral_float_index_is_usable() {
        let request = parse(r#"{"tokenIndex": 2.0, "message": "hi"}"#).unwrap();
        assert_eq!(request.credential_index(), Some(2));
    }
}
