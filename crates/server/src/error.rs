use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use imei_ocr::ExtractError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Request-level failure. Each variant maps to one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("{0}")]
    ExtractionFailed(String),
    #[error("Extraction did not finish within {0} seconds")]
    Timeout(u64),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::ExtractionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        match &e {
            ExtractError::UnsupportedMediaType(_) => ApiError::UnsupportedMediaType(format!(
                "{e}. Upload a PDF or an image (PNG, JPEG, TIFF, BMP, GIF, WebP)."
            )),
            ExtractError::ExtractionFailed(_) => ApiError::ExtractionFailed(e.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::BadRequest(e.body_text())
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { detail: self.to_string() };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imei_core::MediaKind;
    use imei_ocr::{ExtractionFailure, OcrError};

    #[test]
    fn extract_errors_map_to_distinct_statuses() {
        let unsupported: ApiError =
            ExtractError::from(MediaKind::classify("a.txt", Some("text/plain")).unwrap_err()).into();
        let failed: ApiError = ExtractError::from(ExtractionFailure::from(OcrError::NotAvailable(
            "tesseract".into(),
        )))
        .into();
        assert_eq!(unsupported.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(failed.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(failed.to_string().contains("tesseract"));
    }

    #[test]
    fn timeout_message_names_the_limit() {
        let e = ApiError::Timeout(30);
        assert_eq!(e.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(e.to_string(), "Extraction did not finish within 30 seconds");
    }
}
