use crate::db::list_query::{Page, PageMeta};
use crate::errors::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard response envelope: `{"success": true, "data": ...}`, with
/// pagination metadata on list endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: None,
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn page(page: Page<T>) -> Self {
        Self {
            success: true,
            data: Some(page.items),
            message: None,
            meta: Some(page.meta),
        }
    }
}

/// 200 with the standard envelope.
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// 201 with the standard envelope.
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// 200 for a page of results.
pub fn page_response<T: Serialize>(page: Page<T>) -> Response {
    (StatusCode::OK, Json(ApiResponse::page(page))).into_response()
}

pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input, mapping failures onto the standard 400.
pub fn validate_input<T: validator::Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))
}

/// Decode a base64 file payload (attachment endpoints).
pub fn decode_file_content(content_base64: &str) -> Result<Vec<u8>, ServiceError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(content_base64.trim())
        .map_err(|_| ServiceError::InvalidInput("content_base64 is not valid base64".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_envelope_carries_meta() {
        let page = Page {
            items: vec![1, 2, 3],
            meta: PageMeta::new(1, 25, 3),
        };
        let json = serde_json::to_value(ApiResponse::page(page)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"].as_array().unwrap().len(), 3);
        assert_eq!(json["meta"]["total"], 3);
    }

    #[test]
    fn base64_decoding_rejects_garbage() {
        assert!(decode_file_content("aGVsbG8=").is_ok());
        assert!(decode_file_content("!!not base64!!").is_err());
    }
}
