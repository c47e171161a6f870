//! Validation utilities for HTTP DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// This extractor deserializes the request body as JSON and then validates it
/// using the `validator` crate. If validation fails, it returns a detailed
/// error response with field-level error information.
///
/// # Example
///
/// ```ignore
/// use desksync::web::dto::ValidatedJson;
///
/// async fn register(
///     ValidatedJson(payload): ValidatedJson<RegisterRequest>,
/// ) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
///     // payload is already validated
///     // ...
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::dto::{ChangeRoleRequest, RegisterRequest};
    use crate::web::error::ErrorCode;
    use axum::body::Body;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_validated_json_accepts_valid_body() {
        let ValidatedJson(req) =
            ValidatedJson::<RegisterRequest>::from_request(json_request(r#"{"email":"a@b.com"}"#), &())
                .await
                .unwrap();
        assert_eq!(req.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_validated_json_rejects_malformed_json() {
        let result =
            ValidatedJson::<RegisterRequest>::from_request(json_request("{not json"), &()).await;
        assert_eq!(result.err().unwrap().code(), ErrorCode::BadRequest);
    }

    #[tokio::test]
    async fn test_validated_json_reports_field_errors() {
        let result =
            ValidatedJson::<ChangeRoleRequest>::from_request(json_request(r#"{"role":"root"}"#), &())
                .await;
        assert_eq!(result.err().unwrap().code(), ErrorCode::ValidationError);
    }
}
