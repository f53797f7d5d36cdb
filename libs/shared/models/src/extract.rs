use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::error::AppError;

/// `axum::Json` whose rejections use the `AppError` body, so a malformed
/// field is a 400 validation error like any other.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                AppError::ValidationError(message)
            }
            _ => AppError::BadRequest(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
    };

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn wrong_field_type_is_a_validation_error() {
        let result = AppJson::<Vec<String>>::from_request(json_request("[900]"), &()).await;
        let error = result.unwrap_err();
        assert_eq!(error.code(), "validation_error");
        assert_eq!(error.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unparsable_body_is_a_validation_error() {
        let result = AppJson::<Vec<String>>::from_request(json_request("{\"startTime\": "), &()).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn missing_content_type_is_a_bad_request() {
        let request = Request::builder().method("POST").body(Body::from("[]")).unwrap();
        let result = AppJson::<Vec<String>>::from_request(request, &()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
