use poem::{
    http::{header, StatusCode},
    web::Json,
    IntoResponse, Response,
};
use poem_openapi::error::{
    AuthorizationError, ParseMultipartError, ParseParamError, ParsePathError,
    ParseRequestPayloadError,
};
use serde::Serialize;

/// Body of every error the service sends back
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Render any error as `{"detail": ...}`, keeping its status.
///
/// Requests whose body or parameters cannot be parsed are unprocessable, the
/// same as requests that fail field validation.
pub async fn error_detail(err: poem::Error) -> Response {
    let status = if is_parse_error(&err) {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        err.status()
    };

    // Failed security checks all read the same to the caller
    let detail = if err.is::<AuthorizationError>() {
        "Could not validate credentials".to_string()
    } else {
        err.to_string()
    };

    let response = Json(ErrorDetail { detail }).with_status(status);

    if status == StatusCode::UNAUTHORIZED {
        response
            .with_header(header::WWW_AUTHENTICATE, "Bearer")
            .into_response()
    } else {
        response.into_response()
    }
}

/// Did the request fail to parse into the shape an endpoint expects?
fn is_parse_error(err: &poem::Error) -> bool {
    err.is::<ParseRequestPayloadError>()
        || err.is::<ParseParamError>()
        || err.is::<ParsePathError>()
        || err.is::<ParseMultipartError>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Plain errors keep their message and status
    #[tokio::test]
    async fn test_error_detail() {
        let err = poem::Error::from_string("Item not found", StatusCode::NOT_FOUND);

        let response = error_detail(err).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());

        let body = response.into_body().into_string().await.unwrap();
        assert_eq!(body, r#"{"detail":"Item not found"}"#);
    }

    /// Unauthorized errors ask for a bearer token
    #[tokio::test]
    async fn test_error_detail_unauthorized() {
        let err = poem::Error::from_string(
            "Incorrect username or password",
            StatusCode::UNAUTHORIZED,
        );

        let response = error_detail(err).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    /// Failed security checks get a uniform message
    #[tokio::test]
    async fn test_error_detail_authorization() {
        let err = poem::Error::from(AuthorizationError);

        let response = error_detail(err).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().into_string().await.unwrap();
        assert_eq!(body, r#"{"detail":"Could not validate credentials"}"#);
    }

    /// Payloads that do not parse are unprocessable
    #[tokio::test]
    async fn test_error_detail_parse_payload() {
        let err = poem::Error::from(ParseRequestPayloadError {
            reason: "missing field `price`".to_string(),
        });

        let response = error_detail(err).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    /// Path parameters that do not parse are unprocessable
    #[tokio::test]
    async fn test_error_detail_parse_path() {
        let err = poem::Error::from(ParsePathError {
            name: "item_id",
            reason: "failed to parse \"integer(int64)\"".to_string(),
        });

        let response = error_detail(err).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
