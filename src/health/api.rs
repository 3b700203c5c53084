use crate::{api::Tag, util::MessageResponse};
use poem_openapi::{payload::Json, Object, OpenApi};

/// Health status of the API
#[derive(Debug, Object, PartialEq)]
pub struct HealthStatus {
    /// Always "healthy" when the service answers
    status: String,
}

/// Struct we will build our REST API / Webserver
pub struct HealthApi;

#[OpenApi]
impl HealthApi {
    /// Root endpoint
    ///
    /// Returns a welcome message. Use this to verify the API is running.
    #[oai(path = "/", method = "get", tag = Tag::Health)]
    async fn root(&self) -> Json<MessageResponse> {
        Json(MessageResponse::new("Welcome to the API"))
    }

    /// Health check
    ///
    /// Returns the health status of the API. Use this for load balancer health checks and monitoring.
    #[oai(path = "/health", method = "get", tag = Tag::Health)]
    async fn health_check(&self) -> Json<HealthStatus> {
        Json(HealthStatus {
            status: "healthy".to_string(),
        })
    }
}
