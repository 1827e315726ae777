use crate::response::ApiResponse;

/// healthcheck
///
/// [Public Route] Liveness probe for load balancers and monitoring.
#[utoipa::path(
    get,
    path = "/api/v1/healthcheck",
    tag = "healthcheck",
    responses((status = 200, description = "Service is up"))
)]
pub async fn healthcheck() -> ApiResponse<&'static str> {
    ApiResponse::ok("OK", "Health check passed")
}
