use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::info;
use url::Url;

use crate::error::TimeOffError;

/// Build a CORS layer admitting only `origins`, with credentials and any
/// method or header. Methods and headers are mirrored from the preflight
/// because wildcards are not allowed alongside credentials.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, TimeOffError> {
    if origins.is_empty() {
        return Err(TimeOffError::Config(
            "CORS_ORIGINS must name at least one origin".to_string(),
        ));
    }

    let allowed = origins
        .iter()
        .map(|raw| parse_origin(raw))
        .collect::<Result<Vec<_>, _>>()?;
    info!(origins = ?origins, "CORS allow-list configured");

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Normalize `raw` to the `scheme://host[:port]` form browsers send in `Origin`.
fn parse_origin(raw: &str) -> Result<HeaderValue, TimeOffError> {
    let url = Url::parse(raw)
        .map_err(|e| TimeOffError::Config(format!("invalid CORS origin `{raw}`: {e}")))?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(TimeOffError::Config(format!(
            "CORS origin `{raw}` has no host"
        )));
    }
    HeaderValue::from_str(&origin.ascii_serialization())
        .map_err(|e| TimeOffError::Config(format!("invalid CORS origin `{raw}`: {e}")))
}
