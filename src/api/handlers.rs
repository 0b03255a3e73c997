//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use tracing::debug;

use super::AppState;
use super::types::{AggregateResponse, ErrorResponse, FilterQuery};
use crate::analysis::filter::{FilterRequest, ResolvedFilters};
use crate::error::DashboardError;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps pipeline errors to status codes: unknown option → 400, empty
/// cascade → 404, anything else → 500.
fn api_error(e: &DashboardError) -> ApiError {
    let status = match e {
        DashboardError::UnknownOption { .. } => StatusCode::BAD_REQUEST,
        DashboardError::EmptyFilterResult(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    debug!(%status, error = %e, "request rejected");
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// Returns the cascading options and the resolved selection.
///
/// `GET /options?power_tier=&tariff=` → 200 + `ResolvedFilters` JSON
pub async fn get_options(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ResolvedFilters>, ApiError> {
    let request = FilterRequest::from(query);
    state
        .session
        .resolve(&request)
        .map(Json)
        .map_err(|e| api_error(&e))
}

/// Returns per-region sums and the grand total.
///
/// `GET /aggregate?power_tier=&tariff=&residency=` → 200 + `AggregateResponse`
pub async fn get_aggregate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<AggregateResponse>, ApiError> {
    let request = FilterRequest::from(query);
    let view = state.session.view(&request).map_err(|e| api_error(&e))?;
    Ok(Json(AggregateResponse::from(&view.result)))
}

/// Returns the choropleth for a selection.
///
/// `GET /map.svg?...` → 200 + `image/svg+xml`
pub async fn get_map(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request = FilterRequest::from(query);
    let view = state.session.view(&request).map_err(|e| api_error(&e))?;
    let svg = view
        .choropleth(&state.session.geometry, &state.style)
        .render()
        .map_err(|e| api_error(&e))?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::dashboard::Session;
    use crate::data::geometry::GeometryCollection;
    use crate::data::record::{Record, Table};
    use crate::render::svg::MapStyle;

    const GEO: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"reg_name":"Lazio"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[2,0],[2,2],[0,2],[0,0]]]}},
        {"type":"Feature","properties":{"reg_name":"Lombardia"},
         "geometry":{"type":"Polygon","coordinates":[[[2,0],[4,0],[4,2],[2,2],[2,0]]]}}]}"#;

    fn make_test_state() -> Arc<AppState> {
        let table = Table::from_records([
            Record::new("Lazio", "3kW", "TD", "Residente", 100.0),
            Record::new("Lazio", "3kW", "TD", "Residente", 50.0),
            Record::new("Lombardia", "3kW", "TD", "Residente", 30.0),
            Record::new("Lombardia", "6kW", "D2", "Non residente", 1234.5),
        ]);
        let geometry = GeometryCollection::from_geojson_str(GEO, "reg_name").unwrap();
        Arc::new(AppState {
            session: Session {
                table: Arc::new(table),
                geometry: Arc::new(geometry),
            },
            style: MapStyle::default(),
        })
    }

    async fn get(uri: &str) -> (StatusCode, Vec<u8>) {
        let app = router(make_test_state());
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn options_cascade_from_power_tier() {
        let (status, body) = get("/options?power_tier=6kW").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["options"]["power_tiers"], serde_json::json!(["3kW", "6kW"]));
        assert_eq!(json["options"]["tariffs"], serde_json::json!(["D2"]));
        assert_eq!(json["selection"]["residency"], "Non residente");
    }

    #[tokio::test]
    async fn aggregate_sums_regions() {
        let (status, body) = get("/aggregate?power_tier=3kW&tariff=TD&residency=Residente").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total"], 180.0);
        assert_eq!(json["total_formatted"], "180.00");
        assert_eq!(json["regions"][0]["region"], "Lazio");
        assert_eq!(json["regions"][0]["total_energy"], 150.0);
        assert_eq!(json["regions"][1]["total_energy"], 30.0);
    }

    #[tokio::test]
    async fn aggregate_defaults_to_first_options() {
        let (status, body) = get("/aggregate").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["selection"]["power_tier"], "3kW");
        assert_eq!(json["matched_rows"], 3);
    }

    #[tokio::test]
    async fn unknown_option_returns_400() {
        let (status, body) = get("/aggregate?power_tier=9kW").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("9kW"));
    }

    #[tokio::test]
    async fn empty_table_returns_404() {
        let state = Arc::new(AppState {
            session: Session {
                table: Arc::new(Table::default()),
                geometry: Arc::new(GeometryCollection::default()),
            },
            style: MapStyle::default(),
        });
        let req = Request::builder().uri("/options").body(Body::empty()).unwrap();
        let resp = router(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn render_failure_is_server_error() {
        let (status, Json(body)) = api_error(&DashboardError::Render("backend".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "cannot render map: backend");
    }

    #[tokio::test]
    async fn map_is_svg() {
        let app = router(make_test_state());
        let req = Request::builder()
            .uri("/map.svg?power_tier=3kW")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/svg+xml");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let svg = String::from_utf8(body.to_vec()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Lazio: 150.00 kWh"));
        assert!(svg.contains("<polygon"));
    }
}
