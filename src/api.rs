//! REST API for the pallet layout service.
//!
//! Accepts batches of SKU rows, returns per-SKU layouts, streams progress as
//! Server-Sent Events and bundles results into a ZIP archive.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::batch::{BatchReport, pack_items, pack_items_with_progress};
use crate::config::{ApiConfig, OptimizerConfig, PalletConfig};
use crate::export::archive_bytes;
use crate::model::{Item, Overhang, Pallet, Shape, ValidationError, validate_finite};
use crate::optimizer::{
    CandidateKind, GridPlan, MAX_PLACEMENTS, PackingConfig, placement_bound, plan_grid,
};
use crate::records::{PlacementRecord, RejectionRecord, SkuLayoutRecord, SkuRecord};
use crate::summary::LayoutSummary;

#[derive(Clone)]
struct ApiState {
    pallet_config: PalletConfig,
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const ARCHIVE_FILE_NAME: &str = "pallet_layouts.zip";

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>pallet_stacker API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// SKU column as it comes out of a spreadsheet: text or a bare number.
#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum SkuValue {
    Text(String),
    Number(serde_json::Number),
}

impl SkuValue {
    fn into_name(self) -> String {
        match self {
            SkuValue::Text(text) => text,
            SkuValue::Number(number) => number.to_string(),
        }
    }
}

/// One SKU row. Keys may use the English names or the spreadsheet headers.
#[derive(Deserialize, Clone, Debug, ToSchema)]
pub struct ItemRow {
    #[serde(default, alias = "SKU")]
    #[schema(value_type = Option<String>, example = "CJ-01")]
    pub sku: Option<SkuValue>,
    /// `caja` for boxes, anything else for cylinders
    #[serde(rename = "type", alias = "Tipo")]
    #[schema(example = "caja")]
    pub kind: String,
    #[serde(alias = "Largo")]
    pub length: f64,
    /// Diameter for cylinders
    #[serde(alias = "Ancho")]
    pub width: f64,
    #[serde(alias = "Alto")]
    pub height: f64,
    #[serde(alias = "Peso")]
    pub weight: f64,
    #[serde(default, alias = "Unidades")]
    #[schema(nullable = true)]
    pub units: Option<f64>,
}

impl ItemRow {
    /// Converts the row at `index` (0-based) into an item.
    fn into_item(self, index: usize) -> Result<Item, ValidationError> {
        validate_finite(self.length, "Length")?;
        validate_finite(self.width, "Width")?;
        validate_finite(self.height, "Height")?;
        if !self.weight.is_finite() {
            return Err(ValidationError::InvalidWeight(format!(
                "Weight must be a finite number, got: {}",
                self.weight
            )));
        }

        let sku = self
            .sku
            .map(SkuValue::into_name)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("SKU_{}", index + 1));
        let units = self
            .units
            .filter(|u| u.is_finite() && *u > 0.0)
            .map_or(0, |u| u as u32);

        Ok(Item::new(
            sku,
            Shape::from_label(&self.kind),
            (self.length, self.width, self.height),
            self.weight,
        )
        .with_type_label(&self.kind)
        .with_units(units))
    }
}

/// Pallet overrides; missing fields fall back to the configured pallet.
#[derive(Deserialize, Clone, Debug, Default, ToSchema)]
pub struct PalletRequest {
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub max_height: Option<f64>,
    #[serde(default)]
    pub base_height: Option<f64>,
    #[serde(default)]
    pub max_weight: Option<f64>,
}

impl PalletRequest {
    fn resolve(self, defaults: Pallet) -> Result<Pallet, ValidationError> {
        Pallet::new(
            self.length.unwrap_or(defaults.length),
            self.width.unwrap_or(defaults.width),
            self.max_height.unwrap_or(defaults.max_height),
            self.base_height.unwrap_or(defaults.base_height),
            self.max_weight.unwrap_or(defaults.max_weight),
        )
    }
}

#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "pallet": { "length": 120.0, "width": 100.0, "max_height": 130.0, "base_height": 14.5, "max_weight": 1250.0 },
        "items": [
            { "SKU": "CJ-01", "Tipo": "Caja", "Largo": 30.0, "Ancho": 20.0, "Alto": 15.0, "Peso": 5.0, "Unidades": 140 },
            { "sku": "TB-08", "type": "cilindro", "length": 25.4, "width": 25.4, "height": 30.0, "weight": 8.0 }
        ],
        "allow_overhang": true
    })
)]
pub struct PackRequest {
    #[serde(default)]
    #[schema(nullable = true)]
    pub pallet: Option<PalletRequest>,
    pub items: Vec<ItemRow>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_overhang: Option<bool>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    pallet: Pallet,
    items: Vec<Item>,
    allow_overhang: Option<bool>,
}

impl ValidatedPackRequest {
    fn packing_config(&self, base: PackingConfig) -> PackingConfig {
        match self.allow_overhang {
            Some(allow) => PackingConfig {
                allow_overhang: allow,
                ..base
            },
            None => base,
        }
    }

    fn run(self, base: PackingConfig) -> BatchReport {
        let config = self.packing_config(base);
        pack_items(&self.pallet, self.items, &config)
    }
}

#[derive(Debug)]
enum PackRequestValidationError {
    InvalidPallet(ValidationError),
    InvalidRow {
        index: usize,
        source: ValidationError,
    },
    LayoutTooLarge {
        index: usize,
        bound: usize,
    },
}

impl PackRequest {
    fn into_validated(
        self,
        default_pallet: Pallet,
    ) -> Result<ValidatedPackRequest, PackRequestValidationError> {
        let pallet = self
            .pallet
            .unwrap_or_default()
            .resolve(default_pallet)
            .map_err(PackRequestValidationError::InvalidPallet)?;

        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                row.into_item(index)
                    .map_err(|source| PackRequestValidationError::InvalidRow { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (index, item) in items.iter().enumerate() {
            let footprint = item.footprint();
            let grid = plan_grid(&pallet, &footprint, Overhang::NONE);
            let bound = placement_bound(&pallet, &footprint, &grid);
            if bound > MAX_PLACEMENTS {
                return Err(PackRequestValidationError::LayoutTooLarge { index, bound });
            }
        }

        Ok(ValidatedPackRequest {
            pallet,
            items,
            allow_overhang: self.allow_overhang,
        })
    }
}

/// Response with one entry per accepted SKU and the rejection notices.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub pallet: Pallet,
    pub results: Vec<SkuLayoutRecord>,
    pub rejected: Vec<RejectionRecord>,
    pub is_complete: bool,
}

impl PackResponse {
    pub fn from_report(report: &BatchReport) -> Self {
        Self {
            pallet: report.pallet,
            results: report
                .results
                .iter()
                .map(SkuLayoutRecord::from_result)
                .collect(),
            rejected: report.rejected.iter().map(RejectionRecord::from).collect(),
            is_complete: report.is_complete(),
        }
    }
}

/// Configured defaults.
#[derive(Serialize, ToSchema)]
pub struct PalletInfo {
    pub pallet: Pallet,
    pub packing: PackingConfig,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
    default_pallet: Pallet,
) -> Result<ValidatedPackRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    match payload.into_validated(default_pallet) {
        Ok(validated) => Ok(validated),
        Err(PackRequestValidationError::InvalidPallet(err)) => Err(error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid pallet configuration",
            err.to_string(),
        )),
        Err(PackRequestValidationError::InvalidRow { index, source }) => Err(error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            format!("Row {}: {}", index + 1, source),
        )),
        Err(PackRequestValidationError::LayoutTooLarge { index, bound }) => Err(error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Layout too large",
            format!(
                "Row {}: up to {} placements, limit is {}",
                index + 1,
                bound,
                MAX_PLACEMENTS
            ),
        )),
    }
}

/// Runs the batch on a blocking worker.
async fn run_blocking(
    request: ValidatedPackRequest,
    config: PackingConfig,
) -> Result<BatchReport, Response> {
    tokio::task::spawn_blocking(move || request.run(config))
        .await
        .map_err(|err| {
            error!("❌ Packing task failed: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Packing failed",
                err.to_string(),
            )
        })
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream, handle_export, handle_pallet),
    components(
        schemas(
            PackRequest,
            ItemRow,
            PalletRequest,
            PackResponse,
            PalletInfo,
            ErrorResponse,
            SkuLayoutRecord,
            SkuRecord,
            PlacementRecord,
            RejectionRecord,
            LayoutSummary,
            GridPlan,
            Overhang,
            CandidateKind,
            Shape,
            Pallet,
            PackingConfig
        )
    ),
    tags((name = "pallets", description = "Endpoints for pallet layout planning"))
)]
struct ApiDoc;

/// Builds the router with all endpoints.
fn router(pallet_config: PalletConfig, optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        pallet_config,
        optimizer_config,
    };

    Router::new()
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        .route("/export", post(handle_export))
        .route("/pallet", get(handle_pallet))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and serves until it terminates.
pub async fn start_api_server(
    config: ApiConfig,
    pallet_config: PalletConfig,
    optimizer_config: OptimizerConfig,
) -> std::io::Result<()> {
    let app = router(pallet_config, optimizer_config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 API Endpoints: POST /pack, POST /pack_stream, POST /export, GET /pallet");
    info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /pack.
///
/// Lays out every row on the pallet and returns summaries and placements.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Layouts computed", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid rows or pallet configuration",
            body = ErrorResponse
        )
    ),
    tag = "pallets"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_pack_request(payload, state.pallet_config.pallet()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!("📥 New pack request: {} SKUs", request.items.len());
    let report = match run_blocking(request, state.optimizer_config.packing_config()).await {
        Ok(report) => report,
        Err(response) => return response,
    };

    let response = PackResponse::from_report(&report);
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /pack_stream (SSE).
///
/// Emits one event per SKU as soon as it is laid out, then a final `Finished` event.
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams layout events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid rows or pallet configuration",
            body = ErrorResponse
        )
    ),
    tag = "pallets"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_pack_request(payload, state.pallet_config.pallet()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let config = request.packing_config(state.optimizer_config.packing_config());
    let ValidatedPackRequest { pallet, items, .. } = request;

    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        pack_items_with_progress(&pallet, items, &config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver only means the client went away.
                let _ = tx.blocking_send(json);
            }
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /export.
///
/// Runs the batch and returns the results as a ZIP archive.
#[utoipa::path(
    post,
    path = "/export",
    request_body = PackRequest,
    responses(
        (status = 200, description = "ZIP archive with summary and layouts", content_type = "application/zip", body = Vec<u8>),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid rows or pallet configuration",
            body = ErrorResponse
        ),
        (status = INTERNAL_SERVER_ERROR, description = "Archive could not be built", body = ErrorResponse)
    ),
    tag = "pallets"
)]
async fn handle_export(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_pack_request(payload, state.pallet_config.pallet()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let report = match run_blocking(request, state.optimizer_config.packing_config()).await {
        Ok(report) => report,
        Err(response) => return response,
    };
    match archive_bytes(&report) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            error!("❌ Export failed: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Export failed",
                err.to_string(),
            )
        }
    }
}

/// Handler for GET /pallet: the configured default pallet and heuristic parameters.
#[utoipa::path(
    get,
    path = "/pallet",
    responses((status = 200, description = "Configured defaults", body = PalletInfo)),
    tag = "pallets"
)]
async fn handle_pallet(State(state): State<ApiState>) -> impl IntoResponse {
    Json(PalletInfo {
        pallet: state.pallet_config.pallet(),
        packing: state.optimizer_config.packing_config(),
    })
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
