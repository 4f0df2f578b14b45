use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::auth::AdminAuth;
use crate::config::CdnConfig;
use crate::error::{MediaError, Result};
use crate::media::{
    get_placement, Area, AssetMetadata, AssetRegistrar, Delivery, FallbackTable, PhysicalAsset,
    Placement, RawTransformOptions, Resolution, ResolutionSource, Resolver, ResourceType,
    UrlBuilder,
};
use crate::store::MediaStore;

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<dyn MediaStore>,
    pub resolver: Resolver,
    pub registrar: AssetRegistrar,
    pub urls: UrlBuilder,
    pub admin: AdminAuth,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MediaStore>,
        fallback: FallbackTable,
        cdn: CdnConfig,
        admin: AdminAuth,
    ) -> Self {
        Self {
            resolver: Resolver::new(store.clone(), Arc::new(fallback)),
            registrar: AssetRegistrar::new(store.clone()),
            urls: UrlBuilder::new(cdn),
            store,
            admin,
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_string(body) {
        Ok(json) => (status, [(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => {
            tracing::error!("JSON serialization error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn health() -> &'static str {
    "OK"
}

// ============================================================================
// Public read routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub id: String,
    #[serde(flatten)]
    pub options: RawTransformOptions,
}

#[derive(Serialize)]
struct ResolveResponse<'a> {
    id: &'a str,
    source: ResolutionSource,
    asset: &'a PhysicalAsset,
    delivery: Delivery,
}

/// GET /api/media/resolve?id=..
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResolveQuery>,
) -> Result<Response> {
    let options = query.options.parse()?;

    let resolution = match state.resolver.resolve(&query.id).await {
        Ok(resolution) => resolution,
        Err(e) => {
            if e.is_store_failure() {
                tracing::error!("store failure while resolving {}: {}", query.id, e);
            }
            return Err(e);
        }
    };

    match resolution {
        Resolution::Found(resolved) => {
            let delivery = state.urls.delivery(&resolved.asset, &options)?;
            Ok(json_response(
                StatusCode::OK,
                &ResolveResponse {
                    id: &query.id,
                    source: resolved.source,
                    asset: &resolved.asset,
                    delivery,
                },
            ))
        }
        Resolution::NotFound => Ok(json_response(
            StatusCode::NOT_FOUND,
            &serde_json::json!({ "error": "No asset for placeholder", "id": query.id }),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub public_id: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(flatten)]
    pub options: RawTransformOptions,
}

/// GET /api/media/url?public_id=..
pub async fn build_url(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UrlQuery>,
) -> Result<Response> {
    let options = query.options.parse()?;
    let resource_type = query
        .resource_type
        .as_deref()
        .map(str::parse::<ResourceType>)
        .transpose()?
        .unwrap_or_default();

    let asset = PhysicalAsset {
        resource_type,
        ..PhysicalAsset::minimal(&query.public_id)
    };
    let delivery = state.urls.delivery(&asset, &options)?;
    Ok(json_response(StatusCode::OK, &delivery))
}

/// GET /api/media/placements
pub async fn list_placements() -> Response {
    let placements: Vec<Placement> = Area::ALL.iter().copied().map(get_placement).collect();
    json_response(StatusCode::OK, &placements)
}

// ============================================================================
// Admin routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterAssetRequest {
    pub public_id: String,
    #[serde(default)]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub metadata: AssetMetadata,
}

/// POST /api/media/assets
pub async fn register_asset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RegisterAssetRequest>,
) -> Result<Response> {
    state.admin.authorize(&headers)?;
    let asset = state
        .registrar
        .register(&request.public_id, request.resource_type, request.metadata)
        .await?;
    Ok(json_response(StatusCode::OK, &asset))
}

/// GET /api/media/assets
pub async fn list_assets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response> {
    state.admin.authorize(&headers)?;
    let assets = state.store.list_assets().await?;
    Ok(json_response(StatusCode::OK, &assets))
}

#[derive(Debug, Deserialize)]
pub struct DeleteAssetQuery {
    pub public_id: String,
}

/// DELETE /api/media/assets?public_id=..
pub async fn delete_asset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DeleteAssetQuery>,
) -> Result<Response> {
    state.admin.authorize(&headers)?;
    let deleted = state.registrar.delete_asset(&query.public_id).await?;
    Ok(json_response(StatusCode::OK, &deleted))
}

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub placeholder_id: String,
    pub public_id: String,
}

/// PUT /api/media/links
pub async fn put_link(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<LinkRequest>,
) -> Result<Response> {
    state.admin.authorize(&headers)?;
    let link = state
        .registrar
        .link(&request.placeholder_id, &request.public_id)
        .await?;
    Ok(json_response(StatusCode::OK, &link))
}

#[derive(Debug, Deserialize)]
pub struct UnlinkQuery {
    pub placeholder_id: String,
}

/// DELETE /api/media/links?placeholder_id=..
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<UnlinkQuery>,
) -> Result<Response> {
    state.admin.authorize(&headers)?;
    if !state.registrar.unlink(&query.placeholder_id).await? {
        return Err(MediaError::NotFound(format!("link for {}", query.placeholder_id)));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// GET /api/media/links
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response> {
    state.admin.authorize(&headers)?;
    let links = state.store.list_links().await?;
    Ok(json_response(StatusCode::OK, &links))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    Linked,
    Fallback,
    Direct,
    Missing,
}

impl From<ResolutionSource> for CoverageStatus {
    fn from(source: ResolutionSource) -> Self {
        match source {
            ResolutionSource::Direct => CoverageStatus::Direct,
            ResolutionSource::Linked => CoverageStatus::Linked,
            ResolutionSource::Fallback => CoverageStatus::Fallback,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CoverageEntry {
    pub id: String,
    pub area: Area,
    pub page: String,
    pub section: String,
    pub status: CoverageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct CoverageReport {
    pub linked: usize,
    pub fallback: usize,
    pub missing: usize,
    pub placeholders: Vec<CoverageEntry>,
}

/// GET /api/media/coverage
///
/// Resolution source for every discovered placeholder. Placeholders still
/// served from the compatibility table are the ones that need a real link.
pub async fn coverage(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response> {
    state.admin.authorize(&headers)?;

    let rows = state.store.list_placeholders().await?;
    let mut seen = BTreeSet::new();
    let mut report = CoverageReport::default();

    for row in rows {
        let placeholder = row.placeholder;
        if !seen.insert(placeholder.id.clone()) {
            continue;
        }

        let (status, public_id) = match state.resolver.resolve(&placeholder.id).await? {
            Resolution::Found(resolved) => {
                (CoverageStatus::from(resolved.source), Some(resolved.asset.public_id))
            }
            Resolution::NotFound => (CoverageStatus::Missing, None),
        };
        match status {
            CoverageStatus::Linked | CoverageStatus::Direct => report.linked += 1,
            CoverageStatus::Fallback => report.fallback += 1,
            CoverageStatus::Missing => report.missing += 1,
        }

        report.placeholders.push(CoverageEntry {
            id: placeholder.id,
            area: placeholder.area,
            page: placeholder.page,
            section: placeholder.section,
            status,
            public_id,
        });
    }

    Ok(json_response(StatusCode::OK, &report))
}
