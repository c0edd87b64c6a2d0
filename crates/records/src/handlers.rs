//! Record Gateway HTTP 处理器

use crate::{
    config::GatewayServiceConfig,
    error::{AppendError, RecordError, RecordResult},
    keys::KeyGenerator,
    metrics::{
        ENTRIES_SKIPPED, LIST_TRUNCATED, RECORDS_APPENDED, REQUESTS_TOTAL, export_metrics,
        register_metrics,
    },
    ordering::sort_newest_first,
    storage::{KvStore, open_store},
    types::{AppendResponse, EntryOutcome, ListReport, SkipReason, WelcomePayload},
};
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Json, Request, State, rejection::BytesRejection},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 每个响应都携带的 CORS 头
pub const CORS_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

/// 网关服务状态
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<dyn KvStore>,
    keys: Arc<KeyGenerator>,
    route: String,
    welcome: Arc<WelcomePayload>,
    page_size: usize,
    max_body_bytes: usize,
    metrics_path: Option<String>,
}

impl GatewayState {
    pub fn new(store: Arc<dyn KvStore>, config: &GatewayServiceConfig) -> Self {
        let route = config.route().to_string();
        let welcome = WelcomePayload::new(config.title(), &route, config.variant.noun());

        Self {
            store,
            keys: Arc::new(KeyGenerator::new(config.key_policy)),
            welcome: Arc::new(welcome),
            route,
            page_size: config.storage.page_size.max(1),
            max_body_bytes: config.max_body_bytes.max(1),
            metrics_path: config
                .metrics
                .enable
                .then(|| config.metrics.path.clone()),
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }
}

/// 从网关配置创建 GatewayState
pub async fn create_gateway_state(
    config: &GatewayServiceConfig,
    data_dir: &Path,
) -> RecordResult<GatewayState> {
    info!(
        "Initializing record gateway: variant={:?}, route={}, backend={}",
        config.variant,
        config.route(),
        config.storage.backend.as_str()
    );

    if let Err(e) = register_metrics() {
        warn!("Metrics registration warning: {}", e);
    }

    let store = open_store(&config.storage, data_dir).await?;
    Ok(GatewayState::new(store, config))
}

/// 创建网关路由
///
/// 记录路由只接受 GET / POST，其他方法（含 HEAD）与未匹配路径都返回欢迎信息；
/// OPTIONS 在中间件中直接应答。
pub fn create_router(state: GatewayState) -> Router {
    let mut router = Router::new().route(
        &state.route,
        get(list_records_handler)
            .head(welcome_handler)
            .post(append_record_handler)
            .fallback(welcome_handler),
    );

    if let Some(path) = state.metrics_path.as_deref() {
        router = router.route(
            path,
            get(metrics_handler)
                .head(welcome_handler)
                .fallback(welcome_handler),
        );
    }

    router
        .fallback(welcome_handler)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

/// 读取单个 key
pub async fn load_entry(store: &dyn KvStore, key: &str) -> EntryOutcome {
    match store.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
            Ok(record) => EntryOutcome::Loaded(record),
            Err(e) => EntryOutcome::Skipped(SkipReason::InvalidJson(e.to_string())),
        },
        Ok(None) => EntryOutcome::Missing,
        Err(e) => EntryOutcome::Skipped(SkipReason::GetFailed(e.to_string())),
    }
}

/// 按游标遍历整个 key 空间并加载所有记录
///
/// 单个 key 失败只跳过该 key；分页调用失败则停止遍历，返回已收集的部分。
pub async fn collect_records(store: &dyn KvStore, page_size: usize) -> ListReport {
    let mut report = ListReport::default();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = match store.list(cursor.as_deref(), page_size).await {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    "Failed to list records (cursor={:?}), returning {} collected so far: {}",
                    cursor,
                    report.records.len(),
                    e
                );
                LIST_TRUNCATED.inc();
                report.truncated = true;
                break;
            }
        };
        report.pages += 1;

        for key in page.keys {
            // SCAN 类游标可能重复返回同一个 key
            if !seen.insert(key.clone()) {
                continue;
            }

            match load_entry(store, &key).await {
                EntryOutcome::Loaded(record) => report.records.push(record),
                EntryOutcome::Missing => {
                    debug!("Key {} disappeared between list and get", key);
                    report.missing += 1;
                }
                EntryOutcome::Skipped(reason) => {
                    warn!("Skipping key {}: {}", key, reason);
                    ENTRIES_SKIPPED.with_label_values(&[reason.label()]).inc();
                    report.skipped.push((key, reason));
                }
            }
        }

        match page.cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    report
}

async fn list_records_handler(State(state): State<GatewayState>) -> RecordResult<Response> {
    let report = collect_records(state.store.as_ref(), state.page_size).await;

    let mut records = report.records;
    sort_newest_first(&mut records);

    info!(
        "Listed {} records ({} pages, {} skipped, {} missing, truncated={})",
        records.len(),
        report.pages,
        report.skipped.len(),
        report.missing,
        report.truncated
    );

    let body = serde_json::to_vec(&records).map_err(RecordError::Json)?;
    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response())
}

async fn append_record_handler(
    State(state): State<GatewayState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AppendResponse>, AppendError> {
    let body = body?;
    let record: Value = serde_json::from_slice(&body).map_err(RecordError::InvalidBody)?;
    let serialized = serde_json::to_string(&record).map_err(RecordError::Json)?;

    let key = state.keys.next_key();
    state.store.put(&key, &serialized).await?;

    RECORDS_APPENDED.inc();
    info!("Stored record under key {}", key);
    Ok(Json(AppendResponse::stored(key)))
}

async fn welcome_handler(State(state): State<GatewayState>) -> Json<WelcomePayload> {
    debug!("Serving welcome payload");
    Json(state.welcome.as_ref().clone())
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4"),
        )],
        export_metrics(),
    )
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    for (name, value) in CORS_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// CORS：OPTIONS 直接以空响应应答，其余响应追加 CORS 头
async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

/// 方法标签取值固定，任意方法都会得到响应，原样记录会让序列无限增长
fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::HEAD => "HEAD",
        Method::POST => "POST",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

async fn track_requests(request: Request, next: Next) -> Response {
    let method = method_label(request.method());
    let response = next.run(request).await;
    REQUESTS_TOTAL
        .with_label_values(&[method, response.status().as_str()])
        .inc();
    response
}
