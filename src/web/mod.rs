pub mod extractors;
pub mod handlers;
pub mod middleware;

use crate::{classify::InferencePipeline, utils::error::TarotError, Config, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

/// 请求处理器共享的只读状态
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<InferencePipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: InferencePipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 模型加载失败时以降级状态继续启动
    let pipeline = InferencePipeline::from_config(&config)?;
    let addr = config.socket_addr()?;

    let app = create_app(AppState::new(config, pipeline));

    tracing::info!("API endpoints:");
    tracing::info!("  GET  /predict   - Greeting");
    tracing::info!("  POST /predict   - Multipart image upload (field: image)");
    tracing::info!("  GET  /health    - Health check");
    tracing::info!("  GET  /api/info  - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        TarotError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    tracing::info!("Tarot AI Server Running on Port {}", addr.port());

    axum::serve(listener, app)
        .await
        .map_err(|e| TarotError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = state.config.server_config.clone();

    Router::new()
        .route(
            "/predict",
            get(handlers::greeting_handler).post(handlers::predict_handler),
        )
        .route("/health", get(handlers::health_handler))
        .route("/api/info", get(handlers::info_handler))
        // 超限在 multipart 读取时报错，由处理器统一返回 JSON 413
        .layer(DefaultBodyLimit::max(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
