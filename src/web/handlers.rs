use crate::{
    classify::PredictionList,
    utils::error::TarotError,
    web::{extractors::RequestId, AppState},
    Result,
};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// 上传图像所在的表单字段
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: PredictionList,
}

/// GET /predict 测试端点
pub async fn greeting_handler() -> Json<Value> {
    Json(json!({ "message": "Hello from the Tarot AI Backend!" }))
}

/// POST /predict 图像上传分类
pub async fn predict_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>> {
    let start_time = Instant::now();

    // 非multipart请求视为未上传图像
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Multipart rejected: request_id={}, {}", request_id, e);
        TarotError::MissingUpload
    })?;

    let limit = state.config.server_config.max_request_size;
    let image_data = read_image_field(&mut multipart, limit)
        .await?
        .ok_or(TarotError::MissingUpload)?;

    tracing::info!(
        "Processing upload: request_id={}, bytes={}",
        request_id,
        image_data.len()
    );

    let pipeline = Arc::clone(&state.pipeline);
    let prediction = tokio::task::spawn_blocking(move || pipeline.classify_bytes(&image_data))
        .await
        .map_err(|e| TarotError::Internal(format!("Inference task failed: {}", e)))??;

    tracing::info!(
        "Upload classified: request_id={}, labels={}, time={:.3}s",
        request_id,
        prediction.len(),
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(PredictResponse { prediction }))
}

/// 读取 `image` 文件字段，忽略其他字段、非文件字段与空文件
async fn read_image_field(multipart: &mut Multipart, limit: usize) -> Result<Option<Bytes>> {
    let mut image_data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit, "Failed to read multipart field"))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != IMAGE_FIELD {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        // 与 multer 的 single("image") 一致，只接受文件字段
        if field.file_name().is_none() {
            tracing::debug!("Ignoring non-file image field");
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit, "Failed to read file data"))?;

        if data.is_empty() {
            tracing::debug!("Ignoring empty image field");
            continue;
        }

        tracing::debug!("Received file: {} bytes", data.len());
        image_data = Some(data);
    }

    Ok(image_data)
}

/// 超出请求体限制的流错误映射为 413，其余为格式错误
fn multipart_error(error: MultipartError, limit: usize, context: &str) -> TarotError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        TarotError::UploadTooLarge(limit)
    } else {
        TarotError::InvalidInput(format!("{}: {}", context, error))
    }
}

/// 健康检查端点
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let model_loaded = state.pipeline.model().is_loaded();
    let status = if model_loaded { "healthy" } else { "degraded" };

    Json(json!({
        "status": status,
        "model_loaded": model_loaded,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 服务信息端点
pub async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "Tarot AI Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "pipeline": state.pipeline.info(),
    }))
}
