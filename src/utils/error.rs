use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// 返回给客户端的通用失败信息
pub const PROCESSING_FAILED: &str = "Error processing image";

#[derive(Error, Debug)]
pub enum TarotError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model is not loaded")]
    ModelUnavailable,

    #[error("No image uploaded")]
    MissingUpload,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Upload exceeds the request body limit of {0} bytes")]
    UploadTooLarge(usize),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Image buffer encoding failed: {0}")]
    BufferEncode(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl TarotError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TarotError::MissingUpload => StatusCode::BAD_REQUEST,
            TarotError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TarotError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            TarotError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            TarotError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            TarotError::ModelUnavailable => "MODEL_UNAVAILABLE",
            TarotError::MissingUpload => "MISSING_UPLOAD",
            TarotError::InvalidInput(_) => "INVALID_INPUT",
            TarotError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            TarotError::UploadTooLarge(_) => "UPLOAD_TOO_LARGE",
            TarotError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            TarotError::BufferEncode(_) => "BUFFER_ENCODE_ERROR",
            TarotError::Inference(_) => "INFERENCE_ERROR",
            TarotError::Config(_) => "CONFIG_ERROR",
            TarotError::Io(_) => "IO_ERROR",
            TarotError::Json(_) => "JSON_ERROR",
            TarotError::Ort(_) => "ORT_ERROR",
            TarotError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 客户端可见的错误信息，流水线内部失败统一为同一条消息
    pub fn client_message(&self) -> &'static str {
        match self {
            TarotError::MissingUpload => "No image uploaded",
            TarotError::InvalidInput(_) => "Invalid upload",
            TarotError::FileTooLarge(_, _) | TarotError::UploadTooLarge(_) => "Image too large",
            _ => PROCESSING_FAILED,
        }
    }
}

impl IntoResponse for TarotError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": self.client_message(),
        });

        if status.is_server_error() {
            tracing::error!("Request failed: {} [{}] ({})", self, self.error_code(), status);
        } else {
            tracing::warn!("Request rejected: {} [{}] ({})", self, self.error_code(), status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_status() {
        assert_eq!(TarotError::MissingUpload.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            TarotError::FileTooLarge(10, 5).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(TarotError::MissingUpload.client_message(), "No image uploaded");
        assert_eq!(
            TarotError::UploadTooLarge(256).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(TarotError::UploadTooLarge(256).client_message(), "Image too large");
    }

    #[test]
    fn pipeline_failures_collapse_to_one_message() {
        let failures = [
            TarotError::ModelUnavailable,
            TarotError::BufferEncode("jpeg".into()),
            TarotError::Inference("shape".into()),
            TarotError::ModelLoad("missing".into()),
        ];

        for err in failures {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.client_message(), PROCESSING_FAILED);
        }
    }

    #[test]
    fn decode_errors_map_from_image_crate() {
        let err: TarotError = image::load_from_memory(b"not an image").unwrap_err().into();
        assert_eq!(err.error_code(), "IMAGE_DECODE_ERROR");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
