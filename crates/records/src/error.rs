//! Record Gateway 错误定义

use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// 存储后端错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    /// 数据库错误
    #[cfg(feature = "backend-sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis 错误
    #[cfg(feature = "backend-redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// 连接/连接池错误
    #[error("Connection error: {0}")]
    Connection(String),

    /// 游标无效
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// 后端不可用（未编译或故障注入）
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// 存储结果类型别名
pub type StoreResult<T> = Result<T, StoreError>;

/// Record Gateway 错误类型
#[derive(Error, Debug)]
pub enum RecordError {
    /// 存储错误
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// 请求体不是合法 JSON
    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    /// JSON 序列化错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 请求体读取被拒绝（超出大小上限等）
    #[error("{message}")]
    BodyRejected { status: StatusCode, message: String },
}

impl RecordError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecordError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RecordError::BodyRejected { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RecordError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// 追加记录失败
///
/// POST 的错误体格式与 GET 不同：`{"success": false, "message": ...}`
#[derive(Debug)]
pub struct AppendError(pub RecordError);

impl From<RecordError> for AppendError {
    fn from(err: RecordError) -> Self {
        Self(err)
    }
}

impl From<BytesRejection> for AppendError {
    fn from(rejection: BytesRejection) -> Self {
        Self(RecordError::BodyRejected {
            status: rejection.status(),
            message: rejection.body_text(),
        })
    }
}

impl From<StoreError> for AppendError {
    fn from(err: StoreError) -> Self {
        Self(RecordError::Store(err))
    }
}

impl IntoResponse for AppendError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!("Append failed: {:?}", self.0);
        } else {
            tracing::warn!("Append rejected: {}", self.0);
        }

        let body = Json(json!({
            "success": false,
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Record Gateway 结果类型别名
pub type RecordResult<T> = Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_body_maps_to_bad_request() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = RecordError::InvalidBody(parse_err);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("Invalid JSON body"));
    }

    #[test]
    fn test_store_error_maps_to_internal() {
        let err = RecordError::from(StoreError::Unavailable("down".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Store error: Backend unavailable: down");
    }
}
