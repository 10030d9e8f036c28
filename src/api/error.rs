// ==========================================
// 经纪商报价格式识别 - API层错误类型
// ==========================================
// 职责: 汇总加载/仓储错误，区分"跳过该经纪商"与"本次批处理失败"
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 识别不到有效列映射（调用方应跳过该经纪商）
    #[error("格式识别失败 (经纪商 {broker}): {reason}")]
    DetectionFailed { broker: String, reason: String },

    #[error("样本加载失败: {0}")]
    SampleLoadFailed(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, key } => {
                ApiError::NotFound(format!("{}({})", entity, key))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::InvalidMapping { broker, reason } => {
                ApiError::DetectionFailed { broker, reason }
            }
            other @ (RepositoryError::DatabaseQueryError(_)
            | RepositoryError::ConstraintViolation(_)
            | RepositoryError::CorruptRecord { .. }) => {
                ApiError::DatabaseError(other.to_string())
            }
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::DirectoryNotFound(path) => {
                ApiError::InvalidInput(format!("目录不存在或不是目录: {}", path))
            }
            other => ApiError::SampleLoadFailed(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
