// ==========================================
// 经纪商报价格式识别 - 仓储层错误类型
// ==========================================
// 红线: 无效映射在写库前拒绝，不产生半条记录
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity} 不存在: {key}")]
    NotFound { entity: String, key: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    /// 唯一键或外键冲突（如元数据指向不存在的格式）
    #[error("约束冲突: {0}")]
    ConstraintViolation(String),

    #[error("经纪商 {broker} 的列映射无效: {reason}")]
    InvalidMapping { broker: String, reason: String },

    /// 库内值无法还原为领域类型（如未知的标准字段名）
    #[error("存储数据无法解析 (第 {column} 列): {detail}")]
    CorruptRecord { column: usize, detail: String },
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == ErrorCode::ConstraintViolation =>
            {
                RepositoryError::ConstraintViolation(
                    msg.clone().unwrap_or_else(|| err.to_string()),
                )
            }
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
                RepositoryError::CorruptRecord {
                    column,
                    detail: source.to_string(),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "记录".to_string(),
                key: "-".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_constraint_failure_maps_to_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT PRIMARY KEY); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: RepositoryError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(
            matches!(err, RepositoryError::ConstraintViolation(msg) if msg.contains("UNIQUE"))
        );
    }

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err: RepositoryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
