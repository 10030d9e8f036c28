// ==========================================
// 经纪商报价格式识别 - 数据仓储层
// ==========================================
// 职责: 识别结果的持久化
// 红线: Repository 不含识别逻辑
// ==========================================

pub mod color_archive_repo;
pub mod error;
pub mod format_repo;

// 重导出核心类型
pub use color_archive_repo::ColorArchiveRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use format_repo::FormatRepository;
