// ==========================================
// 经纪商报价格式识别 - API层
// ==========================================
// 职责: 识别 / 保存 / 归档 / 查询的业务接口，供 CLI 调用
// ==========================================

pub mod archive_api;
pub mod error;
pub mod format_api;

pub use archive_api::{
    archive_broker_dir, archive_file, ArchiveSummary, ArchivedColors, ArchivedFileOverview,
    ColorArchiveApi, FileArchiveOutcome,
};
pub use error::{ApiError, ApiResult};
pub use format_api::{
    detect_in_dir, detect_sample, BrokerOutcome, BrokerScanResult, DetectionReport,
    FormatApi, FormatDetector, FormatOverview, SaveSummary, SavedFormat, ScanOutcome,
};
