// ==========================================
// 经纪商报价格式识别 - 引擎层
// ==========================================
// 职责: 格式识别核心（档案匹配 / 通用探测 / 样式提取 / 元数据提取）
// 红线: 引擎不做 I/O，不拼 SQL，不返回错误
// 红线: 无跨调用的可变共享状态，可被多线程并发调用
// ==========================================

pub mod cell_text;
pub mod column_mapper;
pub mod generic_detector;
pub mod metadata_extractor;
pub mod style_extractor;
pub mod vendor_registry;

// 重导出核心引擎
pub use column_mapper::ColumnMapper;
pub use generic_detector::GenericDetector;
pub use metadata_extractor::MetadataExtractor;
pub use style_extractor::StyleExtractor;
pub use vendor_registry::{VendorProfile, VendorProfileRegistry};
