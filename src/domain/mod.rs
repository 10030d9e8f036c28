// ==========================================
// 经纪商报价格式识别 - 领域模型层
// ==========================================
// 职责: 定义工作表网格、识别结果实体、标准字段、颜色归档实体
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod archive;
pub mod format;
pub mod mapping;
pub mod metadata;
pub mod sheet;
pub mod style;
pub mod types;

// 重导出核心类型
pub use archive::{ArchivedFile, BrokerColorSummary, FileColumnColor, QuotationInfo};
pub use format::{FormatColumn, FormatSummary};
pub use mapping::{ColumnMapping, RawHeader};
pub use metadata::MetadataField;
pub use sheet::{
    column_letter, BorderLine, Borders, Cell, CellStyle, CellValue, ColorRef, FontStyle, Sheet,
    SheetRow,
};
pub use style::CellStyleInfo;
pub use types::{DetectionStrategy, StandardField, UnknownStandardField};
