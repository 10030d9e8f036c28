// ==========================================
// 经纪商报价格式识别 - 导入层
// ==========================================
// 职责: 样本文件 → 工作表网格；经纪商目录扫描
// 支持: Excel（xlsx/xlsm 含单元格样式）, CSV
// ==========================================

// 模块声明
pub mod broker_scanner;
pub mod error;
pub mod file_parser;
pub mod xlsx_styles;

// 重导出核心类型
pub use broker_scanner::{list_broker_dirs, list_sample_files, pick_sample_file, BrokerDir};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvSheetLoader, ExcelSheetLoader, SheetLoader, UniversalSheetLoader};
