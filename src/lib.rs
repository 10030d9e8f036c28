// ==========================================
// 经纪商报价格式识别 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + calamine
// 系统定位: 从各经纪商报价样本中推断列映射、表头样式与文档元数据
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 网格与识别结果
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 格式识别
pub mod engine;

// 导入层 - 样本加载与目录扫描
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DetectionStrategy, StandardField};

// 领域实体
pub use domain::{CellStyleInfo, ColumnMapping, MetadataField, Sheet};

// 引擎
pub use engine::{ColumnMapper, MetadataExtractor, StyleExtractor, VendorProfileRegistry};

// API
pub use api::{ColorArchiveApi, FormatApi, FormatDetector};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "经纪商报价格式识别";
