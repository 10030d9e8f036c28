// ==========================================
// 经纪商报价格式识别 - 配置层
// ==========================================
// 职责: 扫描与保存相关配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod scan_config_trait;

// 重导出核心配置管理器
pub use config_manager::{
    config_keys, get_default_db_path, ConfigManager, StaticScanConfig, DB_PATH_ENV,
};
pub use scan_config_trait::ScanConfigReader;
