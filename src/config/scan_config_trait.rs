// ==========================================
// 经纪商报价格式识别 - 扫描配置读取 Trait
// ==========================================
// 职责: 定义目录扫描/格式保存所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ScanConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表）、StaticScanConfig（内置默认值）
#[async_trait]
pub trait ScanConfigReader: Send + Sync {
    /// 获取样本文件扩展名列表（小写，不含点）
    ///
    /// # 默认值
    /// - xlsx, xls, xlsm
    async fn get_sample_extensions(&self) -> Result<Vec<String>, Box<dyn Error>>;

    /// 获取保存格式时使用的版本号
    ///
    /// # 默认值
    /// - 1.0
    async fn get_format_version(&self) -> Result<String, Box<dyn Error>>;
}
