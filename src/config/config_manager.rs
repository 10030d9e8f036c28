// ==========================================
// 经纪商报价格式识别 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::scan_config_trait::ScanConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "BROKER_FORMAT_DB_PATH";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（会确保表结构存在）
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        if key.trim().is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON 格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

/// 解析逗号分隔的扩展名列表；去掉前导点并转小写
pub fn parse_extension_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[async_trait]
impl ScanConfigReader for ConfigManager {
    async fn get_sample_extensions(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let raw = self.get_config_or_default(
            config_keys::SAMPLE_EXTENSIONS,
            defaults::SAMPLE_EXTENSIONS,
        )?;
        let parsed = parse_extension_list(&raw);
        if parsed.is_empty() {
            return Ok(parse_extension_list(defaults::SAMPLE_EXTENSIONS));
        }
        Ok(parsed)
    }

    async fn get_format_version(&self) -> Result<String, Box<dyn Error>> {
        let version =
            self.get_config_or_default(config_keys::FORMAT_VERSION, defaults::FORMAT_VERSION)?;
        Ok(version.trim().to_string())
    }
}

// ==========================================
// StaticScanConfig - 内置默认配置
// ==========================================
// 无数据库配置时使用（如 detect 子命令）
#[derive(Debug, Clone)]
pub struct StaticScanConfig {
    pub sample_extensions: Vec<String>,
    pub format_version: String,
}

impl Default for StaticScanConfig {
    fn default() -> Self {
        Self {
            sample_extensions: parse_extension_list(defaults::SAMPLE_EXTENSIONS),
            format_version: defaults::FORMAT_VERSION.to_string(),
        }
    }
}

#[async_trait]
impl ScanConfigReader for StaticScanConfig {
    async fn get_sample_extensions(&self) -> Result<Vec<String>, Box<dyn Error>> {
        Ok(self.sample_extensions.clone())
    }

    async fn get_format_version(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.format_version.clone())
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 BROKER_FORMAT_DB_PATH → <data_dir>/broker-format/broker_format.db
/// → ./broker_format.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./broker_format.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("broker-format");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("broker_format.db");
        }
    }

    path.to_string_lossy().to_string()
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 目录扫描
    pub const SAMPLE_EXTENSIONS: &str = "scan.sample_extensions";

    // 格式保存
    pub const FORMAT_VERSION: &str = "format.version";
}

pub mod defaults {
    pub const SAMPLE_EXTENSIONS: &str = "xlsx,xls,xlsm";
    pub const FORMAT_VERSION: &str = "1.0";
}
