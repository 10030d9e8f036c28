// ==========================================
// 经纪商报价格式识别 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 + busy_timeout）
// - 建库脚本集中在 init_schema，可重复执行
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// foreign_keys 与 busy_timeout 都需要每个连接单独配置。
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS broker (
            broker_id INTEGER PRIMARY KEY AUTOINCREMENT,
            broker_name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS broker_format (
            format_id INTEGER PRIMARY KEY AUTOINCREMENT,
            broker_id INTEGER NOT NULL REFERENCES broker(broker_id) ON DELETE CASCADE,
            version TEXT NOT NULL,
            header_row INTEGER NOT NULL,
            sample_file TEXT NOT NULL,
            detection_strategy TEXT NOT NULL,
            batch_id TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(broker_id, version)
        );

        CREATE TABLE IF NOT EXISTS format_column (
            column_id INTEGER PRIMARY KEY AUTOINCREMENT,
            format_id INTEGER NOT NULL REFERENCES broker_format(format_id) ON DELETE CASCADE,
            standard_field TEXT NOT NULL,
            original_header TEXT,
            column_index INTEGER NOT NULL,
            column_letter TEXT NOT NULL,
            background_color TEXT,
            foreground_color TEXT,
            is_bold INTEGER NOT NULL DEFAULT 0,
            is_italic INTEGER NOT NULL DEFAULT 0,
            has_border INTEGER NOT NULL DEFAULT 0,
            UNIQUE(format_id, standard_field)
        );

        CREATE INDEX IF NOT EXISTS idx_format_column_format
          ON format_column(format_id, column_index);

        CREATE TABLE IF NOT EXISTS broker_metadata (
            metadata_id INTEGER PRIMARY KEY AUTOINCREMENT,
            format_id INTEGER NOT NULL REFERENCES broker_format(format_id) ON DELETE CASCADE,
            section TEXT NOT NULL,
            field_name TEXT NOT NULL,
            field_value TEXT NOT NULL,
            source_row INTEGER NOT NULL,
            source_column INTEGER NOT NULL,
            column_letter TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_broker_metadata_format
          ON broker_metadata(format_id);

        CREATE TABLE IF NOT EXISTS quotation_file (
            file_id INTEGER PRIMARY KEY AUTOINCREMENT,
            broker_id INTEGER NOT NULL REFERENCES broker(broker_id) ON DELETE CASCADE,
            file_name TEXT NOT NULL,
            header_row INTEGER NOT NULL,
            vessel_name TEXT,
            imo_number TEXT,
            batch_id TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(broker_id, file_name)
        );

        CREATE TABLE IF NOT EXISTS file_column_color (
            color_id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id INTEGER NOT NULL REFERENCES quotation_file(file_id) ON DELETE CASCADE,
            standard_field TEXT NOT NULL,
            original_header TEXT,
            column_index INTEGER NOT NULL,
            column_letter TEXT NOT NULL,
            background_color TEXT,
            foreground_color TEXT,
            is_bold INTEGER NOT NULL DEFAULT 0,
            is_italic INTEGER NOT NULL DEFAULT 0,
            has_border INTEGER NOT NULL DEFAULT 0,
            UNIQUE(file_id, standard_field)
        );

        CREATE INDEX IF NOT EXISTS idx_file_column_color_file
          ON file_column_color(file_id, column_index);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN \
                 ('broker','broker_format','format_column','broker_metadata','config_kv', \
                 'quotation_file','file_column_color')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 7);
    }
}
