// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 默认值回退、覆盖写入、配置快照
// ==========================================


use broker_format::config::{config_keys, ConfigManager, ScanConfigReader};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use test_helpers::{create_test_db, insert_config, open_test_connection};

#[tokio::test]
async fn test_defaults_when_unset() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config = ConfigManager::new(&db_path).unwrap();

    assert_eq!(
        config.get_sample_extensions().await.unwrap(),
        vec!["xlsx", "xls", "xlsm"]
    );
    assert_eq!(config.get_format_version().await.unwrap(), "1.0");
    assert!(config
        .get_global_config_value(config_keys::FORMAT_VERSION)
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_values_written_directly_are_read_back() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    insert_config(&conn, config_keys::SAMPLE_EXTENSIONS, "XLSX, .CSV").unwrap();
    insert_config(&conn, config_keys::FORMAT_VERSION, "2024.1").unwrap();

    let config = ConfigManager::new(&db_path).unwrap();
    assert_eq!(
        config.get_sample_extensions().await.unwrap(),
        vec!["xlsx", "csv"]
    );
    assert_eq!(config.get_format_version().await.unwrap(), "2024.1");
}

#[tokio::test]
async fn test_blank_values_fall_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config = ConfigManager::new(&db_path).unwrap();

    config
        .set_config_value(config_keys::SAMPLE_EXTENSIONS, " , ")
        .unwrap();
    config.set_config_value(config_keys::FORMAT_VERSION, "   ").unwrap();

    assert_eq!(
        config.get_sample_extensions().await.unwrap(),
        vec!["xlsx", "xls", "xlsm"]
    );
    assert_eq!(config.get_format_version().await.unwrap(), "1.0");
}

#[test]
fn test_set_config_value_overwrites() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config = ConfigManager::new(&db_path).unwrap();

    config.set_config_value("format.version", "1.1").unwrap();
    config.set_config_value("format.version", "1.2").unwrap();

    assert_eq!(
        config.get_global_config_value("format.version").unwrap(),
        Some("1.2".to_string())
    );
    assert!(config.set_config_value("  ", "x").is_err());
}

#[test]
fn test_config_snapshot_is_json_object() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config = ConfigManager::new(&db_path).unwrap();
    config.set_config_value(config_keys::FORMAT_VERSION, "5.0").unwrap();
    config
        .set_config_value(config_keys::SAMPLE_EXTENSIONS, "xlsx")
        .unwrap();

    let snapshot = config.get_config_snapshot().unwrap();
    let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(value["format.version"], "5.0");
    assert_eq!(value["scan.sample_extensions"], "xlsx");
}

#[test]
fn test_from_connection_shares_existing_database() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = Connection::open(&db_path).unwrap();
    insert_config(&conn, config_keys::FORMAT_VERSION, "9.9").unwrap();

    let config = ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap();
    assert_eq!(
        config
            .get_global_config_value(config_keys::FORMAT_VERSION)
            .unwrap()
            .as_deref(),
        Some("9.9")
    );
}
