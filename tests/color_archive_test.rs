// ==========================================
// 报价文件颜色归档集成测试
// ==========================================
// 测试目标: 经纪商目录 → 每个 xlsx 文件识别 → 按文件归档列颜色 → 查询汇总
// ==========================================


use broker_format::api::{ApiError, ColorArchiveApi, FileArchiveOutcome};
use broker_format::config::StaticScanConfig;
use broker_format::domain::types::StandardField;
use broker_format::domain::BrokerColorSummary;
use broker_format::importer::{SheetLoader, UniversalSheetLoader};
use broker_format::repository::ColorArchiveRepository;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::{create_test_db, mctc_styled_cells, write_xlsx, xcell, FIXTURE_STYLES};

fn xlsx_config() -> Arc<StaticScanConfig> {
    Arc::new(StaticScanConfig {
        sample_extensions: vec!["xlsx".to_string()],
        format_version: "1.0".to_string(),
    })
}

fn loader() -> Arc<dyn SheetLoader> {
    Arc::new(UniversalSheetLoader)
}

fn archive_api(db_path: &str) -> ColorArchiveApi<StaticScanConfig> {
    let repo = ColorArchiveRepository::new(db_path).unwrap();
    ColorArchiveApi::new(loader(), xlsx_config(), Arc::new(repo))
}

/// 三个经纪商目录: 两个可归档文件、一个表头行缺失、一个损坏文件
fn build_archive_root(root: &Path) {
    let mctc = root.join("MCTC MARINE");
    fs::create_dir_all(&mctc).unwrap();
    let mut styled = mctc_styled_cells();
    styled.push(xcell(2, 4, "9321483", None));
    write_xlsx(&mctc.join("q1.xlsx"), &styled, Some(FIXTURE_STYLES)).unwrap();
    write_xlsx(&mctc.join("q2.xlsx"), &mctc_styled_cells(), None).unwrap();
    fs::write(mctc.join("notes.txt"), "not a quotation").unwrap();

    // GARRETS 档案要求第 24 行表头
    let garrets = root.join("GARRETS INTERNATIONAL");
    fs::create_dir_all(&garrets).unwrap();
    let short = vec![xcell(0, 0, "No.", None), xcell(0, 1, "Part No", None)];
    write_xlsx(&garrets.join("short.xlsx"), &short, None).unwrap();

    let broken = root.join("BROKEN VENDOR");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("bad.xlsx"), b"not a zip package").unwrap();
}

#[tokio::test]
async fn test_archive_brokers_root_records_every_file() {
    let root = TempDir::new().unwrap();
    build_archive_root(root.path());
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = archive_api(&db_path);

    let summary = api.archive_brokers_root(root.path()).await.unwrap();
    assert_eq!(summary.archived, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert!(uuid::Uuid::parse_str(&summary.batch_id).is_ok());

    // 经纪商目录按名称排序，目录内按文件名排序
    match &summary.outcomes[0] {
        FileArchiveOutcome::Failed {
            broker, file_name, ..
        } => {
            assert_eq!(broker, "BROKEN VENDOR");
            assert_eq!(file_name.as_deref(), Some("bad.xlsx"));
        }
        other => panic!("损坏文件应归档失败: {:?}", other),
    }
    assert!(matches!(
        &summary.outcomes[1],
        FileArchiveOutcome::Skipped { file_name, .. } if file_name == "short.xlsx"
    ));
    match &summary.outcomes[2] {
        FileArchiveOutcome::Archived { file } => {
            assert_eq!(file.file_name, "q1.xlsx");
            assert_eq!(file.vessel_name.as_deref(), Some("MV NORTHERN STAR"));
            assert_eq!(file.imo_number.as_deref(), Some("9321483"));
        }
        other => panic!("q1.xlsx 应归档成功: {:?}", other),
    }

    assert_eq!(
        summary.brokers,
        vec![BrokerColorSummary {
            broker_name: "MCTC MARINE".to_string(),
            total_files: 2,
            files_with_background: 1,
        }]
    );
}

#[tokio::test]
async fn test_archived_colors_follow_header_styles() {
    let root = TempDir::new().unwrap();
    build_archive_root(root.path());
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = archive_api(&db_path);
    api.archive_brokers_root(root.path()).await.unwrap();

    let files = api.list_files(Some("MCTC MARINE")).unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.file.file_name.as_str()).collect();
    assert_eq!(names, vec!["q1.xlsx", "q2.xlsx"]);

    let styled = &files[0];
    assert_eq!(styled.file.header_row, 9);
    assert_eq!(styled.file.background_count, 2);
    let item_code = styled
        .colors
        .iter()
        .find(|c| c.standard_field == StandardField::ItemCode)
        .unwrap();
    assert_eq!(item_code.column_letter, "A");
    assert_eq!(item_code.original_header.as_deref(), Some("MCTC'S REF NO"));
    assert_eq!(item_code.style.background_color.as_deref(), Some("#FFFF00"));
    assert!(item_code.style.is_bold);
    let price = styled
        .colors
        .iter()
        .find(|c| c.standard_field == StandardField::UnitPrice)
        .unwrap();
    assert_eq!(price.style.background_color.as_deref(), Some("#C0C0C0"));

    let plain = &files[1];
    assert_eq!(plain.file.imo_number, None);
    assert_eq!(plain.file.background_count, 0);
    assert_eq!(plain.colors.len(), styled.colors.len());
}

#[tokio::test]
async fn test_rearchive_keeps_one_record_per_file() {
    let root = TempDir::new().unwrap();
    build_archive_root(root.path());
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = archive_api(&db_path);

    let first = api.archive_brokers_root(root.path()).await.unwrap();
    let second = api.archive_brokers_root(root.path()).await.unwrap();
    assert_ne!(first.batch_id, second.batch_id);

    let files = api.list_files(None).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files
        .iter()
        .all(|f| f.file.batch_id.as_deref() == Some(second.batch_id.as_str())));
    assert_eq!(api.color_summary().unwrap()[0].total_files, 2);
}

#[test]
fn test_archive_single_file_requires_broker_name() {
    let root = TempDir::new().unwrap();
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = archive_api(&db_path);

    let result = api.archive_file(&root.path().join("q1.xlsx"), "  ");
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[test]
fn test_archive_single_file_skips_invalid_mapping() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("blank.xlsx");
    write_xlsx(&path, &[xcell(0, 0, "HELLO", None)], None).unwrap();
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = archive_api(&db_path);

    let outcome = api.archive_file(&path, "ACME FOODS").unwrap();
    assert!(matches!(outcome, FileArchiveOutcome::Skipped { .. }));
    assert!(api.list_files(None).unwrap().is_empty());
}
