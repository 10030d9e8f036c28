// ==========================================
// 经纪商报价格式识别 - 命令行入口
// ==========================================
// 用法:
//   broker-format detect <brokers_dir> [--json]
//   broker-format save <brokers_dir> [db_path] [--json]
//   broker-format list [db_path] [--json]
//   broker-format archive <brokers_dir> [db_path] [--json]
//   broker-format archived [db_path] [--json]
//   broker-format profiles [--json]
// 未给出 db_path 时使用 BROKER_FORMAT_DB_PATH 或用户数据目录
// ==========================================

use anyhow::{bail, Context, Result};
use broker_format::api::{
    ColorArchiveApi, FileArchiveOutcome, FormatApi, FormatDetector, ScanOutcome,
};
use broker_format::config::{get_default_db_path, ConfigManager, StaticScanConfig};
use broker_format::importer::{SheetLoader, UniversalSheetLoader};
use broker_format::logging;
use broker_format::engine::VendorProfileRegistry;
use broker_format::repository::{ColorArchiveRepository, FormatRepository};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "用法:
  broker-format detect <brokers_dir> [--json]
  broker-format save <brokers_dir> [db_path] [--json]
  broker-format list [db_path] [--json]
  broker-format archive <brokers_dir> [db_path] [--json]
  broker-format archived [db_path] [--json]
  broker-format profiles [--json]";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let mut json = false;
    let mut args: Vec<String> = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            args.push(arg);
        }
    }

    let mut args = args.into_iter();
    let command = args.next().unwrap_or_default();

    tracing::info!(
        version = broker_format::VERSION,
        command = %command,
        "{}",
        broker_format::APP_NAME
    );

    match command.as_str() {
        "detect" => {
            let root = required_dir(args.next())?;
            run_detect(root, json).await
        }
        "save" => {
            let root = required_dir(args.next())?;
            let db_path = args.next().unwrap_or_else(get_default_db_path);
            run_save(root, &db_path, json).await
        }
        "list" => {
            let db_path = args.next().unwrap_or_else(get_default_db_path);
            run_list(&db_path, json)
        }
        "archive" => {
            let root = required_dir(args.next())?;
            let db_path = args.next().unwrap_or_else(get_default_db_path);
            run_archive(root, &db_path, json).await
        }
        "archived" => {
            let db_path = args.next().unwrap_or_else(get_default_db_path);
            run_archived(&db_path, json)
        }
        "profiles" => run_profiles(json),
        _ => {
            eprintln!("{}", USAGE);
            bail!("未知命令: {:?}", command);
        }
    }
}

fn required_dir(arg: Option<String>) -> Result<PathBuf> {
    match arg.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => {
            eprintln!("{}", USAGE);
            bail!("缺少经纪商根目录参数");
        }
    }
}

fn loader() -> Arc<dyn SheetLoader> {
    Arc::new(UniversalSheetLoader)
}

async fn run_detect(root: PathBuf, json: bool) -> Result<()> {
    let detector = FormatDetector::new(loader(), Arc::new(StaticScanConfig::default()));
    let results = detector
        .detect_brokers_concurrently(&root)
        .await
        .with_context(|| format!("识别目录失败: {}", root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for result in &results {
        println!("==================================================");
        match &result.outcome {
            ScanOutcome::Detected { report } => {
                println!("Sample: {}", report.sample_file);
                println!("Profile: {}", report.profile.as_deref().unwrap_or("generic"));
                print!("{}", report.mapping);
                if !report.mapping.is_valid() {
                    println!("  (未识别到有效列映射)");
                }
                if !report.metadata.is_empty() {
                    println!("Metadata:");
                    for field in &report.metadata {
                        println!("  {}", field);
                    }
                }
            }
            ScanOutcome::NoSample => println!("Broker: {}\n  (无样本文件)", result.broker),
            ScanOutcome::Failed { error } => {
                println!("Broker: {}\n  识别失败: {}", result.broker, error)
            }
        }
    }
    Ok(())
}

async fn run_save(root: PathBuf, db_path: &str, json: bool) -> Result<()> {
    tracing::info!(db = %db_path, "使用数据库");

    let config = ConfigManager::new(db_path)
        .map_err(|e| anyhow::anyhow!("配置初始化失败: {}", e))?;
    let repo = FormatRepository::new(db_path).context("打开格式仓储失败")?;
    let api = FormatApi::new(loader(), Arc::new(config), Arc::new(repo));

    let summary = api
        .save_brokers_root(&root)
        .await
        .with_context(|| format!("保存经纪商格式失败: {}", root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("batch_id={}", summary.batch_id);
        println!(
            "saved={} skipped={} failed={}",
            summary.saved, summary.skipped, summary.failed
        );
    }
    Ok(())
}

fn run_list(db_path: &str, json: bool) -> Result<()> {
    let repo = FormatRepository::new(db_path).context("打开格式仓储失败")?;
    let api = FormatApi::new(
        loader(),
        Arc::new(StaticScanConfig::default()),
        Arc::new(repo),
    );
    let overviews = api.list_formats().context("查询已保存格式失败")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overviews)?);
        return Ok(());
    }

    for overview in &overviews {
        let s = &overview.summary;
        println!(
            "[{}] {} v{} header_row={} sample={} strategy={} columns={}",
            s.format_id,
            s.broker_name,
            s.version,
            s.header_row + 1,
            s.sample_file,
            s.strategy,
            s.column_count
        );
        for column in &overview.columns {
            let header = column.original_header.as_deref().unwrap_or("N/A");
            if column.style.has_style() {
                println!(
                    "  {:<20} {} \"{}\" [{}]",
                    column.standard_field.as_str(),
                    column.column_letter,
                    header,
                    column.style
                );
            } else {
                println!(
                    "  {:<20} {} \"{}\"",
                    column.standard_field.as_str(),
                    column.column_letter,
                    header
                );
            }
        }
        for field in &overview.metadata {
            println!("  {}", field);
        }
    }
    Ok(())
}

async fn run_archive(root: PathBuf, db_path: &str, json: bool) -> Result<()> {
    tracing::info!(db = %db_path, "使用数据库");

    let config = ConfigManager::new(db_path)
        .map_err(|e| anyhow::anyhow!("配置初始化失败: {}", e))?;
    let repo = ColorArchiveRepository::new(db_path).context("打开颜色归档仓储失败")?;
    let api = ColorArchiveApi::new(loader(), Arc::new(config), Arc::new(repo));

    let summary = api
        .archive_brokers_root(&root)
        .await
        .with_context(|| format!("归档报价文件颜色失败: {}", root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for outcome in &summary.outcomes {
        match outcome {
            FileArchiveOutcome::Archived { .. } => {}
            FileArchiveOutcome::Skipped {
                broker,
                file_name,
                reason,
            } => println!("skip  {} / {}: {}", broker, file_name, reason),
            FileArchiveOutcome::Failed {
                broker,
                file_name,
                error,
            } => println!(
                "fail  {} / {}: {}",
                broker,
                file_name.as_deref().unwrap_or("-"),
                error
            ),
        }
    }
    println!("batch_id={}", summary.batch_id);
    println!(
        "archived={} skipped={} failed={}",
        summary.archived, summary.skipped, summary.failed
    );
    for broker in &summary.brokers {
        println!(
            "{:<30}: {:>3} files ({} with background colors)",
            broker.broker_name, broker.total_files, broker.files_with_background
        );
    }
    Ok(())
}

fn run_archived(db_path: &str, json: bool) -> Result<()> {
    let repo = ColorArchiveRepository::new(db_path).context("打开颜色归档仓储失败")?;
    let api = ColorArchiveApi::new(
        loader(),
        Arc::new(StaticScanConfig::default()),
        Arc::new(repo),
    );
    let files = api.list_files(None).context("查询已归档文件失败")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    for overview in &files {
        let f = &overview.file;
        println!(
            "[{}] {} / {} header_row={} vessel={} imo={} colors={}",
            f.file_id,
            f.broker_name,
            f.file_name,
            f.header_row + 1,
            f.vessel_name.as_deref().unwrap_or("-"),
            f.imo_number.as_deref().unwrap_or("-"),
            f.color_count
        );
        for color in overview.colors.iter().filter(|c| c.style.has_style()) {
            println!(
                "  {:<20} {} [{}]",
                color.standard_field.as_str(),
                color.column_letter,
                color.style
            );
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ProfileRow {
    display_name: &'static str,
    key: &'static str,
    header: String,
    rules: usize,
    metadata: usize,
}

fn run_profiles(json: bool) -> Result<()> {
    let rows: Vec<ProfileRow> = VendorProfileRegistry::profiles()
        .iter()
        .map(|p| ProfileRow {
            display_name: p.display_name,
            key: p.key,
            header: p.header.to_string(),
            rules: p.rules.len(),
            metadata: p.metadata.len(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for (priority, row) in rows.iter().enumerate() {
        println!(
            "{}. {:<12} key={:<12} header={} rules={} metadata={}",
            priority + 1,
            row.display_name,
            row.key,
            row.header,
            row.rules,
            row.metadata
        );
    }
    println!("其它经纪商: 通用关键词识别");
    Ok(())
}
