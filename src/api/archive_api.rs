// ==========================================
// 经纪商报价格式识别 - 报价文件颜色归档 API
// ==========================================
// 职责: 经纪商目录内每个报价文件 → 列映射 + 表头颜色 → 按文件归档
// 并发: 每个经纪商目录一个 spawn_blocking 任务，join_all 汇总
// 红线: 单个文件失败只记录结果，不中断该经纪商与整批
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::format_api::detect_sample;
use crate::config::ScanConfigReader;
use crate::domain::archive::{ArchivedFile, BrokerColorSummary, FileColumnColor, QuotationInfo};
use crate::importer::{list_broker_dirs, list_sample_files, BrokerDir, SheetLoader};
use crate::repository::ColorArchiveRepository;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 归档成功的文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedColors {
    pub broker: String,
    pub file_name: String,
    pub file_id: i64,
    pub color_count: usize,
    pub vessel_name: Option<String>,
    pub imo_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileArchiveOutcome {
    Archived {
        file: ArchivedColors,
    },
    Skipped {
        broker: String,
        file_name: String,
        reason: String,
    },
    /// file_name 为 None 表示整个经纪商目录读取失败
    Failed {
        broker: String,
        file_name: Option<String>,
        error: String,
    },
}

/// 整批归档汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSummary {
    pub batch_id: String,
    pub archived: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<FileArchiveOutcome>,
    /// 归档完成后的库内统计
    pub brokers: Vec<BrokerColorSummary>,
}

/// 已归档文件的完整视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedFileOverview {
    pub file: ArchivedFile,
    pub colors: Vec<FileColumnColor>,
}

/// 识别并归档单个报价文件
///
/// 映射无效返回 Skipped，不写库。
pub fn archive_file(
    loader: &dyn SheetLoader,
    repo: &ColorArchiveRepository,
    path: &Path,
    broker: &str,
    batch_id: &str,
) -> ApiResult<FileArchiveOutcome> {
    let report = detect_sample(loader, path, broker)?;
    if !report.mapping.is_valid() {
        warn!(broker = %broker, file = %report.sample_file, "跳过无效映射的文件");
        return Ok(FileArchiveOutcome::Skipped {
            broker: broker.to_string(),
            file_name: report.sample_file,
            reason: "未识别到表头或字段".to_string(),
        });
    }

    let info = QuotationInfo::from_metadata(&report.metadata);
    let (file_id, color_count) =
        repo.save_file_colors(&report.mapping, &report.sample_file, &info, Some(batch_id))?;

    Ok(FileArchiveOutcome::Archived {
        file: ArchivedColors {
            broker: broker.to_string(),
            file_name: report.sample_file,
            file_id,
            color_count,
            vessel_name: info.vessel_name,
            imo_number: info.imo_number,
        },
    })
}

/// 归档一个经纪商目录内的全部合规文件（按文件名顺序）
pub fn archive_broker_dir(
    loader: &dyn SheetLoader,
    repo: &ColorArchiveRepository,
    dir: &BrokerDir,
    extensions: &[String],
    batch_id: &str,
) -> Vec<FileArchiveOutcome> {
    let files = match list_sample_files(&dir.path, extensions) {
        Ok(files) => files,
        Err(e) => {
            error!(broker = %dir.broker_name, error = %e, "经纪商目录读取失败");
            return vec![FileArchiveOutcome::Failed {
                broker: dir.broker_name.clone(),
                file_name: None,
                error: e.to_string(),
            }];
        }
    };

    info!(broker = %dir.broker_name, files = files.len(), "开始归档经纪商文件");

    files
        .iter()
        .map(|path| {
            match archive_file(loader, repo, path, &dir.broker_name, batch_id) {
                Ok(outcome) => outcome,
                Err(e) => {
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string());
                    error!(
                        broker = %dir.broker_name,
                        file = %file_name,
                        error = %e,
                        "报价文件归档失败"
                    );
                    FileArchiveOutcome::Failed {
                        broker: dir.broker_name.clone(),
                        file_name: Some(file_name),
                        error: e.to_string(),
                    }
                }
            }
        })
        .collect()
}

// ==========================================
// ColorArchiveApi - 颜色归档
// ==========================================
pub struct ColorArchiveApi<C: ScanConfigReader> {
    loader: Arc<dyn SheetLoader>,
    config: Arc<C>,
    repo: Arc<ColorArchiveRepository>,
}

impl<C: ScanConfigReader> ColorArchiveApi<C> {
    pub fn new(
        loader: Arc<dyn SheetLoader>,
        config: Arc<C>,
        repo: Arc<ColorArchiveRepository>,
    ) -> Self {
        Self {
            loader,
            config,
            repo,
        }
    }

    /// 归档单个文件（独立批次号）
    pub fn archive_file(&self, path: &Path, broker: &str) -> ApiResult<FileArchiveOutcome> {
        if broker.trim().is_empty() {
            return Err(ApiError::InvalidInput("经纪商名称不能为空".to_string()));
        }
        let batch_id = Uuid::new_v4().to_string();
        archive_file(self.loader.as_ref(), &self.repo, path, broker, &batch_id)
    }

    /// 并发归档根目录下全部经纪商的全部报价文件
    pub async fn archive_brokers_root(&self, root: &Path) -> ApiResult<ArchiveSummary> {
        let batch_id = Uuid::new_v4().to_string();
        let extensions = self
            .config
            .get_sample_extensions()
            .await
            .map_err(|e| ApiError::ConfigError(format!("扫描扩展名: {}", e)))?;
        let dirs = list_broker_dirs(root)?;

        info!(
            batch_id = %batch_id,
            root = %root.display(),
            brokers = dirs.len(),
            "开始归档报价文件颜色"
        );

        let tasks = dirs.into_iter().map(|dir| {
            let loader = Arc::clone(&self.loader);
            let repo = Arc::clone(&self.repo);
            let extensions = extensions.clone();
            let batch_id = batch_id.clone();
            async move {
                let broker = dir.broker_name.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    archive_broker_dir(loader.as_ref(), &repo, &dir, &extensions, &batch_id)
                })
                .await;

                match joined {
                    Ok(outcomes) => outcomes,
                    Err(e) => {
                        error!(broker = %broker, error = %e, "归档任务异常退出");
                        vec![FileArchiveOutcome::Failed {
                            broker,
                            file_name: None,
                            error: format!("归档任务异常退出: {}", e),
                        }]
                    }
                }
            }
        });

        let outcomes: Vec<FileArchiveOutcome> =
            join_all(tasks).await.into_iter().flatten().collect();

        let archived = outcomes
            .iter()
            .filter(|o| matches!(o, FileArchiveOutcome::Archived { .. }))
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o, FileArchiveOutcome::Skipped { .. }))
            .count();
        let failed = outcomes.len() - archived - skipped;
        let brokers = self.repo.color_summary()?;

        info!(batch_id = %batch_id, archived, skipped, failed, "报价文件颜色归档完成");

        Ok(ArchiveSummary {
            batch_id,
            archived,
            skipped,
            failed,
            outcomes,
            brokers,
        })
    }

    /// 列出已归档文件（含列颜色）
    pub fn list_files(&self, broker: Option<&str>) -> ApiResult<Vec<ArchivedFileOverview>> {
        let files = self.repo.list_files(broker)?;
        let mut overviews = Vec::with_capacity(files.len());
        for file in files {
            let colors = self.repo.list_file_colors(file.file_id)?;
            overviews.push(ArchivedFileOverview { file, colors });
        }
        Ok(overviews)
    }

    pub fn color_summary(&self) -> ApiResult<Vec<BrokerColorSummary>> {
        Ok(self.repo.color_summary()?)
    }
}
