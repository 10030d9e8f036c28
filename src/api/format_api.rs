// ==========================================
// 经纪商报价格式识别 - 格式识别与保存 API
// ==========================================
// 职责: 样本加载 → 列映射/元数据识别 → 落库 的编排
// 并发: 每个经纪商目录一个 spawn_blocking 任务，join_all 汇总
// 红线: 单个经纪商失败只记录结果，不中断整批
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ScanConfigReader;
use crate::domain::format::{FormatColumn, FormatSummary};
use crate::domain::mapping::ColumnMapping;
use crate::domain::metadata::MetadataField;
use crate::engine::{ColumnMapper, MetadataExtractor, VendorProfileRegistry};
use crate::importer::{list_broker_dirs, pick_sample_file, BrokerDir, SheetLoader};
use crate::repository::FormatRepository;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

// ==========================================
// 响应结构
// ==========================================

/// 单个样本文件的识别结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub broker: String,
    /// 样本文件名（不含目录）
    pub sample_file: String,
    /// 命中档案的展示名；None 表示通用识别
    pub profile: Option<String>,
    pub mapping: ColumnMapping,
    pub metadata: Vec<MetadataField>,
}

/// 单个经纪商目录的扫描结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    Detected { report: DetectionReport },
    /// 目录中没有合规扩展名的文件
    NoSample,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerScanResult {
    pub broker: String,
    pub outcome: ScanOutcome,
}

/// 保存成功的格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFormat {
    pub broker: String,
    pub format_id: i64,
    pub sample_file: String,
    pub column_count: usize,
    pub metadata_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrokerOutcome {
    Saved { format: SavedFormat },
    Skipped { broker: String, reason: String },
    Failed { broker: String, error: String },
}

/// 整批保存汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSummary {
    pub batch_id: String,
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<BrokerOutcome>,
}

/// 已保存格式的完整视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatOverview {
    pub summary: FormatSummary,
    pub columns: Vec<FormatColumn>,
    pub metadata: Vec<MetadataField>,
}

// ==========================================
// 识别函数（无状态，可在阻塞线程池中调用）
// ==========================================

/// 加载样本文件并识别列映射与元数据
pub fn detect_sample(
    loader: &dyn SheetLoader,
    path: &Path,
    broker: &str,
) -> ApiResult<DetectionReport> {
    let sheet = loader.load_first_sheet(path)?;
    let mapping = ColumnMapper::detect_columns(&sheet, broker);
    let metadata = MetadataExtractor::extract_metadata(&sheet, broker);

    let sample_file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    info!(
        broker = %broker,
        file = %sample_file,
        valid = mapping.is_valid(),
        fields = mapping.fields.len(),
        metadata = metadata.len(),
        "样本识别完成"
    );

    Ok(DetectionReport {
        broker: broker.to_string(),
        sample_file,
        profile: VendorProfileRegistry::display_name_for(broker).map(str::to_string),
        mapping,
        metadata,
    })
}

/// 在经纪商目录中选取样本文件并识别
pub fn detect_in_dir(
    loader: &dyn SheetLoader,
    dir: &BrokerDir,
    extensions: &[String],
) -> ApiResult<Option<DetectionReport>> {
    let Some(sample) = pick_sample_file(&dir.path, extensions)? else {
        warn!(broker = %dir.broker_name, "目录内无样本文件");
        return Ok(None);
    };
    detect_sample(loader, &sample, &dir.broker_name).map(Some)
}

// ==========================================
// FormatDetector - 只识别，不落库
// ==========================================
pub struct FormatDetector<C: ScanConfigReader> {
    loader: Arc<dyn SheetLoader>,
    config: Arc<C>,
}

impl<C: ScanConfigReader> FormatDetector<C> {
    pub fn new(loader: Arc<dyn SheetLoader>, config: Arc<C>) -> Self {
        Self { loader, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn detect_file(&self, path: &Path, broker: &str) -> ApiResult<DetectionReport> {
        if broker.trim().is_empty() {
            return Err(ApiError::InvalidInput("经纪商名称不能为空".to_string()));
        }
        detect_sample(self.loader.as_ref(), path, broker)
    }

    pub fn detect_broker_dir(
        &self,
        dir: &BrokerDir,
        extensions: &[String],
    ) -> ApiResult<Option<DetectionReport>> {
        detect_in_dir(self.loader.as_ref(), dir, extensions)
    }

    /// 读取配置中的样本扩展名
    pub async fn sample_extensions(&self) -> ApiResult<Vec<String>> {
        self.config
            .get_sample_extensions()
            .await
            .map_err(|e| ApiError::ConfigError(format!("扫描扩展名: {}", e)))
    }

    /// 并发识别根目录下的全部经纪商（结果按目录名排序）
    pub async fn detect_brokers_concurrently(
        &self,
        root: &Path,
    ) -> ApiResult<Vec<BrokerScanResult>> {
        let extensions = self.sample_extensions().await?;
        let dirs = list_broker_dirs(root)?;

        info!(root = %root.display(), brokers = dirs.len(), "开始并发识别经纪商格式");

        let tasks = dirs.into_iter().map(|dir| {
            let loader = Arc::clone(&self.loader);
            let extensions = extensions.clone();
            async move {
                let broker = dir.broker_name.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    detect_in_dir(loader.as_ref(), &dir, &extensions)
                })
                .await;

                let outcome = match joined {
                    Ok(Ok(Some(report))) => ScanOutcome::Detected { report },
                    Ok(Ok(None)) => ScanOutcome::NoSample,
                    Ok(Err(e)) => {
                        error!(broker = %broker, error = %e, "经纪商识别失败");
                        ScanOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                    Err(e) => {
                        error!(broker = %broker, error = %e, "识别任务异常退出");
                        ScanOutcome::Failed {
                            error: format!("识别任务异常退出: {}", e),
                        }
                    }
                };
                BrokerScanResult { broker, outcome }
            }
        });

        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            detected = results
                .iter()
                .filter(|r| matches!(r.outcome, ScanOutcome::Detected { .. }))
                .count(),
            "并发识别完成"
        );
        Ok(results)
    }
}

// ==========================================
// FormatApi - 识别 + 落库
// ==========================================
pub struct FormatApi<C: ScanConfigReader> {
    detector: FormatDetector<C>,
    repo: Arc<FormatRepository>,
}

impl<C: ScanConfigReader> FormatApi<C> {
    pub fn new(loader: Arc<dyn SheetLoader>, config: Arc<C>, repo: Arc<FormatRepository>) -> Self {
        Self {
            detector: FormatDetector::new(loader, config),
            repo,
        }
    }

    pub fn detector(&self) -> &FormatDetector<C> {
        &self.detector
    }

    pub fn detect_file(&self, path: &Path, broker: &str) -> ApiResult<DetectionReport> {
        self.detector.detect_file(path, broker)
    }

    pub fn detect_broker_dir(
        &self,
        dir: &BrokerDir,
        extensions: &[String],
    ) -> ApiResult<Option<DetectionReport>> {
        self.detector.detect_broker_dir(dir, extensions)
    }

    pub async fn detect_brokers_concurrently(
        &self,
        root: &Path,
    ) -> ApiResult<Vec<BrokerScanResult>> {
        self.detector.detect_brokers_concurrently(root).await
    }

    /// 保存一个识别结果（格式 + 元数据，同一事务）
    ///
    /// 无效映射返回 DetectionFailed，调用方应跳过。
    pub fn save_report(
        &self,
        report: &DetectionReport,
        version: &str,
        batch_id: &str,
    ) -> ApiResult<SavedFormat> {
        if !report.mapping.is_valid() {
            return Err(ApiError::DetectionFailed {
                broker: report.broker.clone(),
                reason: format!("样本 {} 未识别到表头或字段", report.sample_file),
            });
        }

        let (format_id, metadata_count) = self.repo.save_format_with_metadata(
            &report.mapping,
            &report.sample_file,
            version,
            Some(batch_id),
            &report.metadata,
        )?;

        info!(
            broker = %report.broker,
            file = %report.sample_file,
            format_id,
            batch_id = %batch_id,
            "经纪商格式已保存"
        );

        Ok(SavedFormat {
            broker: report.broker.clone(),
            format_id,
            sample_file: report.sample_file.clone(),
            column_count: report.mapping.fields.len(),
            metadata_count,
        })
    }

    /// 识别并保存根目录下全部经纪商
    pub async fn save_brokers_root(&self, root: &Path) -> ApiResult<SaveSummary> {
        let batch_id = Uuid::new_v4().to_string();
        let version = self
            .detector
            .config()
            .get_format_version()
            .await
            .map_err(|e| ApiError::ConfigError(format!("格式版本: {}", e)))?;

        info!(
            batch_id = %batch_id,
            version = %version,
            root = %root.display(),
            "开始保存经纪商格式"
        );

        let scans = self.detector.detect_brokers_concurrently(root).await?;

        let mut outcomes = Vec::with_capacity(scans.len());
        for scan in scans {
            let outcome = match scan.outcome {
                ScanOutcome::Detected { report } => {
                    match self.save_report(&report, &version, &batch_id) {
                        Ok(format) => BrokerOutcome::Saved { format },
                        Err(ApiError::DetectionFailed { broker, reason }) => {
                            warn!(broker = %broker, reason = %reason, "跳过无效映射");
                            BrokerOutcome::Skipped { broker, reason }
                        }
                        Err(e) => {
                            error!(broker = %scan.broker, error = %e, "格式保存失败");
                            BrokerOutcome::Failed {
                                broker: scan.broker,
                                error: e.to_string(),
                            }
                        }
                    }
                }
                ScanOutcome::NoSample => BrokerOutcome::Skipped {
                    broker: scan.broker,
                    reason: "目录内无样本文件".to_string(),
                },
                ScanOutcome::Failed { error } => BrokerOutcome::Failed {
                    broker: scan.broker,
                    error,
                },
            };
            outcomes.push(outcome);
        }

        let saved = outcomes
            .iter()
            .filter(|o| matches!(o, BrokerOutcome::Saved { .. }))
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o, BrokerOutcome::Skipped { .. }))
            .count();
        let failed = outcomes.len() - saved - skipped;

        info!(batch_id = %batch_id, saved, skipped, failed, "经纪商格式保存完成");

        Ok(SaveSummary {
            batch_id,
            saved,
            skipped,
            failed,
            outcomes,
        })
    }

    /// 列出已保存的全部格式（含列定义与元数据）
    pub fn list_formats(&self) -> ApiResult<Vec<FormatOverview>> {
        let summaries = self.repo.list_formats()?;
        let mut overviews = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let columns = self.repo.list_columns(summary.format_id)?;
            let metadata = self.repo.list_metadata(summary.format_id)?;
            overviews.push(FormatOverview {
                summary,
                columns,
                metadata,
            });
        }
        Ok(overviews)
    }
}
