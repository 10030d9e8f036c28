// ==========================================
// 经纪商报价格式识别 - 已保存格式实体
// ==========================================
// 职责: broker_format / format_column 的读取视图
// ==========================================

use crate::domain::style::CellStyleInfo;
use crate::domain::types::{DetectionStrategy, StandardField};
use serde::{Deserialize, Serialize};

/// 已保存的经纪商格式（主记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatSummary {
    pub format_id: i64,
    pub broker_id: i64,
    pub broker_name: String,
    pub version: String,
    pub header_row: i64,
    pub sample_file: String,
    pub strategy: DetectionStrategy,
    pub batch_id: Option<String>,
    pub column_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// 已保存的列定义（子记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatColumn {
    pub column_id: i64,
    pub format_id: i64,
    pub standard_field: StandardField,
    pub original_header: Option<String>,
    pub column_index: usize,
    pub column_letter: String,
    pub style: CellStyleInfo,
}
