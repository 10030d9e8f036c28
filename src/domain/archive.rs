// ==========================================
// 经纪商报价格式识别 - 报价文件颜色归档实体
// ==========================================
// 职责: quotation_file / file_column_color 的读写视图
// 红线: 归档按文件记录，与 broker_format 的版本化格式互不影响
// ==========================================

use crate::domain::metadata::MetadataField;
use crate::domain::style::CellStyleInfo;
use crate::domain::types::StandardField;
use serde::{Deserialize, Serialize};

/// 船名元数据字段名（按优先顺序）
const VESSEL_FIELD_NAMES: [&str; 2] = ["Vessel Name", "Vessel"];
const IMO_FIELD_NAME: &str = "IMO Number";

/// 报价文件的船舶信息（来自元数据，缺失为 None）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationInfo {
    pub vessel_name: Option<String>,
    pub imo_number: Option<String>,
}

impl QuotationInfo {
    pub fn from_metadata(fields: &[MetadataField]) -> Self {
        let vessel_name = VESSEL_FIELD_NAMES.iter().find_map(|name| {
            fields
                .iter()
                .find(|f| f.field_name == *name)
                .map(|f| f.value.clone())
        });
        let imo_number = fields
            .iter()
            .find(|f| f.field_name == IMO_FIELD_NAME)
            .map(|f| f.value.clone());

        Self {
            vessel_name,
            imo_number,
        }
    }
}

/// 已归档的报价文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedFile {
    pub file_id: i64,
    pub broker_id: i64,
    pub broker_name: String,
    pub file_name: String,
    pub header_row: i64,
    pub vessel_name: Option<String>,
    pub imo_number: Option<String>,
    pub batch_id: Option<String>,
    pub color_count: i64,
    /// 有背景色的列数
    pub background_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// 归档文件中一列的颜色记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileColumnColor {
    pub color_id: i64,
    pub file_id: i64,
    pub standard_field: StandardField,
    pub original_header: Option<String>,
    pub column_index: usize,
    pub column_letter: String,
    pub style: CellStyleInfo,
}

/// 按经纪商汇总的归档统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerColorSummary {
    pub broker_name: String,
    pub total_files: i64,
    /// 至少一列带背景色的文件数
    pub files_with_background: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotation_info_prefers_vessel_name() {
        let fields = vec![
            MetadataField::new("Request", "Vessel", "MV OLD", 8, 2),
            MetadataField::new("Header", "Vessel Name", "MV NORTHERN STAR", 1, 4),
            MetadataField::new("Header", "IMO Number", "9321483", 2, 4),
        ];
        let info = QuotationInfo::from_metadata(&fields);
        assert_eq!(info.vessel_name.as_deref(), Some("MV NORTHERN STAR"));
        assert_eq!(info.imo_number.as_deref(), Some("9321483"));
    }

    #[test]
    fn test_quotation_info_missing_fields() {
        let fields = vec![MetadataField::new("RFQ Information", "RFQ No", "R-1", 1, 14)];
        assert_eq!(QuotationInfo::from_metadata(&fields), QuotationInfo::default());
    }
}
