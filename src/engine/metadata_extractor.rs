// ==========================================
// 经纪商报价格式识别 - 元数据提取器
// ==========================================
// 职责: 按档案固定坐标读取文档级信息
// 红线: 未知经纪商返回空列表，不做启发式搜索
// 红线: 空白坐标静默跳过，不输出占位
// ==========================================

use crate::domain::metadata::MetadataField;
use crate::domain::sheet::Sheet;
use crate::engine::cell_text::render_cell_trimmed;
use crate::engine::vendor_registry::VendorProfileRegistry;
use tracing::debug;

pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn extract_metadata(sheet: &Sheet, vendor_name: &str) -> Vec<MetadataField> {
        let Some(profile) = VendorProfileRegistry::resolve(vendor_name) else {
            return Vec::new();
        };

        let fields: Vec<MetadataField> = profile
            .metadata
            .iter()
            .filter_map(|slot| {
                let value = sheet
                    .cell(slot.row, slot.column)
                    .and_then(render_cell_trimmed)?;
                Some(MetadataField::new(
                    slot.section,
                    slot.field_name,
                    value,
                    slot.row,
                    slot.column,
                ))
            })
            .collect();

        debug!(
            vendor = %vendor_name,
            profile = profile.key,
            declared = profile.metadata.len(),
            extracted = fields.len(),
            "元数据提取完成"
        );
        fields
    }
}
