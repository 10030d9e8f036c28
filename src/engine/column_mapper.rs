// ==========================================
// 经纪商报价格式识别 - 列映射引擎
// ==========================================
// 职责: (工作表, 经纪商名) → ColumnMapping
// 流程: 解析档案 → 固定表头行 / 通用探测选行 → 逐列套用规则 → 采集样式
// 红线: 不返回错误；识别失败时返回无效映射，由调用方跳过该文件
// 红线: 同一列只取第一条命中规则；后出现的列会覆盖已分配的同名字段
// ==========================================

use crate::domain::mapping::{ColumnMapping, RawHeader};
use crate::domain::sheet::Sheet;
use crate::domain::types::DetectionStrategy;
use crate::engine::cell_text::{normalize_header, render_cell};
use crate::engine::generic_detector::GenericDetector;
use crate::engine::style_extractor::StyleExtractor;
use crate::engine::vendor_registry::{
    first_matching_rule, FieldRule, HeaderLocator, VendorProfileRegistry, GENERIC_RULES,
    GENERIC_SCAN_WIDTH,
};
use tracing::{debug, warn};

pub struct ColumnMapper;

impl ColumnMapper {
    pub fn detect_columns(sheet: &Sheet, vendor_name: &str) -> ColumnMapping {
        let (strategy, header_row, scan_width, rules) =
            match VendorProfileRegistry::resolve(vendor_name) {
                Some(profile) => match profile.header {
                    HeaderLocator::Fixed { row, scan_width } => (
                        DetectionStrategy::Profile {
                            key: profile.key.to_string(),
                        },
                        Some(row),
                        scan_width,
                        profile.rules,
                    ),
                    HeaderLocator::Generic => (
                        DetectionStrategy::Generic,
                        GenericDetector::find_header_row(sheet),
                        GENERIC_SCAN_WIDTH,
                        profile.rules,
                    ),
                },
                None => {
                    debug!(vendor = %vendor_name, "使用通用关键词探测");
                    (
                        DetectionStrategy::Generic,
                        GenericDetector::find_header_row(sheet),
                        GENERIC_SCAN_WIDTH,
                        GENERIC_RULES,
                    )
                }
            };

        let mut mapping = ColumnMapping::new(vendor_name, strategy);
        if let Some(row) = header_row {
            Self::scan_header_row(sheet, row, scan_width, rules, &mut mapping);
        }

        if mapping.is_valid() {
            debug!(
                vendor = %vendor_name,
                header_row = mapping.header_row_index(),
                fields = mapping.fields.len(),
                "列映射识别完成"
            );
        } else {
            warn!(
                vendor = %vendor_name,
                header_row = mapping.header_row_index(),
                "未识别到可用的列映射"
            );
        }
        mapping
    }

    /// 扫描表头行的列窗口，填充字段、原始表头与样式
    ///
    /// 表头行不存在时不记录行号，映射保持无效。
    fn scan_header_row(
        sheet: &Sheet,
        row_index: usize,
        scan_width: usize,
        rules: &[FieldRule],
        mapping: &mut ColumnMapping,
    ) {
        let Some(row) = sheet.row(row_index) else {
            debug!(row = row_index, "表头行不存在");
            return;
        };
        mapping.header_row = Some(row_index);

        for column in 0..scan_width {
            let Some(cell) = row.cell(column) else {
                continue;
            };
            let Some(raw) = render_cell(cell).filter(|s| !s.trim().is_empty()) else {
                continue;
            };

            let normalized = normalize_header(&raw);
            if let Some(rule) = first_matching_rule(rules, &normalized, &mapping.fields) {
                if let Some(previous) = mapping.fields.insert(rule.field, column) {
                    debug!(
                        field = %rule.field,
                        previous,
                        column,
                        "字段被后续列覆盖"
                    );
                }
            }

            mapping
                .column_styles
                .insert(column, StyleExtractor::extract_style(Some(cell)));
            mapping.raw_headers.push(RawHeader { column, text: raw });
        }
    }
}
