// ==========================================
// 经纪商报价格式识别 - 列映射结果
// ==========================================
// 职责: 一次识别调用的完整输出（表头行 / 字段→列 / 原始表头 / 列样式）
// 生命周期: 每次调用全新构造；同一经纪商再次识别时整体替换（不合并）
// ==========================================

use crate::domain::sheet::column_letter;
use crate::domain::style::CellStyleInfo;
use crate::domain::types::{DetectionStrategy, StandardField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 扫描到的一个非空表头单元格
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHeader {
    pub column: usize,
    /// 原始文本（未归一化）
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub vendor_name: String,
    pub strategy: DetectionStrategy,
    /// None 表示未识别到表头行
    pub header_row: Option<usize>,
    pub fields: BTreeMap<StandardField, usize>,
    /// 按扫描顺序排列
    pub raw_headers: Vec<RawHeader>,
    pub column_styles: BTreeMap<usize, CellStyleInfo>,
}

impl ColumnMapping {
    /// 空映射（无效）
    pub fn new(vendor_name: impl Into<String>, strategy: DetectionStrategy) -> Self {
        Self {
            vendor_name: vendor_name.into(),
            strategy,
            header_row: None,
            fields: BTreeMap::new(),
            raw_headers: Vec::new(),
            column_styles: BTreeMap::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.header_row.is_some() && !self.fields.is_empty()
    }

    /// 表头行索引，未识别时为 -1
    pub fn header_row_index(&self) -> i64 {
        self.header_row.map(|r| r as i64).unwrap_or(-1)
    }

    pub fn column_of(&self, field: StandardField) -> Option<usize> {
        self.fields.get(&field).copied()
    }

    pub fn raw_header_texts(&self) -> Vec<&str> {
        self.raw_headers.iter().map(|h| h.text.as_str()).collect()
    }

    /// 指定列的原始表头文本
    pub fn header_text_at(&self, column: usize) -> Option<&str> {
        self.raw_headers
            .iter()
            .find(|h| h.column == column)
            .map(|h| h.text.as_str())
    }

    pub fn style_at(&self, column: usize) -> Option<&CellStyleInfo> {
        self.column_styles.get(&column)
    }

    /// 字段按列号排序
    pub fn fields_by_column(&self) -> Vec<(StandardField, usize)> {
        let mut pairs: Vec<(StandardField, usize)> =
            self.fields.iter().map(|(f, c)| (*f, *c)).collect();
        pairs.sort_by_key(|(field, column)| (*column, *field));
        pairs
    }
}

impl fmt::Display for ColumnMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Broker: {}", self.vendor_name)?;
        match self.header_row {
            Some(row) => writeln!(f, "Header Row: {}", row + 1)?,
            None => writeln!(f, "Header Row: -")?,
        }
        writeln!(f, "Strategy: {}", self.strategy)?;
        writeln!(f, "Columns:")?;
        for (field, column) in self.fields_by_column() {
            let header = self.header_text_at(column).unwrap_or("N/A");
            write!(
                f,
                "  {:<20} -> {} ({}) \"{}\"",
                field.as_str(),
                column_letter(column),
                column + 1,
                header
            )?;
            if let Some(style) = self.style_at(column).filter(|s| s.has_style()) {
                write!(f, " [{}]", style)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mapping() -> ColumnMapping {
        let mut mapping = ColumnMapping::new(
            "MCTC MARINE LTD",
            DetectionStrategy::Profile {
                key: "MCTC".to_string(),
            },
        );
        mapping.header_row = Some(9);
        mapping.fields.insert(StandardField::Description, 4);
        mapping.fields.insert(StandardField::ItemCode, 0);
        mapping.raw_headers.push(RawHeader {
            column: 0,
            text: "MCTC'S REF NO".to_string(),
        });
        mapping.raw_headers.push(RawHeader {
            column: 4,
            text: "ITEM DESCRIPTION".to_string(),
        });
        mapping
    }

    #[test]
    fn test_validity() {
        let empty = ColumnMapping::new("X", DetectionStrategy::Generic);
        assert!(!empty.is_valid());
        assert_eq!(empty.header_row_index(), -1);

        let mut header_only = ColumnMapping::new("X", DetectionStrategy::Generic);
        header_only.header_row = Some(3);
        assert!(!header_only.is_valid());

        assert!(sample_mapping().is_valid());
    }

    #[test]
    fn test_header_text_lookup_by_column() {
        let mapping = sample_mapping();
        assert_eq!(mapping.header_text_at(4), Some("ITEM DESCRIPTION"));
        assert_eq!(mapping.header_text_at(1), None);
        assert_eq!(
            mapping.raw_header_texts(),
            vec!["MCTC'S REF NO", "ITEM DESCRIPTION"]
        );
    }

    #[test]
    fn test_fields_by_column_order() {
        let mapping = sample_mapping();
        assert_eq!(
            mapping.fields_by_column(),
            vec![(StandardField::ItemCode, 0), (StandardField::Description, 4)]
        );
    }

    #[test]
    fn test_display_uses_one_based_positions() {
        let text = sample_mapping().to_string();
        assert!(text.contains("Header Row: 10"));
        assert!(text.contains("ITEM_CODE"));
        assert!(text.contains("-> E (5) \"ITEM DESCRIPTION\""));
    }
}
