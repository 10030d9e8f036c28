// ==========================================
// 经纪商报价格式识别 - 文档元数据字段
// ==========================================
// 职责: 固定坐标读出的文档级信息（船名、RFQ 号、日期、公司/供应商信息等）
// ==========================================

use crate::domain::sheet::column_letter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 元数据字段（值对象）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataField {
    pub section: String,
    pub field_name: String,
    /// 已 trim，非空
    pub value: String,
    pub source_row: usize,
    pub source_column: usize,
    pub column_letter: String,
}

impl MetadataField {
    pub fn new(
        section: impl Into<String>,
        field_name: impl Into<String>,
        value: impl Into<String>,
        source_row: usize,
        source_column: usize,
    ) -> Self {
        Self {
            section: section.into(),
            field_name: field_name.into(),
            value: value.into(),
            source_row,
            source_column,
            column_letter: column_letter(source_column),
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} = {} (Row: {}, Col: {})",
            self.section,
            self.field_name,
            self.value,
            self.source_row + 1,
            self.column_letter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter_derived() {
        let field = MetadataField::new("RFQ Information", "Vessel", "MV EXAMPLE", 3, 14);
        assert_eq!(field.column_letter, "O");
        assert_eq!(
            field.to_string(),
            "[RFQ Information] Vessel = MV EXAMPLE (Row: 4, Col: O)"
        );
    }
}
