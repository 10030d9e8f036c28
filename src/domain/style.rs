// ==========================================
// 经纪商报价格式识别 - 表头单元格样式记录
// ==========================================
// 职责: 归一化的表头样式（背景色/文字色/粗体/斜体/边框）
// 约束: 构造后不可变，每个单元格独立构造
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 表头单元格样式
///
/// 颜色为 `#RRGGBB`，或调色板未收录时的 `INDEX_<n>` 符号。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStyleInfo {
    pub background_color: Option<String>,
    pub foreground_color: Option<String>,
    pub is_bold: bool,
    pub is_italic: bool,
    /// 四边任一边框非 None 即为 true
    pub has_border: bool,
}

impl CellStyleInfo {
    /// 任一字段非默认值时为 true（下游据此决定是否落库）
    pub fn has_style(&self) -> bool {
        self.background_color.is_some()
            || self.foreground_color.is_some()
            || self.is_bold
            || self.is_italic
            || self.has_border
    }
}

impl fmt::Display for CellStyleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(bg) = &self.background_color {
            parts.push(format!("BG:{}", bg));
        }
        if let Some(fg) = &self.foreground_color {
            parts.push(format!("FG:{}", fg));
        }
        if self.is_bold {
            parts.push("Bold".to_string());
        }
        if self.is_italic {
            parts.push("Italic".to_string());
        }
        if self.has_border {
            parts.push("Border".to_string());
        }
        f.write_str(&parts.join(" "))
    }
}
