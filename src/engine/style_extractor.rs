// ==========================================
// 经纪商报价格式识别 - 样式提取器
// ==========================================
// 职责: 单元格样式句柄 → CellStyleInfo
// 红线: 不返回错误；取不到的字段保持缺失
// ==========================================

use crate::domain::sheet::{Cell, CellStyle, ColorRef};
use crate::domain::style::CellStyleInfo;
use tracing::trace;

/// 旧标准调色板中"自动色"的索引
pub const AUTOMATIC_COLOR_INDEX: u16 = 64;

// ==========================================
// 索引色调色板（索引 → #RRGGBB）
// ==========================================
pub static INDEXED_PALETTE: &[(u16, &str)] = &[
    (8, "#000000"),  // black
    (9, "#FFFFFF"),  // white
    (10, "#FF0000"), // red
    (11, "#00FF00"), // bright green
    (12, "#0000FF"), // blue
    (13, "#FFFF00"), // yellow
    (14, "#FF00FF"), // pink
    (15, "#00FFFF"), // turquoise
    (16, "#800000"), // dark red
    (17, "#00FF00"), // green
    (18, "#00008B"), // dark blue
    (19, "#808000"), // dark yellow
    (20, "#EE82EE"), // violet
    (22, "#C0C0C0"), // grey 25%
    (23, "#808080"), // grey 50%
    (25, "#800000"), // maroon
    (31, "#6495ED"), // light cornflower blue
    (42, "#90EE90"), // light green
    (43, "#FFFFE0"), // light yellow
    (44, "#AFEEEE"), // pale blue
    (45, "#FF007F"), // rose
    (46, "#E6E6FA"), // lavender
    (47, "#D2B48C"), // tan
    (48, "#ADD8E6"), // light blue
    (50, "#00FF00"), // lime
    (51, "#FFD700"), // gold
    (52, "#FFD700"), // light orange
    (53, "#FFA500"), // orange
    (57, "#2E8B57"), // sea green
    (58, "#006400"), // dark green
    (60, "#A52A2A"), // brown
    (62, "#4B0082"), // indigo
];

/// 调色板索引 → 十六进制颜色；未收录的索引保留为 `INDEX_<n>`
pub fn palette_color(index: u16) -> String {
    match INDEXED_PALETTE.iter().find(|(i, _)| *i == index) {
        Some((_, hex)) => (*hex).to_string(),
        None => {
            trace!(index, "调色板未收录该索引，保留符号值");
            format!("INDEX_{}", index)
        }
    }
}

/// 颜色引用 → 颜色字符串；自动色视为未着色
pub fn resolve_color(color: &ColorRef) -> Option<String> {
    match color {
        ColorRef::Rgb(r, g, b) => Some(format!("#{:02X}{:02X}{:02X}", r, g, b)),
        ColorRef::Indexed(AUTOMATIC_COLOR_INDEX) | ColorRef::Automatic => None,
        ColorRef::Indexed(index) => Some(palette_color(*index)),
    }
}

pub struct StyleExtractor;

impl StyleExtractor {
    /// 提取单元格样式；单元格或样式缺失时返回全空记录
    pub fn extract_style(cell: Option<&Cell>) -> CellStyleInfo {
        match cell.and_then(|c| c.style.as_ref()) {
            Some(style) => Self::from_style(style),
            None => CellStyleInfo::default(),
        }
    }

    pub fn from_style(style: &CellStyle) -> CellStyleInfo {
        let font = style.font.as_ref();
        let borders = &style.borders;

        CellStyleInfo {
            background_color: style.fill.as_ref().and_then(resolve_color),
            foreground_color: font.and_then(|f| f.color.as_ref()).and_then(resolve_color),
            is_bold: font.map(|f| f.bold).unwrap_or(false),
            is_italic: font.map(|f| f.italic).unwrap_or(false),
            has_border: borders.top.is_set()
                || borders.bottom.is_set()
                || borders.left.is_set()
                || borders.right.is_set(),
        }
    }
}
