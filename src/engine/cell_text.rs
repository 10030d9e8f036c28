// ==========================================
// 经纪商报价格式识别 - 单元格文本渲染
// ==========================================
// 职责: 单元格值 → 展示字符串（表头扫描与元数据提取共用）
// 规则: 整数值浮点去掉小数部分；不使用科学计数法；日期按 Excel 1900 序列号换算
// ==========================================

use crate::domain::sheet::{Cell, CellValue};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

// Excel 支持的最大序列号 (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

// f64 可精确表示的整数上界
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// 渲染单元格为文本（未 trim）
///
/// 空白单元格返回 None。
pub fn render_cell(cell: &Cell) -> Option<String> {
    match &cell.value {
        CellValue::Text(s) => Some(s.clone()),
        CellValue::Number { value, is_date } => {
            if *is_date {
                Some(render_date_serial(*value).unwrap_or_else(|| render_number(*value)))
            } else {
                Some(render_number(*value))
            }
        }
        CellValue::Boolean(b) => Some(b.to_string()),
        CellValue::Formula(s) => Some(s.clone()),
        CellValue::Blank => None,
    }
}

/// 渲染并 trim，空串视为缺失
pub fn render_cell_trimmed(cell: &Cell) -> Option<String> {
    render_cell(cell)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 表头归一化: 大写 + trim
pub fn normalize_header(text: &str) -> String {
    text.trim().to_uppercase()
}

/// 数值文本: 整数值不带小数部分
pub fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Excel 1900 日期序列号 → NaiveDateTime
///
/// 序列号 1..=59 落在 1900-01-01..1900-02-28；60 以后考虑 1900 闰年缺陷。
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }

    let days = serial.trunc() as i64;
    let base = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let seconds = (serial.fract() * 86_400.0).round() as i64;
    let midnight = base.checked_add_signed(Duration::days(days))?.and_hms_opt(0, 0, 0)?;
    midnight.checked_add_signed(Duration::seconds(seconds))
}

fn render_date_serial(serial: f64) -> Option<String> {
    let dt = excel_serial_to_datetime(serial)?;
    if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
        Some(dt.format("%Y-%m-%d").to_string())
    } else {
        Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
