// ==========================================
// 经纪商报价格式识别 - 工作表网格模型
// ==========================================
// 职责: 文件解码层交付给识别引擎的内存网格
// 约束: 行、单元格均为稀疏存储（0 基索引），仅第一个工作表
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 单元格值
// ==========================================
/// 日期以 `Number { is_date: true }` 表示（Excel 序列号）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number { value: f64, is_date: bool },
    Boolean(bool),
    /// 公式的计算结果（无缓存值时为公式原文）
    Formula(String),
    Blank,
}

// ==========================================
// 颜色引用
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorRef {
    /// 直接 RGB（xlsx）
    Rgb(u8, u8, u8),
    /// 调色板索引（xls 旧标准）
    Indexed(u16),
    /// 自动色，等同于"未显式着色"
    Automatic,
}

// ==========================================
// 边框线型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BorderLine {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    Other,
}

impl BorderLine {
    pub fn is_set(&self) -> bool {
        !matches!(self, BorderLine::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Borders {
    pub top: BorderLine,
    pub bottom: BorderLine,
    pub left: BorderLine,
    pub right: BorderLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub color: Option<ColorRef>,
}

/// 单元格样式句柄（填充色 / 字体 / 四边边框）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellStyle {
    pub fill: Option<ColorRef>,
    pub font: Option<FontStyle>,
    pub borders: Borders,
}

// ==========================================
// 单元格
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub style: Option<CellStyle>,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self { value, style: None }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(CellValue::Text(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Self::new(CellValue::Number {
            value,
            is_date: false,
        })
    }

    /// Excel 1900 日期序列号
    pub fn date_serial(serial: f64) -> Self {
        Self::new(CellValue::Number {
            value: serial,
            is_date: true,
        })
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(CellValue::Boolean(value))
    }

    pub fn formula(value: impl Into<String>) -> Self {
        Self::new(CellValue::Formula(value.into()))
    }

    pub fn blank() -> Self {
        Self::new(CellValue::Blank)
    }

    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = Some(style);
        self
    }
}

// ==========================================
// 行 / 工作表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    cells: BTreeMap<usize, Cell>,
}

impl SheetRow {
    pub fn cell(&self, column: usize) -> Option<&Cell> {
        self.cells.get(&column)
    }

    pub fn cell_mut(&mut self, column: usize) -> Option<&mut Cell> {
        self.cells.get_mut(&column)
    }

    pub fn set_cell(&mut self, column: usize, cell: Cell) {
        self.cells.insert(column, cell);
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().map(|(c, cell)| (*c, cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    name: String,
    rows: BTreeMap<usize, SheetRow>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row(&self, row: usize) -> Option<&SheetRow> {
        self.rows.get(&row)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.cell(column))
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut Cell> {
        self.rows.get_mut(&row).and_then(|r| r.cell_mut(column))
    }

    pub fn set_cell(&mut self, row: usize, column: usize, cell: Cell) {
        self.rows.entry(row).or_default().set_cell(column, cell);
    }

    /// 按列顺序写入一整行文本（空字符串跳过）
    pub fn set_row_texts<S: AsRef<str>>(&mut self, row: usize, texts: &[S]) {
        for (column, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            if !text.is_empty() {
                self.set_cell(row, column, Cell::text(text));
            }
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.keys().next_back().map(|r| r + 1).unwrap_or(0)
    }
}

/// 列索引 → 表格列字母（0 → A, 25 → Z, 26 → AA）
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(3), "D");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_sheet_sparse_access() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_cell(9, 4, Cell::text("ITEM DESCRIPTION"));

        assert!(sheet.row(0).is_none());
        assert!(sheet.cell(9, 0).is_none());
        assert_eq!(
            sheet.cell(9, 4).map(|c| &c.value),
            Some(&CellValue::Text("ITEM DESCRIPTION".to_string()))
        );
        assert_eq!(sheet.row_count(), 10);
    }

    #[test]
    fn test_set_row_texts_skips_empty() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_row_texts(2, &["A", "", "C"]);

        let row = sheet.row(2).unwrap();
        assert_eq!(row.len(), 2);
        assert!(row.cell(1).is_none());
    }

    #[test]
    fn test_border_line_is_set() {
        assert!(!BorderLine::None.is_set());
        assert!(BorderLine::Thin.is_set());
        assert!(BorderLine::Other.is_set());
    }
}
