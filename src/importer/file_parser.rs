// ==========================================
// 经纪商报价格式识别 - 样本文件加载
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb/.ods) / CSV (.csv)
// 输出: 首个工作表的稀疏单元格网格
// 样式: calamine 只给值；xlsx/xlsm 另行解析样式表，其它格式 style 为 None
// ==========================================

use crate::domain::sheet::{Cell, Sheet};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::xlsx_styles::{read_first_sheet_styles, CellStyleMap, STYLED_EXTENSIONS};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

pub const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];
pub const CSV_EXTENSION: &str = "csv";

/// 样本文件 → 工作表网格
pub trait SheetLoader: Send + Sync {
    /// 只读取第一个工作表
    fn load_first_sheet(&self, file_path: &Path) -> ImportResult<Sheet>;
}

/// 小写扩展名
pub fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.is_file() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// CSV Loader 实现
// ==========================================
pub struct CsvSheetLoader;

impl SheetLoader for CsvSheetLoader {
    fn load_first_sheet(&self, file_path: &Path) -> ImportResult<Sheet> {
        ensure_exists(file_path)?;

        let ext = lowercase_extension(file_path);
        if ext != CSV_EXTENSION {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut sheet = Sheet::new(name);

        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let texts: Vec<&str> = record.iter().collect();
            sheet.set_row_texts(row_idx, &texts);
        }

        debug!(file = %file_path.display(), rows = sheet.row_count(), "CSV 加载完成");
        Ok(sheet)
    }
}

// ==========================================
// Excel Loader 实现
// ==========================================
pub struct ExcelSheetLoader;

impl ExcelSheetLoader {
    fn to_cell(data: &Data) -> Option<Cell> {
        match data {
            Data::Int(i) => Some(Cell::number(*i as f64)),
            Data::Float(f) => Some(Cell::number(*f)),
            Data::String(s) => Some(Cell::text(s.clone())),
            Data::Bool(b) => Some(Cell::boolean(*b)),
            Data::DateTime(dt) if dt.is_duration() => Some(Cell::number(dt.as_f64())),
            Data::DateTime(dt) => Some(Cell::date_serial(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Cell::text(s.clone())),
            // 错误单元格按缺失处理
            Data::Error(_) | Data::Empty => None,
        }
    }

    /// 样式只挂到有值的单元格上
    fn apply_styles(sheet: &mut Sheet, styles: CellStyleMap) -> usize {
        let mut applied = 0;
        for ((row, column), style) in styles {
            if let Some(cell) = sheet.cell_mut(row, column) {
                cell.style = Some(style);
                applied += 1;
            }
        }
        applied
    }
}

impl SheetLoader for ExcelSheetLoader {
    fn load_first_sheet(&self, file_path: &Path) -> ImportResult<Sheet> {
        ensure_exists(file_path)?;

        let ext = lowercase_extension(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::EmptyWorkbook(file_path.display().to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::EmptyWorkbook(file_path.display().to_string()))??;

        let mut sheet = Sheet::new(sheet_name);
        let Some((start_row, start_col)) = range.start() else {
            warn!(file = %file_path.display(), "首个工作表为空");
            return Ok(sheet);
        };

        // used_cells 给出相对 range 起点的偏移
        for (row, col, data) in range.used_cells() {
            if let Some(cell) = Self::to_cell(data) {
                sheet.set_cell(start_row as usize + row, start_col as usize + col, cell);
            }
        }

        let mut styled = 0;
        if STYLED_EXTENSIONS.contains(&ext.as_str()) {
            match read_first_sheet_styles(file_path) {
                Ok(styles) => styled = Self::apply_styles(&mut sheet, styles),
                // 值已加载，样式缺失时按无样式继续
                Err(e) => warn!(
                    file = %file_path.display(),
                    error = %e,
                    "单元格样式读取失败，按无样式处理"
                ),
            }
        }

        debug!(
            file = %file_path.display(),
            sheet = %sheet.name(),
            rows = sheet.row_count(),
            styled,
            "Excel 加载完成"
        );
        Ok(sheet)
    }
}

// ==========================================
// 通用加载器（根据扩展名自动选择）
// ==========================================
pub struct UniversalSheetLoader;

impl SheetLoader for UniversalSheetLoader {
    fn load_first_sheet(&self, file_path: &Path) -> ImportResult<Sheet> {
        ensure_exists(file_path)?;

        let ext = lowercase_extension(file_path);
        if ext == CSV_EXTENSION {
            CsvSheetLoader.load_first_sheet(file_path)
        } else if EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            ExcelSheetLoader.load_first_sheet(file_path)
        } else {
            Err(ImportError::UnsupportedFormat(ext))
        }
    }
}
