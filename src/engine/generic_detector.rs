// ==========================================
// 经纪商报价格式识别 - 通用表头探测
// ==========================================
// 职责: 未命中档案时按关键词密度为候选行打分，选出表头行
// 规则: 每个命中单元格 +2（一格只计一次）；至少 4 个非空单元格才有资格
// 规则: 严格大于才替换，得分相同保留靠前的行；0 分行不会入选
// ==========================================

use crate::domain::sheet::Sheet;
use crate::engine::cell_text::{normalize_header, render_cell_trimmed};
use crate::engine::vendor_registry::GENERIC_SCAN_WIDTH;
use tracing::debug;

/// 参与打分的行数（0..30）
pub const GENERIC_SCAN_ROWS: usize = 30;
/// 候选行最少非空单元格数
pub const MIN_NON_EMPTY_CELLS: usize = 4;
/// 每个命中单元格的得分
pub const KEYWORD_SCORE: u32 = 2;

pub const HEADER_KEYWORDS: &[&str] = &[
    "DESCRIPTION",
    "ITEM",
    "QUANTITY",
    "PRICE",
    "UNIT",
    "TOTAL",
    "QTY",
    "UOM",
    "AMOUNT",
    "CODE",
    "PART",
];

/// 单行打分结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowScore {
    pub row: usize,
    pub score: u32,
    pub non_empty: usize,
}

impl RowScore {
    pub fn is_eligible(&self) -> bool {
        self.non_empty >= MIN_NON_EMPTY_CELLS
    }
}

pub struct GenericDetector;

impl GenericDetector {
    /// 为单行打分；行不存在时返回 None
    pub fn score_row(sheet: &Sheet, row_index: usize) -> Option<RowScore> {
        let row = sheet.row(row_index)?;

        let mut score = 0;
        let mut non_empty = 0;
        for column in 0..GENERIC_SCAN_WIDTH {
            let Some(text) = row.cell(column).and_then(render_cell_trimmed) else {
                continue;
            };
            non_empty += 1;

            let normalized = normalize_header(&text);
            if HEADER_KEYWORDS.iter().any(|k| normalized.contains(k)) {
                score += KEYWORD_SCORE;
            }
        }

        Some(RowScore {
            row: row_index,
            score,
            non_empty,
        })
    }

    /// 选出得分最高的合格行
    pub fn find_header_row(sheet: &Sheet) -> Option<usize> {
        let mut best: Option<RowScore> = None;

        for row_index in 0..GENERIC_SCAN_ROWS {
            let Some(candidate) = Self::score_row(sheet, row_index) else {
                continue;
            };
            if !candidate.is_eligible() {
                continue;
            }

            let best_score = best.map(|b| b.score).unwrap_or(0);
            if candidate.score > best_score {
                best = Some(candidate);
            }
        }

        match best {
            Some(b) => {
                debug!(
                    row = b.row,
                    score = b.score,
                    non_empty = b.non_empty,
                    "通用探测选定表头行"
                );
                Some(b.row)
            }
            None => {
                debug!(sheet = %sheet.name(), "通用探测未找到合格表头行");
                None
            }
        }
    }
}
