// ==========================================
// 经纪商报价格式识别 - 报价文件颜色归档仓储
// ==========================================
// 职责: quotation_file / file_column_color 的读写
// 红线: 一个文件（经纪商 + 文件名）一条记录，再次归档整体替换颜色行
// 红线: 无效映射不入库
// ==========================================

use crate::domain::archive::{ArchivedFile, BrokerColorSummary, FileColumnColor, QuotationInfo};
use crate::domain::mapping::ColumnMapping;
use crate::domain::style::CellStyleInfo;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::format_repo::{
    checked_header_row, get_or_create_broker, insert_mapped_columns, parse_standard_field,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const FILE_SELECT: &str = r#"
    SELECT
        q.file_id, q.broker_id, b.broker_name, q.file_name, q.header_row,
        q.vessel_name, q.imo_number, q.batch_id,
        (SELECT COUNT(*) FROM file_column_color c WHERE c.file_id = q.file_id),
        (SELECT COUNT(*) FROM file_column_color c
          WHERE c.file_id = q.file_id AND c.background_color IS NOT NULL),
        q.created_at, q.updated_at
    FROM quotation_file q
    JOIN broker b ON b.broker_id = q.broker_id
"#;

const COLOR_INSERT: &str = r#"
    INSERT INTO file_column_color (
        file_id, standard_field, original_header, column_index, column_letter,
        background_color, foreground_color, is_bold, is_italic, has_border
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#;

// ==========================================
// ColorArchiveRepository - 颜色归档仓储
// ==========================================
pub struct ColorArchiveRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ColorArchiveRepository {
    /// 创建新的 ColorArchiveRepository 实例（会确保表结构存在）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 归档一个报价文件的列颜色
    ///
    /// 同一经纪商同名文件已存在时更新文件行并替换全部颜色行。
    ///
    /// # 返回
    /// - Ok((file_id, 颜色行数))
    /// - Err(InvalidMapping): 映射无效
    pub fn save_file_colors(
        &self,
        mapping: &ColumnMapping,
        file_name: &str,
        info: &QuotationInfo,
        batch_id: Option<&str>,
    ) -> RepositoryResult<(i64, usize)> {
        let header_row = checked_header_row(mapping)? as i64;

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let broker_id = get_or_create_broker(&tx, &mapping.vendor_name)?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT file_id FROM quotation_file WHERE broker_id = ?1 AND file_name = ?2",
                params![broker_id, file_name],
                |row| row.get(0),
            )
            .optional()?;

        let file_id = match existing {
            Some(file_id) => {
                tx.execute(
                    r#"
                    UPDATE quotation_file
                    SET header_row = ?1, vessel_name = ?2, imo_number = ?3,
                        batch_id = ?4, updated_at = datetime('now')
                    WHERE file_id = ?5
                    "#,
                    params![
                        header_row,
                        info.vessel_name,
                        info.imo_number,
                        batch_id,
                        file_id,
                    ],
                )?;
                let removed = tx.execute(
                    "DELETE FROM file_column_color WHERE file_id = ?1",
                    params![file_id],
                )?;
                debug!(file_id, removed, "替换已归档文件的颜色行");
                file_id
            }
            None => {
                tx.execute(
                    r#"
                    INSERT INTO quotation_file (
                        broker_id, file_name, header_row, vessel_name, imo_number, batch_id
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        broker_id,
                        file_name,
                        header_row,
                        info.vessel_name,
                        info.imo_number,
                        batch_id,
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };

        let count = insert_mapped_columns(&tx, COLOR_INSERT, file_id, mapping)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(
            broker = %mapping.vendor_name,
            file = %file_name,
            file_id,
            colors = count,
            "报价文件颜色已归档"
        );
        Ok((file_id, count))
    }

    /// 查询已归档文件（可按经纪商过滤；按经纪商名、文件名排序）
    pub fn list_files(&self, broker_name: Option<&str>) -> RepositoryResult<Vec<ArchivedFile>> {
        let conn = self.get_conn()?;
        let files = match broker_name {
            Some(name) => {
                let sql = format!(
                    "{} WHERE b.broker_name = ?1 ORDER BY q.file_name",
                    FILE_SELECT
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![name], map_file)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!("{} ORDER BY b.broker_name, q.file_name", FILE_SELECT);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], map_file)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(files)
    }

    /// 按经纪商名 + 文件名查询
    pub fn find_file(
        &self,
        broker_name: &str,
        file_name: &str,
    ) -> RepositoryResult<Option<ArchivedFile>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE b.broker_name = ?1 AND q.file_name = ?2", FILE_SELECT);
        let file = conn
            .query_row(&sql, params![broker_name, file_name], map_file)
            .optional()?;
        Ok(file)
    }

    /// 查询文件的列颜色（按列号排序）
    pub fn list_file_colors(&self, file_id: i64) -> RepositoryResult<Vec<FileColumnColor>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                color_id, file_id, standard_field, original_header, column_index,
                column_letter, background_color, foreground_color,
                is_bold, is_italic, has_border
            FROM file_column_color
            WHERE file_id = ?1
            ORDER BY column_index
            "#,
        )?;

        let colors = stmt
            .query_map(params![file_id], |row| {
                Ok(FileColumnColor {
                    color_id: row.get(0)?,
                    file_id: row.get(1)?,
                    standard_field: parse_standard_field(row, 2)?,
                    original_header: row.get(3)?,
                    column_index: row.get::<_, i64>(4)? as usize,
                    column_letter: row.get(5)?,
                    style: CellStyleInfo {
                        background_color: row.get(6)?,
                        foreground_color: row.get(7)?,
                        is_bold: row.get(8)?,
                        is_italic: row.get(9)?,
                        has_border: row.get(10)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(colors)
    }

    /// 按经纪商汇总归档文件数与带背景色的文件数（按经纪商名排序）
    pub fn color_summary(&self) -> RepositoryResult<Vec<BrokerColorSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                b.broker_name,
                COUNT(*),
                SUM(EXISTS (
                    SELECT 1 FROM file_column_color c
                    WHERE c.file_id = q.file_id AND c.background_color IS NOT NULL
                ))
            FROM quotation_file q
            JOIN broker b ON b.broker_id = q.broker_id
            GROUP BY b.broker_name
            ORDER BY b.broker_name
            "#,
        )?;

        let summary = stmt
            .query_map([], |row| {
                Ok(BrokerColorSummary {
                    broker_name: row.get(0)?,
                    total_files: row.get(1)?,
                    files_with_background: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summary)
    }
}

fn map_file(row: &Row<'_>) -> rusqlite::Result<ArchivedFile> {
    Ok(ArchivedFile {
        file_id: row.get(0)?,
        broker_id: row.get(1)?,
        broker_name: row.get(2)?,
        file_name: row.get(3)?,
        header_row: row.get(4)?,
        vessel_name: row.get(5)?,
        imo_number: row.get(6)?,
        batch_id: row.get(7)?,
        color_count: row.get(8)?,
        background_count: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mapping::RawHeader;
    use crate::domain::types::{DetectionStrategy, StandardField};

    fn memory_repo() -> ColorArchiveRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        ColorArchiveRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn mapping_with(
        broker: &str,
        fields: &[(StandardField, usize, &str, Option<&str>)],
    ) -> ColumnMapping {
        let mut mapping = ColumnMapping::new(broker, DetectionStrategy::Generic);
        mapping.header_row = Some(7);
        for (field, column, text, background) in fields {
            mapping.fields.insert(*field, *column);
            mapping.raw_headers.push(RawHeader {
                column: *column,
                text: text.to_string(),
            });
            mapping.column_styles.insert(
                *column,
                CellStyleInfo {
                    background_color: background.map(str::to_string),
                    ..CellStyleInfo::default()
                },
            );
        }
        mapping
    }

    fn vessel(name: &str) -> QuotationInfo {
        QuotationInfo {
            vessel_name: Some(name.to_string()),
            imo_number: None,
        }
    }

    #[test]
    fn test_invalid_mapping_not_archived() {
        let repo = memory_repo();
        let mapping = ColumnMapping::new("ACME FOODS", DetectionStrategy::Generic);
        let result = repo.save_file_colors(&mapping, "q1.xlsx", &QuotationInfo::default(), None);
        assert!(matches!(result, Err(RepositoryError::InvalidMapping { .. })));
        assert!(repo.list_files(None).unwrap().is_empty());
    }

    #[test]
    fn test_rearchive_replaces_colors_and_keeps_file_id() {
        let repo = memory_repo();
        let first = mapping_with(
            "ACME FOODS",
            &[
                (StandardField::ItemCode, 0, "Code", Some("#FFFF00")),
                (StandardField::Description, 1, "Description", None),
            ],
        );
        let (file_id, count) = repo
            .save_file_colors(&first, "q1.xlsx", &vessel("MV ONE"), Some("b1"))
            .unwrap();
        assert_eq!(count, 2);

        let second = mapping_with("ACME FOODS", &[(StandardField::Total, 5, "Total", None)]);
        let (again, count) = repo
            .save_file_colors(&second, "q1.xlsx", &vessel("MV TWO"), Some("b2"))
            .unwrap();
        assert_eq!(again, file_id);
        assert_eq!(count, 1);

        let colors = repo.list_file_colors(file_id).unwrap();
        assert_eq!(colors.len(), 1);
        assert_eq!(colors[0].standard_field, StandardField::Total);
        assert_eq!(colors[0].column_letter, "F");

        let file = repo.find_file("ACME FOODS", "q1.xlsx").unwrap().unwrap();
        assert_eq!(file.vessel_name.as_deref(), Some("MV TWO"));
        assert_eq!(file.batch_id.as_deref(), Some("b2"));
        assert_eq!(file.header_row, 7);
        assert_eq!(file.color_count, 1);
        assert_eq!(file.background_count, 0);
    }

    #[test]
    fn test_list_files_filters_by_broker() {
        let repo = memory_repo();
        let acme = mapping_with("ACME FOODS", &[(StandardField::ItemCode, 0, "Code", None)]);
        let mctc = mapping_with("MCTC MARINE", &[(StandardField::ItemCode, 0, "Ref", None)]);
        let none = QuotationInfo::default();
        repo.save_file_colors(&acme, "b.xlsx", &none, None).unwrap();
        repo.save_file_colors(&acme, "a.xlsx", &none, None).unwrap();
        repo.save_file_colors(&mctc, "a.xlsx", &none, None).unwrap();

        let all: Vec<(String, String)> = repo
            .list_files(None)
            .unwrap()
            .into_iter()
            .map(|f| (f.broker_name, f.file_name))
            .collect();
        assert_eq!(
            all,
            vec![
                ("ACME FOODS".to_string(), "a.xlsx".to_string()),
                ("ACME FOODS".to_string(), "b.xlsx".to_string()),
                ("MCTC MARINE".to_string(), "a.xlsx".to_string()),
            ]
        );

        let mctc_files = repo.list_files(Some("MCTC MARINE")).unwrap();
        assert_eq!(mctc_files.len(), 1);
        assert!(repo.list_files(Some("NOBODY")).unwrap().is_empty());
    }

    #[test]
    fn test_color_summary_counts_files_with_background() {
        let repo = memory_repo();
        let colored = mapping_with(
            "ACME FOODS",
            &[
                (StandardField::ItemCode, 0, "Code", Some("#FFFF00")),
                (StandardField::UnitPrice, 3, "Price", Some("#C0C0C0")),
            ],
        );
        let plain = mapping_with("ACME FOODS", &[(StandardField::ItemCode, 0, "Code", None)]);
        let none = QuotationInfo::default();
        repo.save_file_colors(&colored, "q1.xlsx", &none, None).unwrap();
        repo.save_file_colors(&plain, "q2.xlsx", &none, None).unwrap();

        let summary = repo.color_summary().unwrap();
        assert_eq!(
            summary,
            vec![BrokerColorSummary {
                broker_name: "ACME FOODS".to_string(),
                total_files: 2,
                files_with_background: 1,
            }]
        );
    }
}
