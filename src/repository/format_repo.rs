// ==========================================
// 经纪商报价格式识别 - 格式数据仓储
// ==========================================
// 职责: broker / broker_format / format_column / broker_metadata 的读写
// 红线: Repository 不含识别逻辑
// 红线: 同一经纪商同一版本再次保存时整体替换子记录（不合并）
// ==========================================

use crate::domain::format::{FormatColumn, FormatSummary};
use crate::domain::mapping::ColumnMapping;
use crate::domain::metadata::MetadataField;
use crate::domain::sheet::column_letter;
use crate::domain::style::CellStyleInfo;
use crate::domain::types::{DetectionStrategy, StandardField};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const SUMMARY_SELECT: &str = r#"
    SELECT
        f.format_id, f.broker_id, b.broker_name, f.version, f.header_row,
        f.sample_file, f.detection_strategy, f.batch_id,
        (SELECT COUNT(*) FROM format_column c WHERE c.format_id = f.format_id),
        f.created_at, f.updated_at
    FROM broker_format f
    JOIN broker b ON b.broker_id = f.broker_id
"#;

// ==========================================
// FormatRepository - 格式仓储
// ==========================================
pub struct FormatRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FormatRepository {
    /// 创建新的 FormatRepository 实例（会确保表结构存在）
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

    /// 保存列映射（主记录 + 列定义）
    ///
    /// # 返回
    /// - Ok(format_id)
    /// - Err(InvalidMapping): 映射无效
    pub fn save_format(
        &self,
        mapping: &ColumnMapping,
        sample_file: &str,
        version: &str,
        batch_id: Option<&str>,
    ) -> RepositoryResult<i64> {
        let header_row = checked_header_row(mapping)?;

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let (format_id, count) =
            write_format(&tx, mapping, header_row, sample_file, version, batch_id)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(
            broker = %mapping.vendor_name,
            format_id,
            version,
            columns = count,
            "格式已保存"
        );
        Ok(format_id)
    }

    /// 保存元数据（替换该格式已有的全部元数据）
    pub fn save_metadata(
        &self,
        format_id: i64,
        fields: &[MetadataField],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let count = write_metadata(&tx, format_id, fields)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(format_id, count, "元数据已保存");
        Ok(count)
    }

    /// 列映射与元数据在同一事务内保存
    ///
    /// 任一步失败时整体回滚，旧的列定义与元数据保持不变。
    ///
    /// # 返回
    /// - Ok((format_id, 元数据条数))
    pub fn save_format_with_metadata(
        &self,
        mapping: &ColumnMapping,
        sample_file: &str,
        version: &str,
        batch_id: Option<&str>,
        metadata: &[MetadataField],
    ) -> RepositoryResult<(i64, usize)> {
        let header_row = checked_header_row(mapping)?;

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let (format_id, columns) =
            write_format(&tx, mapping, header_row, sample_file, version, batch_id)?;
        let metadata_count = write_metadata(&tx, format_id, metadata)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(
            broker = %mapping.vendor_name,
            format_id,
            version,
            columns,
            metadata = metadata_count,
            "格式与元数据已保存"
        );
        Ok((format_id, metadata_count))
    }

    /// 查询全部格式（按经纪商名、版本排序）
    pub fn list_formats(&self) -> RepositoryResult<Vec<FormatSummary>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY b.broker_name, f.version", SUMMARY_SELECT);
        let mut stmt = conn.prepare(&sql)?;
        let formats = stmt
            .query_map([], map_summary)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(formats)
    }

    /// 按经纪商名 + 版本查询
    pub fn find_format(
        &self,
        broker_name: &str,
        version: &str,
    ) -> RepositoryResult<Option<FormatSummary>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE b.broker_name = ?1 AND f.version = ?2", SUMMARY_SELECT);
        let summary = conn
            .query_row(&sql, params![broker_name, version], map_summary)
            .optional()?;
        Ok(summary)
    }

    /// 查询格式的列定义（按列号排序）
    pub fn list_columns(&self, format_id: i64) -> RepositoryResult<Vec<FormatColumn>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                column_id, format_id, standard_field, original_header, column_index,
                column_letter, background_color, foreground_color,
                is_bold, is_italic, has_border
            FROM format_column
            WHERE format_id = ?1
            ORDER BY column_index
            "#,
        )?;

        let columns = stmt
            .query_map(params![format_id], |row| {
                Ok(FormatColumn {
                    column_id: row.get(0)?,
                    format_id: row.get(1)?,
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
        Ok(columns)
    }

    /// 查询格式的元数据（按分区、行、列排序）
    pub fn list_metadata(&self, format_id: i64) -> RepositoryResult<Vec<MetadataField>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT section, field_name, field_value, source_row, source_column, column_letter
            FROM broker_metadata
            WHERE format_id = ?1
            ORDER BY section, source_row, source_column
            "#,
        )?;

        let fields = stmt
            .query_map(params![format_id], |row| {
                Ok(MetadataField {
                    section: row.get(0)?,
                    field_name: row.get(1)?,
                    value: row.get(2)?,
                    source_row: row.get::<_, i64>(3)? as usize,
                    source_column: row.get::<_, i64>(4)? as usize,
                    column_letter: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fields)
    }
}

/// 有效映射的表头行；无效映射拒绝写库
pub(crate) fn checked_header_row(mapping: &ColumnMapping) -> RepositoryResult<usize> {
    mapping
        .header_row
        .filter(|_| mapping.is_valid())
        .ok_or_else(|| RepositoryError::InvalidMapping {
            broker: mapping.vendor_name.clone(),
            reason: "未识别到表头行或字段".to_string(),
        })
}

/// 按名称取经纪商 id，不存在则创建
pub(crate) fn get_or_create_broker(conn: &Connection, broker_name: &str) -> RepositoryResult<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO broker (broker_name) VALUES (?1)",
        params![broker_name],
    )?;
    let broker_id = conn.query_row(
        "SELECT broker_id FROM broker WHERE broker_name = ?1",
        params![broker_name],
        |row| row.get(0),
    )?;
    Ok(broker_id)
}

/// 写主记录并替换列定义，返回 (format_id, 列数)
fn write_format(
    conn: &Connection,
    mapping: &ColumnMapping,
    header_row: usize,
    sample_file: &str,
    version: &str,
    batch_id: Option<&str>,
) -> RepositoryResult<(i64, usize)> {
    let broker_id = get_or_create_broker(conn, &mapping.vendor_name)?;

    let existing: Option<i64> = conn
        .query_row(
            "SELECT format_id FROM broker_format WHERE broker_id = ?1 AND version = ?2",
            params![broker_id, version],
            |row| row.get(0),
        )
        .optional()?;

    let strategy = mapping.strategy.to_db_str();
    let header_row = header_row as i64;
    let format_id = match existing {
        Some(format_id) => {
            conn.execute(
                r#"
                UPDATE broker_format
                SET header_row = ?1, sample_file = ?2, detection_strategy = ?3,
                    batch_id = ?4, updated_at = datetime('now')
                WHERE format_id = ?5
                "#,
                params![header_row, sample_file, strategy, batch_id, format_id],
            )?;
            let removed = conn.execute(
                "DELETE FROM format_column WHERE format_id = ?1",
                params![format_id],
            )?;
            debug!(format_id, removed, "替换已有格式的列定义");
            format_id
        }
        None => {
            conn.execute(
                r#"
                INSERT INTO broker_format (
                    broker_id, version, header_row, sample_file, detection_strategy, batch_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![broker_id, version, header_row, sample_file, strategy, batch_id],
            )?;
            conn.last_insert_rowid()
        }
    };

    let count = insert_mapped_columns(
        conn,
        r#"
        INSERT INTO format_column (
            format_id, standard_field, original_header, column_index, column_letter,
            background_color, foreground_color, is_bold, is_italic, has_border
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        format_id,
        mapping,
    )?;
    Ok((format_id, count))
}

/// 按列号顺序写入映射字段及表头样式
///
/// sql 的 ?1 为所属记录 id，?2..?10 依次为字段、原表头、列号、列字母与五项样式。
pub(crate) fn insert_mapped_columns(
    conn: &Connection,
    sql: &str,
    owner_id: i64,
    mapping: &ColumnMapping,
) -> RepositoryResult<usize> {
    let mut stmt = conn.prepare(sql)?;
    let mut count = 0;
    for (field, column) in mapping.fields_by_column() {
        let style = mapping.style_at(column).cloned().unwrap_or_default();
        stmt.execute(params![
            owner_id,
            field.as_str(),
            mapping.header_text_at(column),
            column as i64,
            column_letter(column),
            style.background_color,
            style.foreground_color,
            style.is_bold,
            style.is_italic,
            style.has_border,
        ])?;
        count += 1;
    }
    Ok(count)
}

fn write_metadata(
    conn: &Connection,
    format_id: i64,
    fields: &[MetadataField],
) -> RepositoryResult<usize> {
    conn.execute(
        "DELETE FROM broker_metadata WHERE format_id = ?1",
        params![format_id],
    )?;

    let mut count = 0;
    for field in fields {
        conn.execute(
            r#"
            INSERT INTO broker_metadata (
                format_id, section, field_name, field_value,
                source_row, source_column, column_letter
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                format_id,
                field.section,
                field.field_name,
                field.value,
                field.source_row as i64,
                field.source_column as i64,
                field.column_letter,
            ],
        )?;
        count += 1;
    }
    Ok(count)
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<FormatSummary> {
    Ok(FormatSummary {
        format_id: row.get(0)?,
        broker_id: row.get(1)?,
        broker_name: row.get(2)?,
        version: row.get(3)?,
        header_row: row.get(4)?,
        sample_file: row.get(5)?,
        strategy: DetectionStrategy::from_db_str(&row.get::<_, String>(6)?),
        batch_id: row.get(7)?,
        column_count: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub(crate) fn parse_standard_field(row: &Row<'_>, idx: usize) -> rusqlite::Result<StandardField> {
    let raw: String = row.get(idx)?;
    raw.parse::<StandardField>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mapping::RawHeader;

    fn memory_repo() -> FormatRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        FormatRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn mapping_with(fields: &[(StandardField, usize, &str)]) -> ColumnMapping {
        let mut mapping = ColumnMapping::new("ACME FOODS", DetectionStrategy::Generic);
        mapping.header_row = Some(5);
        for (field, column, text) in fields {
            mapping.fields.insert(*field, *column);
            mapping.raw_headers.push(RawHeader {
                column: *column,
                text: text.to_string(),
            });
        }
        mapping
    }

    #[test]
    fn test_invalid_mapping_rejected() {
        let repo = memory_repo();
        let mapping = ColumnMapping::new("ACME FOODS", DetectionStrategy::Generic);
        let result = repo.save_format(&mapping, "a.xlsx", "1.0", None);
        assert!(matches!(result, Err(RepositoryError::InvalidMapping { .. })));
    }

    #[test]
    fn test_metadata_for_unknown_format_violates_constraint() {
        let repo = memory_repo();
        let fields = vec![MetadataField::new("RFQ Information", "Vessel", "MV ONE", 3, 14)];
        let result = repo.save_metadata(999, &fields);
        assert!(matches!(result, Err(RepositoryError::ConstraintViolation(_))));
    }

    #[test]
    fn test_unknown_standard_field_is_corrupt_record() {
        let repo = memory_repo();
        let mapping = mapping_with(&[(StandardField::ItemCode, 0, "Item Code")]);
        let format_id = repo.save_format(&mapping, "a.xlsx", "1.0", None).unwrap();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute(
                "UPDATE format_column SET standard_field = 'NOT_A_FIELD' WHERE format_id = ?1",
                params![format_id],
            )
            .unwrap();
        }
        let result = repo.list_columns(format_id);
        assert!(matches!(result, Err(RepositoryError::CorruptRecord { column: 2, .. })));
    }

    #[test]
    fn test_original_header_follows_column() {
        let repo = memory_repo();
        let mapping = mapping_with(&[
            (StandardField::Total, 4, "Total"),
            (StandardField::ItemCode, 0, "Item Code"),
        ]);
        let format_id = repo.save_format(&mapping, "a.xlsx", "1.0", None).unwrap();

        let columns = repo.list_columns(format_id).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].standard_field, StandardField::ItemCode);
        assert_eq!(columns[0].original_header.as_deref(), Some("Item Code"));
        assert_eq!(columns[1].column_letter, "E");
        assert_eq!(columns[1].original_header.as_deref(), Some("Total"));
        assert!(!columns[1].style.has_style());
    }

    #[test]
    fn test_resave_replaces_columns() {
        let repo = memory_repo();
        let first = mapping_with(&[
            (StandardField::ItemCode, 0, "Item Code"),
            (StandardField::Total, 4, "Total"),
        ]);
        let id1 = repo.save_format(&first, "a.xlsx", "1.0", Some("b1")).unwrap();

        let second = mapping_with(&[(StandardField::Quantity, 2, "Qty")]);
        let id2 = repo.save_format(&second, "b.xlsx", "1.0", Some("b2")).unwrap();
        assert_eq!(id1, id2);

        let columns = repo.list_columns(id2).unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].standard_field, StandardField::Quantity);

        let summary = repo.find_format("ACME FOODS", "1.0").unwrap().unwrap();
        assert_eq!(summary.sample_file, "b.xlsx");
        assert_eq!(summary.batch_id.as_deref(), Some("b2"));
        assert_eq!(summary.column_count, 1);
    }

    #[test]
    fn test_metadata_replace() {
        let repo = memory_repo();
        let mapping = mapping_with(&[(StandardField::ItemCode, 0, "Item Code")]);
        let format_id = repo.save_format(&mapping, "a.xlsx", "1.0", None).unwrap();

        let fields = vec![
            MetadataField::new("RFQ Information", "Vessel", "MV ONE", 3, 14),
            MetadataField::new("RFQ Information", "RFQ Number", "R-1", 4, 14),
        ];
        assert_eq!(repo.save_metadata(format_id, &fields).unwrap(), 2);

        let replacement = vec![MetadataField::new("RFQ Information", "Vessel", "MV TWO", 3, 14)];
        repo.save_metadata(format_id, &replacement).unwrap();

        let stored = repo.list_metadata(format_id).unwrap();
        assert_eq!(stored, replacement);
    }

    #[test]
    fn test_combined_save_rolls_back_on_metadata_failure() {
        let repo = memory_repo();
        let first = mapping_with(&[(StandardField::ItemCode, 0, "Item Code")]);
        let fields = vec![MetadataField::new("RFQ Information", "Vessel", "MV ONE", 3, 14)];
        let (format_id, count) = repo
            .save_format_with_metadata(&first, "a.xlsx", "1.0", Some("b1"), &fields)
            .unwrap();
        assert_eq!(count, 1);

        {
            let conn = repo.get_conn().unwrap();
            conn.execute_batch(
                "CREATE TRIGGER reject_metadata BEFORE INSERT ON broker_metadata \
                 BEGIN SELECT RAISE(ABORT, 'metadata rejected'); END;",
            )
            .unwrap();
        }

        let second = mapping_with(&[(StandardField::Total, 4, "Total")]);
        let result =
            repo.save_format_with_metadata(&second, "b.xlsx", "1.0", Some("b2"), &fields);
        assert!(result.is_err());

        let summary = repo.find_format("ACME FOODS", "1.0").unwrap().unwrap();
        assert_eq!(summary.sample_file, "a.xlsx");
        assert_eq!(summary.batch_id.as_deref(), Some("b1"));
        let columns = repo.list_columns(format_id).unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].standard_field, StandardField::ItemCode);
        assert_eq!(repo.list_metadata(format_id).unwrap(), fields);
    }

    #[test]
    fn test_combined_save_rejects_invalid_mapping() {
        let repo = memory_repo();
        let mapping = ColumnMapping::new("ACME FOODS", DetectionStrategy::Generic);
        let result = repo.save_format_with_metadata(&mapping, "a.xlsx", "1.0", None, &[]);
        assert!(matches!(result, Err(RepositoryError::InvalidMapping { .. })));
        assert!(repo.list_formats().unwrap().is_empty());
    }

    #[test]
    fn test_find_format_missing() {
        let repo = memory_repo();
        assert!(repo.find_format("NOBODY", "1.0").unwrap().is_none());
    }
}
