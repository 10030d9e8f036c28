// ==========================================
// 经纪商报价格式识别 - 样本加载错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("样本文件不存在: {0}")]
    FileNotFound(String),

    #[error("经纪商目录不存在或不是目录: {0}")]
    DirectoryNotFound(String),

    #[error("不支持的样本格式: {0:?}（支持 xlsx/xlsm/xls/xlsb/ods/csv）")]
    UnsupportedFormat(String),

    #[error("样本读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("工作簿解析失败: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV 解析失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("工作簿包读取失败: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("工作簿 XML 解析失败: {0}")]
    Xml(#[from] quick_xml::Error),

    /// 样式表属性无法解码
    #[error("样式表解析失败: {0}")]
    StyleSheet(String),

    /// 工作簿不含任何工作表
    #[error("工作簿无工作表: {0}")]
    EmptyWorkbook(String),
}

pub type ImportResult<T> = Result<T, ImportError>;
