// ==========================================
// 经纪商报价格式识别 - 经纪商目录扫描
// ==========================================
// 约定: 根目录下每个子目录对应一个经纪商，目录名即经纪商名
// 约定: 样本文件取目录内按文件名排序后第一个扩展名合规的文件
// 约定: 归档时目录内全部合规文件都参与
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::lowercase_extension;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 一个经纪商目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerDir {
    pub broker_name: String,
    pub path: PathBuf,
}

/// 列出根目录下的经纪商子目录（按名称排序）
pub fn list_broker_dirs(root: &Path) -> ImportResult<Vec<BrokerDir>> {
    if !root.is_dir() {
        return Err(ImportError::DirectoryNotFound(root.display().to_string()));
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let broker_name = entry.file_name().to_string_lossy().to_string();
        dirs.push(BrokerDir { broker_name, path });
    }
    dirs.sort_by(|a, b| a.broker_name.cmp(&b.broker_name));

    debug!(root = %root.display(), count = dirs.len(), "经纪商目录扫描完成");
    Ok(dirs)
}

/// 列出目录内扩展名合规的全部文件（按文件名排序）
///
/// 扩展名比较不区分大小写。
pub fn list_sample_files<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
) -> ImportResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ImportError::DirectoryNotFound(dir.display().to_string()));
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = lowercase_extension(&path);
        if extensions
            .iter()
            .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(&ext))
        {
            candidates.push(path);
        }
    }
    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(candidates)
}

/// 选取样本文件（合规文件中按名称排序的第一个）
///
/// 没有合规文件时返回 Ok(None)。
pub fn pick_sample_file<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
) -> ImportResult<Option<PathBuf>> {
    Ok(list_sample_files(dir, extensions)?.into_iter().next())
}
