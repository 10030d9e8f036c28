// ==========================================
// 经纪商报价格式识别 - xlsx 单元格样式读取
// ==========================================
// 职责: 解析 xl/styles.xml 与首个工作表 XML，得到 (行, 列) → CellStyle
// 范围: 仅 xlsx / xlsm（zip + SpreadsheetML）；其它格式不带样式
// 限制: 主题色 (theme) 不解析，按未着色处理
// ==========================================

use crate::domain::sheet::{BorderLine, Borders, CellStyle, ColorRef, FontStyle};
use crate::importer::error::{ImportError, ImportResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// 可读取样式的扩展名
pub const STYLED_EXTENSIONS: &[&str] = &["xlsx", "xlsm"];

/// (行, 列) → 单元格样式（0 基）
pub type CellStyleMap = HashMap<(usize, usize), CellStyle>;

/// 读取工作簿第一个工作表的单元格样式
///
/// 工作簿没有样式表时返回空表。
pub fn read_first_sheet_styles(path: &Path) -> ImportResult<CellStyleMap> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let Some(styles_xml) = read_part(&mut archive, "xl/styles.xml")? else {
        debug!(file = %path.display(), "工作簿无样式表");
        return Ok(CellStyleMap::new());
    };
    let xfs = parse_style_sheet(styles_xml.as_bytes())?;

    let Some(sheet_part) = first_sheet_part(&mut archive)? else {
        return Ok(CellStyleMap::new());
    };
    let Some(sheet_xml) = read_part(&mut archive, &sheet_part)? else {
        return Ok(CellStyleMap::new());
    };

    let mut styles = CellStyleMap::new();
    for (row, column, xf) in parse_cell_style_indices(sheet_xml.as_bytes())? {
        if let Some(style) = xfs.get(xf) {
            styles.insert((row, column), *style);
        }
    }

    debug!(
        file = %path.display(),
        part = %sheet_part,
        formats = xfs.len(),
        styled_cells = styles.len(),
        "单元格样式读取完成"
    );
    Ok(styles)
}

// ==========================================
// 包内部件定位
// ==========================================

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> ImportResult<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

/// workbook.xml 中第一个 sheet → 关系表 → 部件路径
fn first_sheet_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> ImportResult<Option<String>> {
    let Some(workbook) = read_part(archive, "xl/workbook.xml")? else {
        return Ok(None);
    };
    let Some(rel_id) = first_sheet_rel_id(workbook.as_bytes())? else {
        return Ok(None);
    };
    let Some(rels) = read_part(archive, "xl/_rels/workbook.xml.rels")? else {
        return Ok(None);
    };
    Ok(relationship_target(rels.as_bytes(), &rel_id)?.map(|t| part_path(&t)))
}

fn first_sheet_rel_id<R: BufRead>(source: R) -> ImportResult<Option<String>> {
    let mut reader = xml_reader(source);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"sheet" => return attr(&e, b"id"),
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

fn relationship_target<R: BufRead>(source: R, rel_id: &str) -> ImportResult<Option<String>> {
    let mut reader = xml_reader(source);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                if attr(&e, b"Id")?.as_deref() == Some(rel_id) {
                    return attr(&e, b"Target");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// 关系目标 → 包内路径（相对路径以 xl/ 为基准）
fn part_path(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{}", target)
    }
}

// ==========================================
// styles.xml
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

/// 解析样式表，返回按 cellXfs 序号排列的单元格样式
pub fn parse_style_sheet<R: BufRead>(source: R) -> ImportResult<Vec<CellStyle>> {
    let mut reader = xml_reader(source);
    let mut buf = Vec::new();

    let mut section = Section::Other;
    let mut fonts: Vec<FontStyle> = Vec::new();
    let mut fills: Vec<Option<ColorRef>> = Vec::new();
    let mut borders: Vec<Borders> = Vec::new();
    let mut xfs: Vec<CellStyle> = Vec::new();

    let mut font = FontStyle::default();
    let mut fill: Option<ColorRef> = None;
    let mut patterned = false;
    let mut border = Borders::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match (section, e.local_name().as_ref()) {
                (_, b"fonts") => section = Section::Fonts,
                (_, b"fills") => section = Section::Fills,
                (_, b"borders") => section = Section::Borders,
                (_, b"cellXfs") => section = Section::CellXfs,

                (Section::Fonts, b"font") => font = FontStyle::default(),
                (Section::Fonts, b"b") => font.bold = flag_on(&e)?,
                (Section::Fonts, b"i") => font.italic = flag_on(&e)?,
                (Section::Fonts, b"color") => font.color = parse_color(&e)?,

                (Section::Fills, b"fill") => {
                    fill = None;
                    patterned = false;
                }
                (Section::Fills, b"patternFill") => {
                    patterned = attr(&e, b"patternType")?.is_some_and(|p| p != "none");
                }
                (Section::Fills, b"fgColor") if patterned => fill = parse_color(&e)?,

                (Section::Borders, b"border") => border = Borders::default(),
                (Section::Borders, side @ (b"left" | b"right" | b"top" | b"bottom")) => {
                    let line = border_line(attr(&e, b"style")?.as_deref());
                    match side {
                        b"left" => border.left = line,
                        b"right" => border.right = line,
                        b"top" => border.top = line,
                        _ => border.bottom = line,
                    }
                }

                (Section::CellXfs, b"xf") => {
                    let font = index_attr(&e, b"fontId")?.and_then(|i| fonts.get(i).copied());
                    let fill = index_attr(&e, b"fillId")?
                        .and_then(|i| fills.get(i).copied())
                        .flatten();
                    let edges = index_attr(&e, b"borderId")?
                        .and_then(|i| borders.get(i).copied())
                        .unwrap_or_default();
                    xfs.push(CellStyle {
                        fill,
                        font,
                        borders: edges,
                    });
                }
                _ => {}
            },
            Event::End(e) => match (section, e.local_name().as_ref()) {
                (Section::Fonts, b"font") => fonts.push(font),
                (Section::Fills, b"fill") => fills.push(fill),
                (Section::Borders, b"border") => borders.push(border),
                (_, b"fonts" | b"fills" | b"borders" | b"cellXfs") => section = Section::Other,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(xfs)
}

/// `<b/>` / `<i/>`：无 val 视为开启
fn flag_on(e: &BytesStart<'_>) -> ImportResult<bool> {
    Ok(!matches!(attr(e, b"val")?.as_deref(), Some("0") | Some("false")))
}

fn parse_color(e: &BytesStart<'_>) -> ImportResult<Option<ColorRef>> {
    if let Some(rgb) = attr(e, b"rgb")? {
        return Ok(parse_argb(&rgb));
    }
    if let Some(indexed) = attr(e, b"indexed")? {
        return Ok(indexed.parse::<u16>().ok().map(ColorRef::Indexed));
    }
    if matches!(attr(e, b"auto")?.as_deref(), Some("1") | Some("true")) {
        return Ok(Some(ColorRef::Automatic));
    }
    Ok(None)
}

/// `FFRRGGBB` 或 `RRGGBB`
fn parse_argb(raw: &str) -> Option<ColorRef> {
    let hex = raw.get(raw.len().checked_sub(6)?..)?;
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(ColorRef::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn border_line(style: Option<&str>) -> BorderLine {
    match style {
        None | Some("none") => BorderLine::None,
        Some("thin") => BorderLine::Thin,
        Some("medium") => BorderLine::Medium,
        Some("thick") => BorderLine::Thick,
        Some("dashed") => BorderLine::Dashed,
        Some("dotted") => BorderLine::Dotted,
        Some("double") => BorderLine::Double,
        Some("hair") => BorderLine::Hair,
        Some(_) => BorderLine::Other,
    }
}

// ==========================================
// 工作表 XML
// ==========================================

/// 工作表中带 `s` 属性的单元格：(行, 列, cellXfs 序号)
pub fn parse_cell_style_indices<R: BufRead>(
    source: R,
) -> ImportResult<Vec<(usize, usize, usize)>> {
    let mut reader = xml_reader(source);
    let mut buf = Vec::new();
    let mut cells = Vec::new();

    // 省略 r 属性时按文档顺序推算位置
    let mut next_row = 0usize;
    let mut row = 0usize;
    let mut next_column = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                row = index_attr(&e, b"r")?
                    .and_then(|r| r.checked_sub(1))
                    .unwrap_or(next_row);
                next_row = row + 1;
                next_column = 0;
            }
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let position = match attr(&e, b"r")? {
                    Some(reference) => parse_cell_ref(&reference),
                    None => Some((row, next_column)),
                };
                if let Some((cell_row, column)) = position {
                    next_column = column + 1;
                    if let Some(xf) = index_attr(&e, b"s")? {
                        cells.push((cell_row, column, xf));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(cells)
}

/// `B10` → (9, 1)
pub fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let column = letters.chars().fold(0usize, |acc, c| {
        acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1)
    });
    let row: usize = digits.parse().ok()?;
    Some((row.checked_sub(1)?, column - 1))
}

// ==========================================
// XML 工具
// ==========================================

fn xml_reader<R: BufRead>(source: R) -> Reader<R> {
    let mut reader = Reader::from_reader(source);
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.trim_text(true);
    reader
}

/// 按本地名取属性值（忽略命名空间前缀，如 `r:id`）
fn attr(e: &BytesStart<'_>, name: &[u8]) -> ImportResult<Option<String>> {
    for attribute in e.attributes() {
        let attribute = attribute.map_err(|err| ImportError::StyleSheet(err.to_string()))?;
        if attribute.key.local_name().as_ref() == name {
            let value = attribute
                .unescape_value()
                .map_err(|err| ImportError::StyleSheet(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn index_attr(e: &BytesStart<'_>, name: &[u8]) -> ImportResult<Option<usize>> {
    Ok(attr(e, name)?.and_then(|v| v.trim().parse().ok()))
}
