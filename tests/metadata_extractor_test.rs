// ==========================================
// MetadataExtractor 集成测试
// ==========================================
// 测试目标: 固定坐标读取、trim、空白跳过、日期与数值渲染
// ==========================================


use broker_format::domain::sheet::{Cell, Sheet};
use broker_format::engine::MetadataExtractor;
use test_helpers::put_text;

#[test]
fn test_bsm_vessel_is_trimmed() {
    let mut sheet = Sheet::new("RFQ");
    put_text(&mut sheet, 3, 14, "  MV EXAMPLE  ");

    let fields = MetadataExtractor::extract_metadata(&sheet, "BSM");
    assert_eq!(fields.len(), 1);

    let vessel = &fields[0];
    assert_eq!(vessel.section, "RFQ Information");
    assert_eq!(vessel.field_name, "Vessel");
    assert_eq!(vessel.value, "MV EXAMPLE");
    assert_eq!(vessel.source_row, 3);
    assert_eq!(vessel.source_column, 14);
    assert_eq!(vessel.column_letter, "O");
}

#[test]
fn test_blank_and_whitespace_slots_are_skipped() {
    let mut sheet = Sheet::new("RFQ");
    put_text(&mut sheet, 3, 14, "MV EXAMPLE");
    put_text(&mut sheet, 4, 14, "   ");
    sheet.set_cell(5, 14, Cell::blank());
    put_text(&mut sheet, 13, 14, "USD");

    let fields = MetadataExtractor::extract_metadata(&sheet, "BSM SHIP MANAGEMENT");
    let names: Vec<&str> = fields.iter().map(|f| f.field_name.as_str()).collect();
    assert_eq!(names, vec!["Vessel", "Currency"]);
}

#[test]
fn test_fields_follow_declaration_order() {
    let mut sheet = Sheet::new("Quotation");
    // 按行倒序写入，输出仍按档案声明顺序
    put_text(&mut sheet, 7, 6, "2024-02-01");
    put_text(&mut sheet, 7, 1, "ACME SUPPLY");
    put_text(&mut sheet, 1, 4, "MV NORTHERN STAR");
    put_text(&mut sheet, 0, 0, "QUOTATION FORM");

    let fields = MetadataExtractor::extract_metadata(&sheet, "MCTC");
    let names: Vec<&str> = fields.iter().map(|f| f.field_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Document Title", "Vessel Name", "Supplier", "Date"]
    );
    assert!(fields.iter().all(|f| f.section == "Quotation Header"));
}

#[test]
fn test_numeric_and_date_values_render_as_text() {
    let mut sheet = Sheet::new("Quotation");
    sheet.set_cell(2, 4, Cell::number(9876543.0));
    sheet.set_cell(4, 4, Cell::date_serial(45306.0));

    let fields = MetadataExtractor::extract_metadata(&sheet, "MCTC");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].field_name, "IMO Number");
    assert_eq!(fields[0].value, "9876543");
    assert_eq!(fields[1].field_name, "Delivery Date");
    assert_eq!(fields[1].value, "2024-01-15");
}

#[test]
fn test_cma_vendor_block() {
    let mut sheet = Sheet::new("RFQ");
    put_text(&mut sheet, 0, 1, "REQUEST FOR QUOTATION");
    put_text(&mut sheet, 12, 3, "Harbour Provisions");
    put_text(&mut sheet, 16, 3, "sales@harbour.example");

    let fields = MetadataExtractor::extract_metadata(&sheet, "CMA CGM");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0].section, "Company Details");
    assert_eq!(fields[1].section, "Vendor Details");
    assert_eq!(fields[1].field_name, "Vendor Name");
    assert_eq!(fields[2].field_name, "Vendor Email");
    assert_eq!(fields[2].column_letter, "D");
}

#[test]
fn test_unknown_vendor_has_no_metadata() {
    let mut sheet = Sheet::new("Quotation");
    put_text(&mut sheet, 0, 0, "ACME FOODS QUOTATION");
    put_text(&mut sheet, 3, 14, "MV EXAMPLE");

    assert!(MetadataExtractor::extract_metadata(&sheet, "ACME FOODS").is_empty());
    // 档案键区分大小写
    assert!(MetadataExtractor::extract_metadata(&sheet, "bsm").is_empty());
}
