// ==========================================
// 经纪商报价格式识别 - 经纪商档案注册表
// ==========================================
// 职责: 静态只读档案表（表头定位 + 字段匹配规则 + 元数据坐标）
// 红线: 新增经纪商只改数据，不改识别逻辑
// 红线: 列映射与元数据使用同一优先级顺序解析
// ==========================================

use crate::domain::sheet::column_letter;
use crate::domain::types::StandardField;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use self::HeaderMatch::{AllOf, AnyOf, Contains, Equals, FieldAssigned, FieldUnassigned, Not};

/// 通用扫描窗口宽度
pub const GENERIC_SCAN_WIDTH: usize = 20;

// ==========================================
// 匹配谓词
// ==========================================

/// 表头匹配谓词（作用于归一化后的表头文本）
///
/// `FieldAssigned` / `FieldUnassigned` 读取同一次扫描中已分配的字段。
#[derive(Debug, Clone, Copy)]
pub enum HeaderMatch {
    Equals(&'static str),
    Contains(&'static str),
    AllOf(&'static [HeaderMatch]),
    AnyOf(&'static [HeaderMatch]),
    Not(&'static HeaderMatch),
    FieldAssigned(StandardField),
    FieldUnassigned(StandardField),
}

impl HeaderMatch {
    pub fn matches(&self, normalized: &str, assigned: &BTreeMap<StandardField, usize>) -> bool {
        match self {
            Equals(expected) => normalized == *expected,
            Contains(needle) => normalized.contains(needle),
            AllOf(parts) => parts.iter().all(|p| p.matches(normalized, assigned)),
            AnyOf(parts) => parts.iter().any(|p| p.matches(normalized, assigned)),
            Not(inner) => !inner.matches(normalized, assigned),
            FieldAssigned(field) => assigned.contains_key(field),
            FieldUnassigned(field) => !assigned.contains_key(field),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: StandardField,
    pub pattern: HeaderMatch,
}

const fn rule(field: StandardField, pattern: HeaderMatch) -> FieldRule {
    FieldRule { field, pattern }
}

/// 首个命中的规则（每列只取一条）
pub fn first_matching_rule<'a>(
    rules: &'a [FieldRule],
    normalized: &str,
    assigned: &BTreeMap<StandardField, usize>,
) -> Option<&'a FieldRule> {
    rules.iter().find(|r| r.pattern.matches(normalized, assigned))
}

// ==========================================
// 档案结构
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLocator {
    /// 固定表头行，扫描列 0..scan_width
    Fixed { row: usize, scan_width: usize },
    /// 关键词打分选行
    Generic,
}

impl fmt::Display for HeaderLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderLocator::Fixed { row, scan_width } => {
                let last = column_letter(scan_width.saturating_sub(1));
                write!(f, "fixed row {} (columns A-{})", row + 1, last)
            }
            HeaderLocator::Generic => write!(f, "keyword scoring"),
        }
    }
}

/// 固定坐标的元数据声明
#[derive(Debug, Clone, Copy)]
pub struct MetadataSlot {
    pub section: &'static str,
    pub field_name: &'static str,
    pub row: usize,
    pub column: usize,
}

const fn slot(
    section: &'static str,
    field_name: &'static str,
    row: usize,
    column: usize,
) -> MetadataSlot {
    MetadataSlot {
        section,
        field_name,
        row,
        column,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VendorProfile {
    /// 经纪商名称中需包含的子串（区分大小写）
    pub key: &'static str,
    pub display_name: &'static str,
    pub header: HeaderLocator,
    pub rules: &'static [FieldRule],
    pub metadata: &'static [MetadataSlot],
}

impl VendorProfile {
    pub fn matches_vendor(&self, vendor_name: &str) -> bool {
        vendor_name.contains(self.key)
    }
}

// ==========================================
// 字段规则表
// ==========================================

static MCTC_RULES: &[FieldRule] = &[
    rule(
        StandardField::ItemCode,
        AnyOf(&[Contains("REF NO"), Contains("MCTC")]),
    ),
    rule(
        StandardField::Category,
        AnyOf(&[Equals("FOOD CATEGORIES"), Contains("CATEGORIES")]),
    ),
    rule(StandardField::ItemName, Equals("ITEM")),
    rule(StandardField::Description, Contains("ITEM DESCRIPTION")),
    rule(StandardField::Uom, Contains("UNIT OF MEASURE")),
    rule(
        StandardField::Quantity,
        AnyOf(&[Contains("QUANTITY ORDER"), Contains("QUANTITY")]),
    ),
    rule(StandardField::UnitPrice, Equals("PRICE")),
    rule(
        StandardField::SupplierComments,
        Contains("SUPPLIER COMMENTS"),
    ),
    rule(StandardField::Total, Equals("TOTAL")),
];

static OCEANIC_RULES: &[FieldRule] = &[
    rule(StandardField::Category, Equals("CATEGORY")),
    rule(
        StandardField::ItemName,
        AllOf(&[Contains("ITEM"), Contains("DESCRIPTION")]),
    ),
    rule(StandardField::OclCode, Contains("OCL CODE")),
    rule(StandardField::VscCode, Contains("VSC CODE")),
    rule(StandardField::ExpiryDate, Contains("EXPIRY DATE")),
    rule(StandardField::Quantity, Contains("REQUESTED QUANTITY")),
    rule(StandardField::Uom, Contains("OCL UOM")),
    rule(StandardField::SupplierCode, Contains("SUPPLIER CODE")),
    rule(StandardField::Case, Equals("CASE")),
    rule(StandardField::CaseSize, Equals("CASE SIZE")),
    rule(StandardField::Package, Equals("PACKAGE")),
    rule(StandardField::PackageSize, Equals("PACKAGE SIZE")),
    rule(StandardField::Metric, Equals("METRIC")),
    rule(StandardField::Brand, Equals("BRAND")),
    rule(StandardField::UnitPrice, Contains("UNIT COST")),
];

static CMA_RULES: &[FieldRule] = &[
    rule(StandardField::LineNo, Equals("NO")),
    rule(StandardField::ItemCode, Contains("ITEM CODE")),
    rule(StandardField::ItemName, Equals("DESCRIPTION")),
    rule(StandardField::Brand, Equals("BRAND")),
    rule(StandardField::Weight, Equals("WEIGHT")),
    rule(StandardField::Uom, Equals("UNIT")),
    rule(StandardField::Package, Equals("PACKAGE")),
    rule(StandardField::Quantity, Equals("QUANTITY")),
    rule(StandardField::UnitPrice, Contains("UNIT PRICE")),
    rule(StandardField::Discount, Contains("DISCOUNT")),
    rule(StandardField::Vat, Contains("VAT")),
    rule(StandardField::Total, Contains("TOTAL PRICE")),
];

static GARRETS_RULES: &[FieldRule] = &[
    rule(StandardField::LineNo, AnyOf(&[Equals("NO."), Equals("NO")])),
    rule(StandardField::ItemCode, Contains("PART")),
    rule(StandardField::Vessel, Equals("VESSEL")),
    rule(StandardField::ItemName, Equals("DESCRIPTION")),
    rule(StandardField::Quality, Equals("QUALITY")),
    rule(StandardField::Uom, Equals("UNIT")),
    rule(StandardField::Quantity, Equals("QUANTITY")),
    rule(StandardField::UnitPrice, Contains("UNIT PRICE")),
    rule(StandardField::Discount, Contains("DISC")),
    rule(
        StandardField::DeliveryDays,
        AllOf(&[Contains("DEL"), Contains("DAYS")]),
    ),
];

// 第二个 UOM 列记为报价单位
static PROCURESHIP_RULES: &[FieldRule] = &[
    rule(StandardField::LineNo, AnyOf(&[Equals("NO."), Equals("NO")])),
    rule(StandardField::ItemName, Equals("DESCRIPTION")),
    rule(StandardField::OfficeNotes, Contains("ITEM OFFICE NOTES")),
    rule(StandardField::VesselNotes, Contains("VESSEL NOTES")),
    rule(
        StandardField::ItemCode,
        AnyOf(&[Contains("ITEM CODE"), Contains("PART NO")]),
    ),
    rule(StandardField::ReferenceNo, Contains("REFERENCE NO")),
    rule(StandardField::DrawingNo, Contains("DRAWING NO")),
    rule(
        StandardField::QuantityRequested,
        Contains("QUANTITY REQUESTED"),
    ),
    rule(
        StandardField::Uom,
        AllOf(&[Equals("UOM"), FieldUnassigned(StandardField::Uom)]),
    ),
    rule(StandardField::QuantityOffered, Contains("QUANTITY OFFERED")),
    rule(
        StandardField::UomOffered,
        AllOf(&[Equals("UOM"), FieldAssigned(StandardField::Uom)]),
    ),
    rule(StandardField::UnitPrice, Contains("UNIT COST")),
    rule(StandardField::Discount, Contains("DISC")),
    rule(StandardField::Total, Contains("LINE COST")),
];

/// 通用回退规则（比档案规则宽松）
pub static GENERIC_RULES: &[FieldRule] = &[
    rule(
        StandardField::ItemCode,
        AllOf(&[Contains("ITEM"), Contains("CODE")]),
    ),
    rule(
        StandardField::ItemName,
        AnyOf(&[
            Contains("DESCRIPTION"),
            AllOf(&[Contains("ITEM"), Not(&Contains("CODE"))]),
        ]),
    ),
    rule(
        StandardField::Quantity,
        AnyOf(&[Contains("QUANTITY"), Equals("QTY")]),
    ),
    rule(
        StandardField::UnitPrice,
        AllOf(&[Contains("UNIT"), Contains("PRICE")]),
    ),
    rule(StandardField::UnitPrice, Equals("PRICE")),
    rule(StandardField::Uom, AnyOf(&[Equals("UOM"), Equals("UNIT")])),
    rule(
        StandardField::Total,
        AnyOf(&[Contains("TOTAL"), Contains("AMOUNT")]),
    ),
    rule(StandardField::Brand, Contains("BRAND")),
    rule(StandardField::Category, Contains("CATEGORY")),
];

// ==========================================
// 元数据坐标表
// ==========================================

const COMPANY_DETAILS: &str = "Company Details";
const RFQ_INFORMATION: &str = "RFQ Information";
const VENDOR_DETAILS: &str = "Vendor Details";
const SUPPLIER_INFORMATION: &str = "Supplier Information";

static BSM_METADATA: &[MetadataSlot] = &[
    slot(COMPANY_DETAILS, "Company Name Line 1", 3, 0),
    slot(COMPANY_DETAILS, "Company Name Line 2", 4, 0),
    slot(COMPANY_DETAILS, "Company Name Line 3", 5, 0),
    slot(COMPANY_DETAILS, "Company Name Line 4", 6, 0),
    slot(COMPANY_DETAILS, "Company Address", 7, 0),
    slot(COMPANY_DETAILS, "Company Contact", 8, 0),
    slot(COMPANY_DETAILS, "Company Email Label", 9, 0),
    slot(COMPANY_DETAILS, "Company Email", 9, 2),
    slot(COMPANY_DETAILS, "Company Web Label", 10, 0),
    slot(COMPANY_DETAILS, "Company Web", 10, 2),
    slot(RFQ_INFORMATION, "Vessel", 3, 14),
    slot(RFQ_INFORMATION, "RFQ Number", 4, 14),
    slot(RFQ_INFORMATION, "RFQ Date", 5, 14),
    slot(RFQ_INFORMATION, "Submit Quote Before", 7, 14),
    slot(RFQ_INFORMATION, "Port of Delivery", 8, 11),
    slot(RFQ_INFORMATION, "Vessel ETA", 9, 14),
    slot(RFQ_INFORMATION, "Payment Terms", 10, 14),
    slot(RFQ_INFORMATION, "Payment Days", 10, 18),
    slot(RFQ_INFORMATION, "Vendor Reference", 11, 12),
    slot(RFQ_INFORMATION, "Delivery Term", 12, 14),
    slot(RFQ_INFORMATION, "Currency", 13, 14),
    slot(RFQ_INFORMATION, "Discount Percentage", 14, 12),
    slot(RFQ_INFORMATION, "VAT Percentage", 15, 12),
    slot(RFQ_INFORMATION, "Place City", 16, 12),
    slot(VENDOR_DETAILS, "Vendor Name", 12, 3),
    slot(VENDOR_DETAILS, "Vendor Address", 13, 3),
    slot(VENDOR_DETAILS, "Vendor City", 14, 3),
    slot(VENDOR_DETAILS, "Vendor Phone", 15, 3),
    slot(VENDOR_DETAILS, "Vendor Email", 16, 3),
];

static MCTC_METADATA: &[MetadataSlot] = &[
    slot("Quotation Header", "Document Title", 0, 0),
    slot("Quotation Header", "Vessel Name", 1, 4),
    slot("Quotation Header", "IMO Number", 2, 4),
    slot("Quotation Header", "Port of Delivery", 3, 4),
    slot("Quotation Header", "Delivery Date", 4, 4),
    slot("Quotation Header", "Supplier", 7, 1),
    slot("Quotation Header", "Quotation Number", 7, 3),
    slot("Quotation Header", "Date", 7, 6),
];

static OCEANIC_METADATA: &[MetadataSlot] = &[
    slot("Company Information", "Company Name", 0, 0),
    slot("Request Information", "Quotation Request Number", 4, 2),
    slot("Request Information", "Quotation Request Date", 5, 2),
    slot("Request Information", "Est. Delivery Date", 6, 2),
    slot("Request Information", "Loading Port", 7, 2),
    slot("Request Information", "Vessel", 8, 2),
];

static CMA_METADATA: &[MetadataSlot] = &[
    slot(COMPANY_DETAILS, "RFQ Label", 0, 1),
    slot(COMPANY_DETAILS, "Company Name", 3, 0),
    slot(COMPANY_DETAILS, "Company Info", 4, 0),
    slot(VENDOR_DETAILS, "Vendor Name", 12, 3),
    slot(VENDOR_DETAILS, "Vendor Address", 13, 3),
    slot(VENDOR_DETAILS, "Vendor City", 14, 3),
    slot(VENDOR_DETAILS, "Vendor Phone", 15, 3),
    slot(VENDOR_DETAILS, "Vendor Email", 16, 3),
];

static GARRETS_METADATA: &[MetadataSlot] = &[
    slot(RFQ_INFORMATION, "Document Title", 0, 0),
    slot(RFQ_INFORMATION, "RFQ Number", 2, 1),
    slot(RFQ_INFORMATION, "Vessel Name", 3, 1),
    slot(RFQ_INFORMATION, "Port", 4, 1),
    slot(RFQ_INFORMATION, "ETA Date", 5, 1),
    slot(RFQ_INFORMATION, "Request Date", 6, 1),
    slot(RFQ_INFORMATION, "Due Date", 7, 1),
    slot(SUPPLIER_INFORMATION, "Supplier Name", 10, 1),
    slot(SUPPLIER_INFORMATION, "Address", 11, 1),
    slot(SUPPLIER_INFORMATION, "Contact Person", 12, 1),
    slot(SUPPLIER_INFORMATION, "Email", 13, 1),
    slot(SUPPLIER_INFORMATION, "Phone", 14, 1),
    slot(SUPPLIER_INFORMATION, "Currency", 16, 1),
    slot(SUPPLIER_INFORMATION, "Payment Terms", 17, 1),
];

static PROCURESHIP_METADATA: &[MetadataSlot] = &[
    slot("Requisition Information", "Document Title", 0, 0),
    slot("Requisition Information", "Vessel Name", 2, 1),
    slot("Requisition Information", "IMO Number", 3, 1),
    slot("Requisition Information", "Requisition Number", 4, 1),
    slot("Requisition Information", "Port", 5, 1),
    slot("Requisition Information", "ETA Date", 6, 1),
    slot("Requisition Information", "Request Date", 7, 1),
    slot(SUPPLIER_INFORMATION, "Supplier Name", 9, 1),
    slot(SUPPLIER_INFORMATION, "Contact", 10, 1),
    slot(SUPPLIER_INFORMATION, "Email", 11, 1),
    slot(SUPPLIER_INFORMATION, "Phone", 12, 1),
];

// ==========================================
// 注册表（按优先级排列）
// ==========================================

pub static PROFILES: &[VendorProfile] = &[
    VendorProfile {
        key: "MCTC",
        display_name: "MCTC",
        header: HeaderLocator::Fixed {
            row: 9,
            scan_width: 15,
        },
        rules: MCTC_RULES,
        metadata: MCTC_METADATA,
    },
    VendorProfile {
        key: "OCEANIC",
        display_name: "Oceanic",
        header: HeaderLocator::Fixed {
            row: 12,
            scan_width: 20,
        },
        rules: OCEANIC_RULES,
        metadata: OCEANIC_METADATA,
    },
    VendorProfile {
        key: "CMA",
        display_name: "CMA",
        header: HeaderLocator::Fixed {
            row: 18,
            scan_width: 20,
        },
        rules: CMA_RULES,
        metadata: CMA_METADATA,
    },
    VendorProfile {
        key: "GARRETS",
        display_name: "Garrets",
        header: HeaderLocator::Fixed {
            row: 24,
            scan_width: 20,
        },
        rules: GARRETS_RULES,
        metadata: GARRETS_METADATA,
    },
    VendorProfile {
        key: "PROCURESHIP",
        display_name: "Procureship",
        header: HeaderLocator::Fixed {
            row: 13,
            scan_width: 20,
        },
        rules: PROCURESHIP_RULES,
        metadata: PROCURESHIP_METADATA,
    },
    VendorProfile {
        key: "BSM",
        display_name: "BSM",
        header: HeaderLocator::Generic,
        rules: GENERIC_RULES,
        metadata: BSM_METADATA,
    },
];

pub struct VendorProfileRegistry;

impl VendorProfileRegistry {
    /// 按优先级顺序做子串匹配，首个命中的档案胜出
    pub fn resolve(vendor_name: &str) -> Option<&'static VendorProfile> {
        let profile = PROFILES.iter().find(|p| p.matches_vendor(vendor_name));
        match profile {
            Some(p) => debug!(vendor = %vendor_name, profile = p.key, "命中经纪商档案"),
            None => debug!(vendor = %vendor_name, "未命中任何经纪商档案"),
        }
        profile
    }

    /// 全部档案（优先级顺序）
    pub fn profiles() -> &'static [VendorProfile] {
        PROFILES
    }

    /// 命中档案的展示名；未命中返回 None（走通用识别）
    pub fn display_name_for(vendor_name: &str) -> Option<&'static str> {
        Self::resolve(vendor_name).map(|p| p.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_fields() -> BTreeMap<StandardField, usize> {
        BTreeMap::new()
    }

    #[test]
    fn test_resolve_by_substring() {
        assert_eq!(
            VendorProfileRegistry::resolve("MCTC MARINE LTD").map(|p| p.key),
            Some("MCTC")
        );
        assert_eq!(
            VendorProfileRegistry::resolve("THE OCEANIC GROUP").map(|p| p.key),
            Some("OCEANIC")
        );
        assert!(VendorProfileRegistry::resolve("ACME FOODS").is_none());
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        assert!(VendorProfileRegistry::resolve("mctc marine").is_none());
    }

    #[test]
    fn test_priority_order_first_wins() {
        // 同时包含 CMA 与 BSM
        assert_eq!(
            VendorProfileRegistry::resolve("BSM-CMA JOINT").map(|p| p.key),
            Some("CMA")
        );
        assert_eq!(
            VendorProfileRegistry::resolve("MCTC OCEANIC").map(|p| p.key),
            Some("MCTC")
        );
    }

    #[test]
    fn test_first_matching_rule_within_column() {
        // "MCTC'S REF NO" 同时含 REF NO 与 MCTC，只取第一条
        let hit = first_matching_rule(MCTC_RULES, "MCTC'S REF NO", &no_fields());
        assert_eq!(hit.map(|r| r.field), Some(StandardField::ItemCode));

        let hit = first_matching_rule(MCTC_RULES, "ITEM", &no_fields());
        assert_eq!(hit.map(|r| r.field), Some(StandardField::ItemName));
    }

    #[test]
    fn test_generic_item_rules() {
        let hit = first_matching_rule(GENERIC_RULES, "ITEM CODE", &no_fields());
        assert_eq!(hit.map(|r| r.field), Some(StandardField::ItemCode));

        let hit = first_matching_rule(GENERIC_RULES, "ITEM", &no_fields());
        assert_eq!(hit.map(|r| r.field), Some(StandardField::ItemName));

        let hit = first_matching_rule(GENERIC_RULES, "QTY", &no_fields());
        assert_eq!(hit.map(|r| r.field), Some(StandardField::Quantity));

        assert!(first_matching_rule(GENERIC_RULES, "REMARKS", &no_fields()).is_none());
    }

    #[test]
    fn test_state_dependent_uom_rules() {
        let hit = first_matching_rule(PROCURESHIP_RULES, "UOM", &no_fields());
        assert_eq!(hit.map(|r| r.field), Some(StandardField::Uom));

        let mut assigned = no_fields();
        assigned.insert(StandardField::Uom, 5);
        let hit = first_matching_rule(PROCURESHIP_RULES, "UOM", &assigned);
        assert_eq!(hit.map(|r| r.field), Some(StandardField::UomOffered));
    }

    #[test]
    fn test_profiles_listed_in_priority_order() {
        let keys: Vec<&str> = VendorProfileRegistry::profiles()
            .iter()
            .map(|p| p.key)
            .collect();
        assert_eq!(keys, vec!["MCTC", "OCEANIC", "CMA", "GARRETS", "PROCURESHIP", "BSM"]);
    }

    #[test]
    fn test_display_name_for_resolved_vendor() {
        assert_eq!(
            VendorProfileRegistry::display_name_for("OCEANIC SHIP SUPPLY"),
            Some("Oceanic")
        );
        // CMA 排在 GARRETS 前
        assert_eq!(
            VendorProfileRegistry::display_name_for("GARRETS CMA"),
            Some("CMA")
        );
        assert_eq!(VendorProfileRegistry::display_name_for("ACME FOODS"), None);
    }

    #[test]
    fn test_header_locator_display() {
        let fixed = HeaderLocator::Fixed {
            row: 9,
            scan_width: 15,
        };
        assert_eq!(fixed.to_string(), "fixed row 10 (columns A-O)");
        assert_eq!(HeaderLocator::Generic.to_string(), "keyword scoring");
    }

    #[test]
    fn test_profiles_have_unique_keys_and_metadata() {
        let mut keys: Vec<&str> = PROFILES.iter().map(|p| p.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), PROFILES.len());
        assert!(PROFILES.iter().all(|p| !p.metadata.is_empty()));
    }
}
