// ==========================================
// 经纪商报价格式识别 - 领域类型定义
// ==========================================
// 职责: 标准字段枚举、识别策略
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 标准字段 (Standard Field)
// ==========================================
// 开放枚举: 新经纪商可能需要新增成员
macro_rules! standard_fields {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[non_exhaustive]
        pub enum StandardField {
            $($variant),+
        }

        impl StandardField {
            /// 全部成员（声明顺序）
            pub const ALL: &'static [StandardField] = &[$(StandardField::$variant),+];

            /// 数据库 / 报表使用的字符串形式
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(StandardField::$variant => $name),+
                }
            }
        }

        impl FromStr for StandardField {
            type Err = UnknownStandardField;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($name => Ok(StandardField::$variant),)+
                    other => Err(UnknownStandardField(other.to_string())),
                }
            }
        }
    };
}

standard_fields! {
    ItemCode => "ITEM_CODE",
    ItemName => "ITEM_NAME",
    Description => "DESCRIPTION",
    Category => "CATEGORY",
    Uom => "UOM",
    UomOffered => "UOM_OFFERED",
    Quantity => "QUANTITY",
    QuantityRequested => "QUANTITY_REQUESTED",
    QuantityOffered => "QUANTITY_OFFERED",
    UnitPrice => "UNIT_PRICE",
    Discount => "DISCOUNT",
    Vat => "VAT",
    Total => "TOTAL",
    LineNo => "LINE_NO",
    Brand => "BRAND",
    SupplierComments => "SUPPLIER_COMMENTS",
    OclCode => "OCL_CODE",
    VscCode => "VSC_CODE",
    ExpiryDate => "EXPIRY_DATE",
    SupplierCode => "SUPPLIER_CODE",
    Case => "CASE",
    CaseSize => "CASE_SIZE",
    Package => "PACKAGE",
    PackageSize => "PACKAGE_SIZE",
    Metric => "METRIC",
    Weight => "WEIGHT",
    Vessel => "VESSEL",
    Quality => "QUALITY",
    DeliveryDays => "DELIVERY_DAYS",
    OfficeNotes => "OFFICE_NOTES",
    VesselNotes => "VESSEL_NOTES",
    ReferenceNo => "REFERENCE_NO",
    DrawingNo => "DRAWING_NO",
}

impl fmt::Display for StandardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 无法识别的标准字段名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStandardField(pub String);

impl fmt::Display for UnknownStandardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知的标准字段: {}", self.0)
    }
}

impl std::error::Error for UnknownStandardField {}

// ==========================================
// 识别策略 (Detection Strategy)
// ==========================================
// 每次识别调用只做一次分支: 命中档案 / 通用回退
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionStrategy {
    /// 命中经纪商档案（key 为档案匹配子串）
    Profile { key: String },
    /// 关键词打分回退
    Generic,
}

impl DetectionStrategy {
    pub fn to_db_str(&self) -> String {
        match self {
            DetectionStrategy::Profile { key } => format!("PROFILE:{}", key),
            DetectionStrategy::Generic => "GENERIC".to_string(),
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s.strip_prefix("PROFILE:") {
            Some(key) => DetectionStrategy::Profile {
                key: key.to_string(),
            },
            None => DetectionStrategy::Generic,
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_db_str())
    }
}
