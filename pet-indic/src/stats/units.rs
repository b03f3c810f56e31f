//! 体素值单位的解析, 以及结果表格中各统计量单位的推导.

use log::warn;

use super::measurement::Code;
use super::CodedEntry;
use crate::consts::engine::OUTPUT_SUFFIX;
use crate::consts::UNITS_PLACEHOLDER;

/// 已知的 SUV 单位编码值, 及其对应的 `(物理量编码, 单位编码)`.
fn suv_codes(code_value: &str) -> Option<(Code, Code)> {
    let codes = match code_value {
        "{SUVbw}g/ml" => (
            ("126401", "DCM", "SUVbw"),
            ("{SUVbw}g/ml", "UCUM", "Standardized Uptake Value body weight"),
        ),
        "{SUVlbm}g/ml" => (
            ("126402", "DCM", "SUVlbm"),
            ("{SUVlbm}g/ml", "UCUM", "Standardized Uptake Value lean body mass"),
        ),
        "{SUVbsa}g/ml" => (
            ("126403", "DCM", "SUVbsa"),
            ("{SUVbsa}g/ml", "UCUM", "Standardized Uptake Value body surface area"),
        ),
        "{SUVibw}g/ml" => (
            ("126404", "DCM", "SUVibw"),
            ("{SUVibw}g/ml", "UCUM", "Standardized Uptake Value ideal body weight"),
        ),
        "{SUV}g/ml" => (
            ("126400", "DCM", "SUV"),
            ("{SUV}g/ml", "UCUM", "Standardized Uptake Value"),
        ),
        _ => return None,
    };
    Some(codes)
}

/// 灰度图像的体素值单位, 由物理量编码和单位编码组成.
///
/// 两者都可能未知. 未知时相关统计量的单位字段留空, 而不是报错.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUnits {
    quantity: Option<CodedEntry>,
    units: Option<CodedEntry>,
}

impl ImageUnits {
    /// 直接使用图像自带的编码条目.
    pub fn from_coded(quantity: Option<CodedEntry>, units: CodedEntry) -> Self {
        Self {
            quantity,
            units: Some(units),
        }
    }

    /// 通过单位编码值 (如 `{SUVbw}g/ml`) 查询 SUV 单位表.
    ///
    /// 无法识别的非空编码值会输出一条警告, 并返回未解析的单位.
    pub fn from_code_value(code_value: &str) -> Self {
        let code_value = code_value.trim();
        match suv_codes(code_value) {
            Some((quantity, units)) => Self {
                quantity: Some(quantity.into()),
                units: Some(units.into()),
            },
            None => {
                if !code_value.is_empty() {
                    warn!("unrecognized voxel units `{code_value}`");
                }
                Self::unresolved()
            }
        }
    }

    /// 未解析的单位.
    #[inline]
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// 单位是否已解析?
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.units.is_some()
    }

    /// 单位的展示文字, 即单位编码的含义.
    #[inline]
    pub fn units(&self) -> Option<&str> {
        self.units.as_ref().map(|c| c.code_meaning.as_str())
    }

    /// 单位编码值, 如 `{SUVbw}g/ml`.
    #[inline]
    pub fn code_value(&self) -> Option<&str> {
        self.units.as_ref().map(|c| c.code_value.as_str())
    }

    /// 单位编码.
    #[inline]
    pub fn units_code(&self) -> Option<&CodedEntry> {
        self.units.as_ref()
    }

    /// 物理量编码.
    #[inline]
    pub fn quantity(&self) -> Option<&CodedEntry> {
        self.quantity.as_ref()
    }
}

/// 推导结果表格中, 统计量 `index_name` 的单位文字.
///
/// `image_units` 为体素值单位编码值, 只识别 `{SUVbw}g/ml`, `{SUVlbm}g/ml` 和
/// `{SUVibw}g/ml`, 其裸单位为花括号内的文字. `index_name` 为引擎输出项名,
/// 可以带或不带 `_s` 后缀, 下划线和空格等价.
///
/// 无法推导时返回 `-` 并输出警告.
pub fn units_for_index(image_units: &str, index_name: &str) -> String {
    let bare = match image_units {
        "{SUVbw}g/ml" | "{SUVlbm}g/ml" | "{SUVibw}g/ml" => image_units
            .split_once('{')
            .and_then(|(_, rest)| rest.split_once('}'))
            .map(|(bare, _)| bare),
        _ => None,
    };
    let Some(bare) = bare else {
        warn!("could not interpret units for {index_name}. Units: {image_units}");
        return UNITS_PLACEHOLDER.to_string();
    };

    let name = index_name.trim();
    let name = name.strip_suffix(OUTPUT_SUFFIX).unwrap_or(name).replace('_', " ");
    match name.as_str() {
        "Mean" | "Std Deviation" | "Min" | "Max" | "Peak" | "First Quartile" | "Median"
        | "Third Quartile" | "Upper Adjacent" | "RMS" | "SAM Background" => bare.to_string(),
        "Volume" => "ml".to_string(),
        "TLG" | "Glycolysis Q1" | "Glycolysis Q2" | "Glycolysis Q3" | "Glycolysis Q4" | "SAM" => {
            format!("{bare}*ml")
        }
        "Q1 Distribution" | "Q2 Distribution" | "Q3 Distribution" | "Q4 Distribution" => {
            "%".to_string()
        }
        _ => {
            warn!("could not interpret units for {index_name}. Units: {image_units}");
            UNITS_PLACEHOLDER.to_string()
        }
    }
}
