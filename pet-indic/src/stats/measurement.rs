//! 统计量的描述性元信息: 名称, 说明, 单位, 以及 DICOM 编码.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ImageUnits, StatisticKey};

/// 静态编码表中的一项: `(code value, coding scheme designator, code meaning)`.
pub(crate) type Code = (&'static str, &'static str, &'static str);

/// DICOM 编码条目.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodedEntry {
    /// 编码值, 如 `126401`.
    pub code_value: String,
    /// 编码体系, 如 `DCM`.
    pub coding_scheme_designator: String,
    /// 编码含义, 如 `SUVbw`.
    pub code_meaning: String,
}

impl CodedEntry {
    /// 构建编码条目.
    pub fn new(
        code_value: impl Into<String>,
        coding_scheme_designator: impl Into<String>,
        code_meaning: impl Into<String>,
    ) -> Self {
        Self {
            code_value: code_value.into(),
            coding_scheme_designator: coding_scheme_designator.into(),
            code_meaning: code_meaning.into(),
        }
    }

    /// 转换为 `CodeValue:<v>|CodingSchemeDesignator:<s>|CodeMeaning:<m>` 形式的字符串.
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl From<Code> for CodedEntry {
    #[inline]
    fn from((v, s, m): Code) -> Self {
        Self::new(v, s, m)
    }
}

impl Display for CodedEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CodeValue:{}|CodingSchemeDesignator:{}|CodeMeaning:{}",
            self.code_value, self.coding_scheme_designator, self.code_meaning
        )
    }
}

/// 解析编码条目字符串失败.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCodeError {
    /// 某一段不是 `Name:value` 形式.
    Malformed(String),

    /// 未知字段名.
    UnknownField(String),

    /// 字段重复出现.
    DuplicateField(&'static str),

    /// 缺少必需字段.
    MissingField(&'static str),
}

impl Display for ParseCodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseCodeError::Malformed(s) => write!(f, "malformed coded entry segment `{s}`"),
            ParseCodeError::UnknownField(s) => write!(f, "unknown coded entry field `{s}`"),
            ParseCodeError::DuplicateField(s) => write!(f, "duplicate coded entry field `{s}`"),
            ParseCodeError::MissingField(s) => write!(f, "missing coded entry field `{s}`"),
        }
    }
}

impl std::error::Error for ParseCodeError {}

impl FromStr for CodedEntry {
    type Err = ParseCodeError;

    /// 解析 [`CodedEntry::as_string`] 的输出. 字段顺序任意, 三个字段都必须出现.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const FIELDS: [&str; 3] = ["CodeValue", "CodingSchemeDesignator", "CodeMeaning"];
        let mut values: [Option<String>; 3] = Default::default();
        for segment in s.trim().split('|') {
            let (name, value) = segment
                .split_once(':')
                .ok_or_else(|| ParseCodeError::Malformed(segment.to_string()))?;
            let idx = FIELDS
                .iter()
                .position(|f| *f == name.trim())
                .ok_or_else(|| ParseCodeError::UnknownField(name.to_string()))?;
            if values[idx].replace(value.to_string()).is_some() {
                return Err(ParseCodeError::DuplicateField(FIELDS[idx]));
            }
        }
        let [v, s, m] = values;
        Ok(Self {
            code_value: v.ok_or(ParseCodeError::MissingField(FIELDS[0]))?,
            coding_scheme_designator: s.ok_or(ParseCodeError::MissingField(FIELDS[1]))?,
            code_meaning: m.ok_or(ParseCodeError::MissingField(FIELDS[2]))?,
        })
    }
}

/// 统计量的描述性元信息.
///
/// 各编码字段为 `None` 表示不适用或未知.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementInfo {
    /// 展示名称, 如 `Standard deviation`.
    pub name: String,
    /// 说明文字.
    pub description: String,
    /// 单位的展示文字. 体素值单位未知时为 `None`.
    pub units: Option<String>,
    /// 物理量编码.
    pub quantity_code: Option<CodedEntry>,
    /// 单位编码.
    pub units_code: Option<CodedEntry>,
    /// 派生方式编码, 如均值, 中位数.
    pub derivation_code: Option<CodedEntry>,
    /// 测量方法编码.
    pub measurement_method_code: Option<CodedEntry>,
}

const GRAM: Code = ("g", "UCUM", "Gram");
const PERCENT: Code = ("%", "UCUM", "Percent");
const MILLILITER: Code = ("ml", "UCUM", "Milliliter");

/// 单个统计量元信息的静态部分.
///
/// `units` 或 `quantity` 为 `None` 时取自图像的体素值单位.
struct Template {
    name: &'static str,
    description: &'static str,
    units: Option<(&'static str, Code)>,
    quantity: Option<Code>,
    derivation: Option<Code>,
    method: Option<Code>,
}

impl Template {
    /// 与体素值同单位, 由派生方式区分的统计量.
    const fn derived(name: &'static str, description: &'static str, derivation: Code) -> Self {
        Self {
            name,
            description,
            units: None,
            quantity: None,
            derivation: Some(derivation),
            method: None,
        }
    }

    /// 单位和物理量均固定的统计量.
    const fn fixed(
        name: &'static str,
        description: &'static str,
        units: Code,
        quantity: Code,
    ) -> Self {
        Self {
            name,
            description,
            units: Some((units.0, units)),
            quantity: Some(quantity),
            derivation: None,
            method: None,
        }
    }
}

fn template(key: StatisticKey) -> Template {
    use StatisticKey::*;
    match key {
        Mean => Template::derived("Mean", "Mean uptake value", ("R-00317", "SRT", "Mean")),
        Std => Template::derived(
            "Standard deviation",
            "Standard deviation of uptake values",
            ("R-10047", "SRT", "Standard Deviation"),
        ),
        Min => Template::derived(
            "Minimum",
            "Minimum uptake value",
            ("R-404FB", "SRT", "Minimum"),
        ),
        Max => Template::derived("Maximum", "Maximum uptake value", ("G-A437", "SRT", "Maximum")),
        Rms => Template::derived(
            "RMS",
            "Root mean square uptake value",
            ("C2347976", "UMLS", "RMS"),
        ),
        Volume => Template {
            method: Some(("126030", "DCM", "Sum of segmented voxel volumes")),
            ..Template::fixed(
                "Volume",
                "Sum of segmented voxel volumes",
                MILLILITER,
                ("G-D705", "SRT", "Volume"),
            )
        },
        FirstQuartile => Template::derived(
            "1st quartile",
            "1st quartile uptake value",
            ("250137", "99PMP", "25th Percentile Value"),
        ),
        Median => Template::derived("Median", "Median uptake value", ("R-00319", "SRT", "Median")),
        ThirdQuartile => Template::derived(
            "3rd quartile",
            "3rd quartile uptake value",
            ("250138", "99PMP", "75th Percentile Value"),
        ),
        UpperAdjacent => Template::fixed(
            "Upper_adjacent",
            "Upper adjacent",
            PERCENT,
            ("250139", "99PMP", "Upper Adjacent Value"),
        ),
        Tlg => Template::fixed(
            "TLG",
            "Total lesion glycolysis",
            GRAM,
            ("126033", "DCM", "Total Lesion Glycolysis"),
        ),
        GlycolysisQ1 => Template::fixed(
            "Glycolysis Q1",
            "Glycolysis within first quarter of intensity range",
            GRAM,
            ("250145", "99PMP", "Glycolysis Within First Quarter of Intensity Range"),
        ),
        GlycolysisQ2 => Template::fixed(
            "Glycolysis Q2",
            "Glycolysis within second quarter of intensity range",
            GRAM,
            ("250146", "99PMP", "Glycolysis Within Second Quarter of Intensity Range"),
        ),
        GlycolysisQ3 => Template::fixed(
            "Glycolysis Q3",
            "Glycolysis within third quarter of intensity range",
            GRAM,
            ("250147", "99PMP", "Glycolysis Within Third Quarter of Intensity Range"),
        ),
        GlycolysisQ4 => Template::fixed(
            "Glycolysis Q4",
            "Glycolysis within fourth quarter of intensity range",
            GRAM,
            ("250148", "99PMP", "Glycolysis Within Fourth Quarter of Intensity Range"),
        ),
        Q1Distribution => Template::fixed(
            "Q1 distribution",
            "Percent within first quarter of intensity range",
            PERCENT,
            ("250140", "99PMP", "Percent Within First Quarter of Intensity Range"),
        ),
        Q2Distribution => Template::fixed(
            "Q2 distribution",
            "Percent within second quarter of intensity range",
            PERCENT,
            ("250141", "99PMP", "Percent Within Second Quarter of Intensity Range"),
        ),
        Q3Distribution => Template::fixed(
            "Q3 distribution",
            "Percent within third quarter of intensity range",
            PERCENT,
            ("250142", "99PMP", "Percent Within Third Quarter of Intensity Range"),
        ),
        Q4Distribution => Template::fixed(
            "Q4 distribution",
            "Percent within fourth quarter of intensity range",
            PERCENT,
            ("250143", "99PMP", "Percent Within Fourth Quarter of Intensity Range"),
        ),
        Sam => Template::fixed(
            "SAM",
            "Standardized added metabolic activity",
            GRAM,
            ("126037", "DCM", "Standardized Added Metabolic Activity"),
        ),
        SamBackground => Template {
            name: "SAM background",
            description: "Standardized added metabolic activity background",
            units: None,
            quantity: Some((
                "126038",
                "DCM",
                "Standardized Added Metabolic Activity Background",
            )),
            derivation: None,
            method: None,
        },
        Peak => Template::derived(
            "Peak",
            "Peak value within ROI",
            ("126031", "DCM", "Peak Value Within ROI"),
        ),
    }
}

/// 获取统计量 `key` 的元信息. 与体素值同单位的统计量, 其单位和物理量取自 `image`.
///
/// `image` 未解析出单位时, 相应字段为 `None`; 该函数本身总是成功.
pub fn measurement_info(key: StatisticKey, image: &ImageUnits) -> MeasurementInfo {
    let t = template(key);
    let (units, units_code) = match t.units {
        Some((text, code)) => (Some(text.to_string()), Some(code.into())),
        None => (
            image.units().map(str::to_string),
            image.units_code().cloned(),
        ),
    };
    let quantity_code = match t.quantity {
        Some(code) => Some(code.into()),
        None => image.quantity().cloned(),
    };
    MeasurementInfo {
        name: t.name.to_string(),
        description: t.description.to_string(),
        units,
        quantity_code,
        units_code,
        derivation_code: t.derivation.map(CodedEntry::from),
        measurement_method_code: t.method.map(CodedEntry::from),
    }
}
