//! 统计量标识, 及其与外部计算引擎参数名之间的对应关系.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 统计量的大类. 同一类统计量共用相同的单位推导规则.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// 与体素值同单位的强度统计量.
    Intensity,
    /// 体积, 以毫升为单位.
    Volume,
    /// 糖酵解类统计量, 即强度与体积之积.
    Glycolysis,
    /// 百分比类统计量.
    Distribution,
}

/// 为统计量生成枚举定义, 以及字符串标识和引擎参数名两张对应表.
///
/// 变体的声明顺序即规范顺序, 也是 `Ord` 的顺序.
macro_rules! statistic_keys {
    ($($variant: ident => $key: literal, $engine: literal, $category: ident;)+) => {
        /// 可计算的统计量. 字符串标识见 [`StatisticKey::as_str`].
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum StatisticKey {
            $(
                #[allow(missing_docs)]
                #[serde(rename = $key)]
                $variant,
            )+
        }

        impl StatisticKey {
            /// 按规范顺序排列的全部统计量.
            pub const ALL: &'static [StatisticKey] = &[$(StatisticKey::$variant),+];

            /// 统计量的字符串标识.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(StatisticKey::$variant => $key,)+
                }
            }

            /// 外部计算引擎中, 开启该统计量的参数名. 输出项名为该名称加 `_s` 后缀.
            pub const fn engine_name(self) -> &'static str {
                match self {
                    $(StatisticKey::$variant => $engine,)+
                }
            }

            /// 由引擎参数名 (不含 `_s` 后缀) 反查统计量. 未知名称返回 `None`.
            pub fn from_engine_name(name: &str) -> Option<StatisticKey> {
                match name {
                    $($engine => Some(StatisticKey::$variant),)+
                    _ => None,
                }
            }

            /// 统计量所属的大类.
            pub const fn category(self) -> Category {
                match self {
                    $(StatisticKey::$variant => Category::$category,)+
                }
            }

            fn from_key_str(s: &str) -> Option<StatisticKey> {
                match s {
                    $($key => Some(StatisticKey::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

statistic_keys! {
    Mean => "mean", "Mean", Intensity;
    Std => "std", "Std_Deviation", Intensity;
    Min => "min", "Min", Intensity;
    Max => "max", "Max", Intensity;
    Rms => "rms", "RMS", Intensity;
    Volume => "volume", "Volume", Volume;
    FirstQuartile => "1st_quartile", "First_Quartile", Intensity;
    Median => "median", "Median", Intensity;
    ThirdQuartile => "3rd_quartile", "Third_Quartile", Intensity;
    UpperAdjacent => "upper_adjacent", "Upper_Adjacent", Distribution;
    Tlg => "TLG", "TLG", Glycolysis;
    GlycolysisQ1 => "glycosis_Q1", "Glycolysis_Q1", Glycolysis;
    GlycolysisQ2 => "glycosis_Q2", "Glycolysis_Q2", Glycolysis;
    GlycolysisQ3 => "glycosis_Q3", "Glycolysis_Q3", Glycolysis;
    GlycolysisQ4 => "glycosis_Q4", "Glycolysis_Q4", Glycolysis;
    Q1Distribution => "Q1_distribution", "Q1_Distribution", Distribution;
    Q2Distribution => "Q2_distribution", "Q2_Distribution", Distribution;
    Q3Distribution => "Q3_distribution", "Q3_Distribution", Distribution;
    Q4Distribution => "Q4_distribution", "Q4_Distribution", Distribution;
    Sam => "SAM", "SAM", Glycolysis;
    SamBackground => "SAM_BG", "SAM_Background", Intensity;
    Peak => "peak", "Peak", Intensity;
}

impl StatisticKey {
    /// 默认开启的统计量.
    pub const DEFAULT: &'static [StatisticKey] = &[
        StatisticKey::Mean,
        StatisticKey::Volume,
        StatisticKey::Tlg,
        StatisticKey::Peak,
    ];
}

impl Display for StatisticKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 解析统计量标识失败.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseKeyError {
    /// 空字符串.
    Empty,

    /// 未知的统计量标识.
    Unknown(String),
}

impl Display for ParseKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseKeyError::Empty => f.write_str("empty statistic key"),
            ParseKeyError::Unknown(s) => write!(f, "unknown statistic key `{s}`"),
        }
    }
}

impl std::error::Error for ParseKeyError {}

impl FromStr for StatisticKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseKeyError::Empty);
        }
        StatisticKey::from_key_str(s).ok_or_else(|| ParseKeyError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, ParseKeyError, StatisticKey};
    use std::collections::HashSet;

    #[test]
    fn test_tables_are_bijective() {
        assert_eq!(StatisticKey::ALL.len(), 22);
        for key in StatisticKey::ALL {
            assert_eq!(StatisticKey::from_engine_name(key.engine_name()), Some(*key));
            assert_eq!(key.as_str().parse::<StatisticKey>(), Ok(*key));
        }
        let engines: HashSet<_> = StatisticKey::ALL.iter().map(|k| k.engine_name()).collect();
        assert_eq!(engines.len(), 22);
    }

    #[test]
    fn test_canonical_order() {
        assert!(StatisticKey::ALL.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(StatisticKey::ALL[0], StatisticKey::Mean);
        assert_eq!(StatisticKey::ALL[21], StatisticKey::Peak);
    }

    #[test]
    fn test_engine_names() {
        assert_eq!(StatisticKey::Std.engine_name(), "Std_Deviation");
        assert_eq!(StatisticKey::GlycolysisQ3.engine_name(), "Glycolysis_Q3");
        assert_eq!(StatisticKey::SamBackground.engine_name(), "SAM_Background");
        assert_eq!(StatisticKey::from_engine_name("Std_Deviation_s"), None);
        assert_eq!(StatisticKey::from_engine_name("Variance"), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("glycosis_Q2".parse::<StatisticKey>(), Ok(StatisticKey::GlycolysisQ2));
        assert_eq!(" peak ".parse::<StatisticKey>(), Ok(StatisticKey::Peak));
        assert_eq!("".parse::<StatisticKey>(), Err(ParseKeyError::Empty));
        assert_eq!(
            "glycolysis_Q2".parse::<StatisticKey>(),
            Err(ParseKeyError::Unknown("glycolysis_Q2".into()))
        );
        assert_eq!(StatisticKey::SamBackground.to_string(), "SAM_BG");
    }

    #[test]
    fn test_category() {
        assert_eq!(StatisticKey::Volume.category(), Category::Volume);
        assert_eq!(StatisticKey::Sam.category(), Category::Glycolysis);
        assert_eq!(StatisticKey::SamBackground.category(), Category::Intensity);
        assert_eq!(StatisticKey::Q4Distribution.category(), Category::Distribution);
        assert_eq!(StatisticKey::UpperAdjacent.category(), Category::Distribution);
    }

    #[test]
    fn test_serde_uses_key_strings() {
        let json = serde_json::to_string(&[StatisticKey::FirstQuartile, StatisticKey::Tlg]).unwrap();
        assert_eq!(json, r#"["1st_quartile","TLG"]"#);
        let keys: Vec<StatisticKey> = serde_json::from_str(r#"["SAM_BG","mean"]"#).unwrap();
        assert_eq!(keys, vec![StatisticKey::SamBackground, StatisticKey::Mean]);
    }
}
