//! 结果表格: 文本展示, 以及多标签结果的 CSV 导出.

use std::io::{self, Write};

use itertools::Itertools;

use crate::consts::UNITS_PLACEHOLDER;
use crate::engine::EngineResponse;
use crate::stats::{measurement_info, units_for_index, ImageUnits, StatisticKey, StatisticsResult};

/// 文本展示时, 名称列的最小宽度. 短于该宽度的名称后补一个制表符.
const NAME_COLUMN: usize = 14;

/// 结果表格的一行.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// 统计量名称.
    pub index: String,
    /// 数值文字.
    pub value: String,
    /// 单位文字, 未知时为 `-`.
    pub units: String,
}

/// 结果表格.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsTable {
    rows: Vec<ResultRow>,
}

impl ResultsTable {
    /// 由引擎原始输出构建表格, 按输出组顺序, 跳过占位值.
    ///
    /// 名称为去掉 `_s` 后缀的引擎参数名, 单位由 [`units_for_index`] 推导.
    pub fn from_response(response: &EngineResponse, image_units: &str) -> Self {
        let rows = response
            .slots()
            .filter(|slot| !slot.is_placeholder())
            .map(|slot| {
                let index = slot.key().engine_name().to_string();
                ResultRow {
                    units: units_for_index(image_units, &index),
                    value: slot.value().trim().to_string(),
                    index,
                }
            })
            .collect();
        Self { rows }
    }

    /// 由统计结果构建表格, 名称和单位取自统计量元信息.
    pub fn from_statistics(result: &StatisticsResult, image_units: &ImageUnits) -> Self {
        let rows = result
            .iter()
            .map(|(key, value)| {
                let info = measurement_info(key, image_units);
                ResultRow {
                    index: info.name,
                    value: value.to_string(),
                    units: info.units.unwrap_or_else(|| UNITS_PLACEHOLDER.to_string()),
                }
            })
            .collect();
        Self { rows }
    }

    /// 全部行.
    #[inline]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// 行数.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否没有任何结果?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按 `名称:\t数值` 逐行输出, 名称中的下划线替换为空格.
    pub fn to_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                let mut name = format!("{}:\t", row.index.replace('_', " "));
                if name.chars().count() < NAME_COLUMN {
                    name.push('\t');
                }
                format!("{name}{}\n", row.value)
            })
            .collect()
    }

    /// 解析 [`ResultsTable::to_text`] 的输出, 得到 `(名称, 数值)` 对.
    ///
    /// 不含 `:` 的行被忽略.
    pub fn parse_text(text: &str) -> Vec<(String, String)> {
        text.lines()
            .filter_map(|line| line.rsplit_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect()
    }
}

/// 将多个标签值的统计结果以 CSV 格式写入 `writer`.
///
/// 表头为 `Label_Value,` 加上各统计量的引擎参数名, 每行以逗号结尾.
/// 某标签缺少的统计量留空.
pub fn write_label_csv<W: Write>(
    mut writer: W,
    keys: &[StatisticKey],
    results: &[(u8, StatisticsResult)],
) -> io::Result<()> {
    let keys: Vec<_> = keys.iter().copied().sorted().dedup().collect();
    write!(writer, "Label_Value,")?;
    for key in &keys {
        write!(writer, "{},", key.engine_name())?;
    }
    writeln!(writer)?;
    for (label, result) in results {
        write!(writer, "{label},")?;
        for key in &keys {
            match result.get(*key) {
                Some(v) => write!(writer, "{v},")?,
                None => write!(writer, ",")?,
            }
        }
        writeln!(writer)?;
    }
    writer.flush()
}
