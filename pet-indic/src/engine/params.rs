//! 引擎输出组, 以及返回参数文件的解析.
//!
//! 返回参数文件每行一项, 形如 `Mean_s = 3.67861`. 未开启的统计量写为 `--`.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use log::warn;

use crate::consts::engine::{OUTPUT_SUFFIX, PLACEHOLDER, SOFTWARE_VERSION};
use crate::stats::StatisticKey;

/// 引擎输出组中各结果项的顺序. 该顺序由引擎决定, 与统计量的规范顺序不同.
pub const OUTPUT_GROUP: [StatisticKey; 22] = {
    use StatisticKey::*;
    [
        Mean,
        Std,
        Rms,
        Max,
        Min,
        Volume,
        FirstQuartile,
        Median,
        ThirdQuartile,
        UpperAdjacent,
        Tlg,
        GlycolysisQ1,
        GlycolysisQ2,
        GlycolysisQ3,
        GlycolysisQ4,
        Q1Distribution,
        Q2Distribution,
        Q3Distribution,
        Q4Distribution,
        Sam,
        SamBackground,
        Peak,
    ]
};

/// 统计量在输出组中的位置. `OUTPUT_GROUP` 覆盖了全部统计量.
#[inline]
fn slot_index(key: StatisticKey) -> usize {
    OUTPUT_GROUP
        .iter()
        .position(|k| *k == key)
        .unwrap_or_default()
}

/// 去掉输出项名的 `_s` 后缀 (若有).
#[inline]
fn strip_suffix(name: &str) -> &str {
    name.strip_suffix(OUTPUT_SUFFIX).unwrap_or(name)
}

/// 输出组中的一项.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSlot {
    key: StatisticKey,
    value: String,
}

impl OutputSlot {
    /// 对应的统计量.
    #[inline]
    pub fn key(&self) -> StatisticKey {
        self.key
    }

    /// 输出项名, 即引擎参数名加 `_s` 后缀.
    pub fn name(&self) -> String {
        format!("{}{OUTPUT_SUFFIX}", self.key.engine_name())
    }

    /// 原始字符串值.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// 是否为 "未计算" 占位值?
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.value.trim() == PLACEHOLDER
    }
}

/// 一次引擎调用的输出.
///
/// 固定包含 [`OUTPUT_GROUP`] 中的 22 项, 初始值均为占位值. 引擎额外输出的
/// 未知项单独保存, 不参与统计量映射.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResponse {
    slots: Vec<OutputSlot>,
    software_version: Option<String>,
    extras: Vec<(String, String)>,
}

impl Default for EngineResponse {
    fn default() -> Self {
        Self {
            slots: OUTPUT_GROUP
                .iter()
                .map(|key| OutputSlot {
                    key: *key,
                    value: PLACEHOLDER.to_string(),
                })
                .collect(),
            software_version: None,
            extras: Vec::new(),
        }
    }
}

impl EngineResponse {
    /// 全部为占位值的输出.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入输出项. `name` 可以带或不带 `_s` 后缀.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = name.trim();
        let value = value.into();
        if name == SOFTWARE_VERSION {
            self.software_version = Some(value);
            return;
        }
        match StatisticKey::from_engine_name(strip_suffix(name)) {
            Some(key) => self.slot_mut(key).value = value,
            None => match self.extras.iter_mut().find(|(n, _)| n == name) {
                Some((_, old)) => *old = value,
                None => self.extras.push((name.to_string(), value)),
            },
        }
    }

    /// 以数值写入统计量 `key` 的输出项.
    pub fn set_value(&mut self, key: StatisticKey, value: f64) {
        self.slot_mut(key).value = value.to_string();
    }

    fn slot_mut(&mut self, key: StatisticKey) -> &mut OutputSlot {
        &mut self.slots[slot_index(key)]
    }

    /// 统计量 `key` 的输出项.
    pub fn slot(&self, key: StatisticKey) -> &OutputSlot {
        &self.slots[slot_index(key)]
    }

    /// 按输出组顺序迭代全部输出项.
    pub fn slots(&self) -> impl ExactSizeIterator<Item = &OutputSlot> {
        self.slots.iter()
    }

    /// 引擎报告的软件版本.
    #[inline]
    pub fn software_version(&self) -> Option<&str> {
        self.software_version.as_deref()
    }

    /// 设置软件版本.
    pub fn set_software_version(&mut self, version: impl Into<String>) {
        self.software_version = Some(version.into());
    }

    /// 输出组之外的未知输出项.
    pub fn extras(&self) -> &[(String, String)] {
        &self.extras
    }

    /// 收集全部非占位输出项的数值, 以去掉 `_s` 后缀的名称为键.
    ///
    /// 无法解析为数字的值会被丢弃并输出警告. 未知输出项也会出现在结果中,
    /// 由调用者决定是否忽略.
    pub fn raw_values(&self) -> BTreeMap<String, f64> {
        let known = self.slots.iter().map(|s| (s.name(), s.value.as_str()));
        let extras = self.extras.iter().map(|(n, v)| (n.clone(), v.as_str()));
        known
            .chain(extras)
            .filter(|(_, v)| v.trim() != PLACEHOLDER)
            .filter_map(|(name, v)| match v.trim().parse::<f64>() {
                Ok(x) => Some((strip_suffix(&name).to_string(), x)),
                Err(_) => {
                    warn!("engine output `{name}` is not a number: `{v}`");
                    None
                }
            })
            .collect()
    }
}

impl Display for EngineResponse {
    /// 按返回参数文件格式输出: 先输出软件版本 (若有), 然后是输出组和未知项.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(v) = &self.software_version {
            writeln!(f, "{SOFTWARE_VERSION} = {v}")?;
        }
        for slot in &self.slots {
            writeln!(f, "{} = {}", slot.name(), slot.value)?;
        }
        for (name, value) in &self.extras {
            writeln!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}

/// 解析引擎写出的返回参数文件内容.
///
/// 空行和不含 `=` 的行被忽略. 同名项以最后一次出现为准.
pub fn parse_return_parameters(text: &str) -> EngineResponse {
    let mut response = EngineResponse::new();
    text.lines()
        .filter_map(|line| line.split_once('='))
        .for_each(|(name, value)| response.set(name, value.trim()));
    response
}
