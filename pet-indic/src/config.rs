//! JSON 配置.
//!
//! 引擎配置按 `显式路径 > $PET_INDIC_ENGINE_CONFIG > {配置目录}/pet-indic/engine.json`
//! 的顺序查找, 都不存在时使用默认值. 环境变量 `$PET_INDIC_ENGINE` 总是覆盖可执行文件路径.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::StatisticKey;

/// 指定引擎配置文件路径的环境变量.
pub const ENGINE_CONFIG_ENV: &str = "PET_INDIC_ENGINE_CONFIG";

/// 覆盖引擎可执行文件路径的环境变量.
pub const ENGINE_ENV: &str = "PET_INDIC_ENGINE";

/// 默认的引擎可执行文件名, 需位于 `PATH` 中.
pub const DEFAULT_EXECUTABLE: &str = "QuantitativeIndicesCLI";

/// 读取配置失败.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 无法读取配置文件.
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        /// 配置文件路径.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },

    /// 配置文件不是合法的 JSON, 或字段不匹配.
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        /// 配置文件路径.
        path: PathBuf,
        /// 底层错误.
        source: serde_json::Error,
    },
}

/// 从 `path` 读取 JSON 配置.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// 获取 `{用户配置目录}/pet-indic` 目录下给定继续项组成的全路径.
pub fn config_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::config_dir()?;
    ans.push("pet-indic");
    ans.extend(it);
    Some(ans)
}

/// 外部引擎的调用配置.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 引擎可执行文件路径.
    pub executable: PathBuf,
    /// 存放临时输入输出文件的目录. 为 `None` 时使用系统临时目录.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    /// 调用结束后保留临时文件, 便于排查引擎问题.
    pub keep_scratch: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            scratch_dir: None,
            keep_scratch: false,
        }
    }
}

impl EngineConfig {
    /// 按查找顺序读取引擎配置, 并应用环境变量覆盖.
    ///
    /// 显式给出的路径和环境变量指定的路径必须可读; 默认路径不存在时静默使用默认值.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve(
            explicit,
            std::env::var_os(ENGINE_CONFIG_ENV),
            std::env::var_os(ENGINE_ENV),
            config_dir_with(["engine.json"]),
        )
    }

    fn resolve(
        explicit: Option<&Path>,
        env_config: Option<OsString>,
        env_engine: Option<OsString>,
        default_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env_config.filter(|p| !p.is_empty()).map(PathBuf::from))
            .or_else(|| default_path.filter(|p| p.is_file()));
        let mut config: Self = match path {
            Some(path) => load_config(&path)?,
            None => Self::default(),
        };
        if let Some(exe) = env_engine.filter(|p| !p.is_empty()) {
            config.executable = PathBuf::from(exe);
        }
        Ok(config)
    }
}

fn default_keys() -> Vec<StatisticKey> {
    StatisticKey::DEFAULT.to_vec()
}

/// `qi-report` 工具的任务配置.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// PET 扫描 nii 文件.
    pub scan: PathBuf,
    /// 与扫描对齐的标签图 nii 文件.
    pub label: PathBuf,
    /// 体素值单位编码值, 如 `{SUVbw}g/ml`.
    #[serde(default)]
    pub units: Option<String>,
    /// 读入扫描后乘以的系数, 用于将原始活度换算为 SUV.
    #[serde(default)]
    pub scale: Option<f32>,
    /// 需要计算的统计量. 缺省时为默认统计量.
    #[serde(default = "default_keys")]
    pub keys: Vec<StatisticKey>,
    /// 需要统计的标签值. 缺省时统计标签图中出现的全部非零标签.
    #[serde(default)]
    pub label_values: Option<Vec<u8>>,
    /// 若给出, 将全部标签的结果以 CSV 格式写入该文件.
    #[serde(default)]
    pub csv: Option<PathBuf>,
    /// 引擎配置. 缺省时按 [`EngineConfig::locate`] 查找.
    #[serde(default)]
    pub engine: Option<EngineConfig>,
}
