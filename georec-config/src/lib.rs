use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use georec_core::dialect::Dialect;
use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `GEOREC_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("GEOREC_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatKind {
    #[default]
    Zeiss,
    Csv,
}

/// 转换参数。命令行参数会覆盖这里的值。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub target_dialect: Dialect,
    pub output_format: OutputFormatKind,
    pub start_line_number: u32,
    pub coordinate_decimals: usize,
    pub angle_decimals: usize,
    pub eliminate_duplicates: bool,
    /// 重复点判定的三维距离阈值（米），严格小于才算重复。
    pub duplicate_threshold: f64,
    pub sort_output: bool,
    /// 存在无法解码的行时以失败退出。
    pub strict: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            target_dialect: Dialect::M5,
            output_format: OutputFormatKind::Zeiss,
            start_line_number: 1,
            coordinate_decimals: 3,
            angle_decimals: 4,
            eliminate_duplicates: false,
            duplicate_threshold: 0.03,
            sort_output: false,
            strict: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.conversion.target_dialect, Dialect::M5);
        assert_eq!(cfg.conversion.output_format, OutputFormatKind::Zeiss);
        assert_eq!(cfg.conversion.start_line_number, 1);
        assert_eq!(cfg.conversion.coordinate_decimals, 3);
        assert_eq!(cfg.conversion.angle_decimals, 4);
        assert!(!cfg.conversion.eliminate_duplicates);
        assert_eq!(cfg.conversion.duplicate_threshold, 0.03);
        assert!(!cfg.conversion.strict);
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [conversion]
            target_dialect = "rec500"
            output_format = "csv"
            start_line_number = 100
            eliminate_duplicates = true
            duplicate_threshold = 0.05
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.conversion.target_dialect, Dialect::Rec500);
        assert_eq!(cfg.conversion.output_format, OutputFormatKind::Csv);
        assert_eq!(cfg.conversion.start_line_number, 100);
        assert!(cfg.conversion.eliminate_duplicates);
        assert_eq!(cfg.conversion.duplicate_threshold, 0.05);
        assert_eq!(cfg.conversion.angle_decimals, 4);
        assert!(!cfg.conversion.sort_output);
    }

    #[test]
    fn partial_sections_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[conversion]\nsort_output = true").unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.conversion.sort_output);
        assert_eq!(cfg.conversion.target_dialect, Dialect::M5);
    }

    #[test]
    fn unknown_dialect_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[conversion]\ntarget_dialect = \"r9\"").unwrap();

        let err = AppConfig::from_file(file.path()).expect_err("r9 不是合法方言");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::from_file("/definitely/not/here.toml").expect_err("文件不存在");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
