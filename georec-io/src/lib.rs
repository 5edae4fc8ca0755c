pub mod csv_export;
pub mod gsi;
pub mod zeiss;

use std::fs;
use std::path::{Path, PathBuf};

use georec_core::word::WordIndexBlock;
use thiserror::Error;

use crate::gsi::GsiLine;
use crate::zeiss::ZeissRecord;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write csv row: {0}")]
    Csv(#[from] csv::Error),
}

/// 单行解码失败。错误只影响当前行，调用方决定跳过或上报。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("无法识别的记录方言：\"{line}\"")]
    UnrecognizedDialect { line: String },
    #[error("字段 {field} 需要读取到第 {position} 列，但行长度只有 {length}：\"{line}\"")]
    TruncatedLine {
        field: &'static str,
        position: usize,
        length: usize,
        line: String,
    },
    #[error("字段 {field} 的值 \"{value}\" 无法解析")]
    MalformedField { field: &'static str, value: String },
    #[error("字块 \"{token}\" 格式错误：{reason}")]
    MalformedBlock { token: String, reason: &'static str },
}

/// 任一输入格式解码后的行。
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    Zeiss(ZeissRecord),
    Gsi(GsiLine),
}

impl DecodedLine {
    /// 归一化为字索引块序列，供聚合器消费。
    pub fn into_blocks(self) -> Vec<WordIndexBlock> {
        match self {
            DecodedLine::Zeiss(record) => record.to_blocks(),
            DecodedLine::Gsi(line) => line.blocks,
        }
    }
}

/// 自动识别行格式：形如 GSI 字块的行按 GSI 解码，其余交给 Zeiss 方言识别。
pub fn decode_any(line: &str) -> Result<DecodedLine, DecodeError> {
    if gsi::looks_like_gsi(line.trim_start()) {
        gsi::decode_line(line).map(DecodedLine::Gsi)
    } else {
        zeiss::decode_line(line).map(DecodedLine::Zeiss)
    }
}

pub trait LineLoader {
    fn load_lines(&self, path: &Path) -> Result<Vec<String>, IoError>;
}

pub trait LineSaver {
    fn save_lines(&self, lines: &[String], path: &Path) -> Result<(), IoError>;
}

/// 纯文本文件读写。非 UTF-8 字节按替换字符读入，行尾统一为 `\n`。
pub struct TextFileFacade;

impl TextFileFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextFileFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl LineLoader for TextFileFacade {
    fn load_lines(&self, path: &Path) -> Result<Vec<String>, IoError> {
        let data = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(String::from_utf8_lossy(&data)
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect())
    }
}

impl LineSaver for TextFileFacade {
    fn save_lines(&self, lines: &[String], path: &Path) -> Result<(), IoError> {
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(path, content).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}
