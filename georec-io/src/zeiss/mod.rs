//! Zeiss REC 定列宽记录：方言识别、解码、编码。
//!
//! 解码器与编码器都只读取 [`georec_core::dialect::DialectTemplate`]，
//! 列位置不在任何调用点重复推导。

mod decoder;
mod encoder;

pub use decoder::decode_line;
pub use encoder::{HeightKind, Measurement, PointFields, ZeissEncoder};

use georec_core::dialect::Dialect;
use georec_core::word::{WordIndex, WordIndexBlock};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const TYPE_EASTING: &str = "Y";
pub const TYPE_NORTHING: &str = "X";
pub const TYPE_HEIGHT: &str = "Z";
pub const TYPE_INSTRUMENT_HEIGHT: &str = "ih";
pub const TYPE_TARGET_HEIGHT: &str = "th";
pub const TYPE_HORIZONTAL_ANGLE: &str = "Hz";
pub const TYPE_VERTICAL_ANGLE: &str = "V1";
pub const TYPE_SLOPE_DISTANCE: &str = "D";

pub const UNIT_METRE: &str = "m";
pub const UNIT_GON: &str = "gon";

/// 一行中的一个字块（类型、数值、单位），缺省为空串。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBlock {
    pub type_mark: String,
    pub value: String,
    pub unit: String,
}

impl WordBlock {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.type_mark.is_empty() && self.value.is_empty() && self.unit.is_empty()
    }
}

/// 一条解码后的 Zeiss REC 行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeissRecord {
    pub dialect: Dialect,
    pub line_number: Option<u32>,
    pub point_identification: String,
    pub point_number: String,
    pub blocks: [WordBlock; 3],
    #[serde(default)]
    pub error: String,
}

impl ZeissRecord {
    /// 转换为字索引块：点号 → 11，点标识 → 71，字块按类型标记映射。
    pub fn to_blocks(&self) -> Vec<WordIndexBlock> {
        let mut blocks = Vec::with_capacity(5);
        if !self.point_number.is_empty() {
            blocks.push(WordIndexBlock::text(
                WordIndex::POINT_NUMBER,
                self.point_number.clone(),
            ));
        }
        if !self.point_identification.is_empty() {
            blocks.push(WordIndexBlock::text(
                WordIndex::POINT_CODE,
                self.point_identification.clone(),
            ));
        }
        for block in self.blocks.iter().filter(|block| !block.value.is_empty()) {
            let Some(index) = word_index_for(&block.type_mark) else {
                warn!(
                    dialect = %self.dialect,
                    type_mark = %block.type_mark,
                    point = %self.point_number,
                    "未知的字块类型标记，已忽略"
                );
                continue;
            };
            let converted = match block.value.parse::<f64>() {
                Ok(value) => WordIndexBlock::numeric(index, block.value.clone(), value),
                Err(_) => WordIndexBlock::text(index, block.value.clone()),
            };
            blocks.push(converted);
        }
        blocks
    }
}

fn word_index_for(type_mark: &str) -> Option<WordIndex> {
    let index = match type_mark {
        TYPE_EASTING => WordIndex::TARGET_EASTING,
        TYPE_NORTHING => WordIndex::TARGET_NORTHING,
        TYPE_HEIGHT => WordIndex::TARGET_ELEVATION,
        TYPE_INSTRUMENT_HEIGHT => WordIndex::INSTRUMENT_HEIGHT,
        TYPE_TARGET_HEIGHT => WordIndex::TARGET_HEIGHT,
        TYPE_HORIZONTAL_ANGLE => WordIndex::HORIZONTAL_ANGLE,
        TYPE_VERTICAL_ANGLE => WordIndex::VERTICAL_ANGLE,
        TYPE_SLOPE_DISTANCE => WordIndex::SLOPE_DISTANCE,
        _ => return None,
    };
    Some(index)
}

/// 按行首识别方言；REC500 行以三个空格开头且其后有非空内容。
pub fn detect_dialect(line: &str) -> Option<Dialect> {
    if line.starts_with("For R4") || line.starts_with("For_R4") {
        Some(Dialect::R4)
    } else if line.starts_with("For R5") {
        Some(Dialect::R5)
    } else if line.starts_with("For M5") {
        Some(Dialect::M5)
    } else {
        match line.strip_prefix("   ") {
            Some(rest) if !rest.trim().is_empty() => Some(Dialect::Rec500),
            _ => None,
        }
    }
}
