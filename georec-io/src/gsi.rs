//! GSI 字索引记录（GSI8 / GSI16）解码。
//!
//! 每个字块形如 `WWIIIIS<value>`：两位字索引、四位附加信息、符号位、数值，
//! 字块之间以空格分隔。GSI16 行以 `*` 开头。

use georec_core::word::{WordIndex, WordIndexBlock};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GsiFormat {
    Gsi8,
    Gsi16,
}

/// 一条解码后的 GSI 行，字块保持输入顺序。
#[derive(Debug, Clone, PartialEq)]
pub struct GsiLine {
    pub format: GsiFormat,
    pub blocks: Vec<WordIndexBlock>,
}

impl GsiLine {
    pub fn block(&self, index: WordIndex) -> Option<&WordIndexBlock> {
        self.blocks.iter().find(|block| block.word_index == index)
    }

    pub fn unknown_indices(&self) -> impl Iterator<Item = WordIndex> + '_ {
        self.blocks
            .iter()
            .map(|block| block.word_index)
            .filter(|index| !index.is_known())
    }
}

const MIN_TOKEN_LEN: usize = 8;
const UNIT_POSITION: usize = 5;
const SIGN_POSITION: usize = 6;

/// 判断行首字块是否符合 GSI 形状（两位数字索引，第 7 位为符号）。
pub fn looks_like_gsi(line: &str) -> bool {
    let line = line.strip_prefix('*').unwrap_or(line);
    let Some(token) = line.split_whitespace().next() else {
        return false;
    };
    let bytes = token.as_bytes();
    bytes.len() >= MIN_TOKEN_LEN
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && matches!(bytes[SIGN_POSITION], b'+' | b'-')
}

pub fn decode_line(line: &str) -> Result<GsiLine, DecodeError> {
    let trimmed = line.trim();
    let (format, body) = match trimmed.strip_prefix('*') {
        Some(rest) => (GsiFormat::Gsi16, rest),
        None => (GsiFormat::Gsi8, trimmed),
    };

    let blocks = body
        .split_whitespace()
        .map(decode_token)
        .collect::<Result<Vec<_>, _>>()?;
    if blocks.is_empty() {
        return Err(DecodeError::MalformedBlock {
            token: trimmed.to_string(),
            reason: "行内没有字块",
        });
    }
    Ok(GsiLine { format, blocks })
}

fn decode_token(token: &str) -> Result<WordIndexBlock, DecodeError> {
    let bytes = token.as_bytes();
    if bytes.len() < MIN_TOKEN_LEN || !bytes[..=SIGN_POSITION].is_ascii() {
        return Err(DecodeError::MalformedBlock {
            token: token.to_string(),
            reason: "长度不足或头部含非 ASCII 字符",
        });
    }
    if !bytes[0].is_ascii_digit() || !bytes[1].is_ascii_digit() {
        return Err(DecodeError::MalformedBlock {
            token: token.to_string(),
            reason: "字索引不是两位数字",
        });
    }
    let index = WordIndex::new((bytes[0] - b'0') * 10 + (bytes[1] - b'0'));
    let negative = match bytes[SIGN_POSITION] {
        b'+' => false,
        b'-' => true,
        _ => {
            return Err(DecodeError::MalformedBlock {
                token: token.to_string(),
                reason: "符号位必须为 + 或 -",
            });
        }
    };
    let value = token[SIGN_POSITION + 1..].trim();

    if !index.is_known() {
        warn!(%index, token, "未知字索引，按原样保留");
        return Ok(WordIndexBlock::text(index, value));
    }
    if !index.is_numeric() {
        return Ok(WordIndexBlock::text(index, strip_leading_zeros(value)));
    }

    let raw = if value.bytes().all(|b| b.is_ascii_digit()) {
        scaled_text(value, negative, decimals_for(bytes[UNIT_POSITION], index))
    } else if negative {
        format!("-{value}")
    } else {
        value.to_string()
    };
    let numeric = raw.parse::<f64>().map_err(|_| DecodeError::MalformedField {
        field: "gsi_value",
        value: token.to_string(),
    })?;
    Ok(WordIndexBlock::numeric(index, raw, numeric))
}

/// 单位位决定小数位数：0/1 毫米（英尺千分位），2/3/4 角度 5 位，
/// 5/6/7 为 4 位，8 为 1/100 毫米。
fn decimals_for(unit: u8, index: WordIndex) -> usize {
    match unit {
        b'0' | b'1' => 3,
        b'2' | b'3' | b'4' | b'8' => 5,
        b'5' | b'6' | b'7' => 4,
        _ if index.is_angle() => 5,
        _ => 3,
    }
}

fn scaled_text(digits: &str, negative: bool, decimals: usize) -> String {
    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (integer, fraction) = padded.split_at(padded.len() - decimals);
    let integer = strip_leading_zeros(integer);
    let is_zero = padded.bytes().all(|b| b == b'0');
    let sign = if negative && !is_zero { "-" } else { "" };
    if decimals == 0 {
        format!("{sign}{integer}")
    } else {
        format!("{sign}{integer}.{fraction}")
    }
}

fn strip_leading_zeros(value: &str) -> String {
    let stripped = value.trim_start_matches('0');
    if stripped.is_empty() && !value.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}
