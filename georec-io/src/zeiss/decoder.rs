use georec_core::dialect::{BLOCK_LABELS, Field};

use super::{WordBlock, ZeissRecord, detect_dialect};
use crate::DecodeError;

/// 解码一条 Zeiss REC 行。
///
/// 第 2、3 字块按行长度条件出现；行在必需字段结束前截断视为错误，
/// 不会静默截取。
pub fn decode_line(line: &str) -> Result<ZeissRecord, DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let dialect = detect_dialect(line).ok_or_else(|| DecodeError::UnrecognizedDialect {
        line: line.to_string(),
    })?;
    let template = dialect.template();

    let line_number = match template.line_number {
        Some(field) => {
            let raw = slice(line, field, "line_number")?;
            let parsed = raw.parse::<u32>().map_err(|_| DecodeError::MalformedField {
                field: "line_number",
                value: raw.clone(),
            })?;
            Some(parsed)
        }
        None => None,
    };
    let point_identification = slice(line, template.identification, "identification")?;
    let point_number = slice(line, template.name, "name")?;

    let mut blocks: [WordBlock; 3] = Default::default();
    for (index, layout) in template.blocks.iter().enumerate() {
        if !template.block_present(index, line.len()) {
            continue;
        }
        let (type_label, value_label, unit_label) = BLOCK_LABELS[index];
        blocks[index] = WordBlock {
            type_mark: slice(line, layout.type_mark, type_label)?,
            value: slice(line, layout.value, value_label)?,
            unit: match layout.unit {
                Some(unit) => slice(line, unit, unit_label)?,
                None => String::new(),
            },
        };
    }

    let error = match template.error_start {
        Some(start) if line.len() > start => line
            .get(start..)
            .map(clean)
            .ok_or_else(|| DecodeError::MalformedField {
                field: "error",
                value: line.to_string(),
            })?,
        _ => String::new(),
    };

    Ok(ZeissRecord {
        dialect,
        line_number,
        point_identification,
        point_number,
        blocks,
        error,
    })
}

fn slice(line: &str, field: Field, label: &'static str) -> Result<String, DecodeError> {
    if line.len() < field.end {
        return Err(DecodeError::TruncatedLine {
            field: label,
            position: field.end,
            length: line.len(),
            line: line.to_string(),
        });
    }
    line.get(field.start..field.end)
        .map(clean)
        .ok_or_else(|| DecodeError::MalformedField {
            field: label,
            value: line.to_string(),
        })
}

/// 去掉填充空格与分隔符。
fn clean(raw: &str) -> String {
    raw.trim_matches(|c: char| c == '|' || c.is_whitespace())
        .to_string()
}
