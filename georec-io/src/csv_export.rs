use georec_core::record::PointRecord;
use georec_core::word::{OutputContext, WordIndex, WordIndexBlock};

use crate::IoError;

/// 将点记录展开为字段列表：点号、代码、东、北、高。缺失值以空占位保持列数。
pub fn point_record_blocks(record: &PointRecord, decimals: usize) -> Vec<WordIndexBlock> {
    let coordinate = |index: WordIndex, value: Option<f64>| match value {
        Some(value) => WordIndexBlock::numeric(index, format!("{value:.decimals$}"), value),
        None => WordIndexBlock::empty(index, 0),
    };
    vec![
        WordIndexBlock::text(WordIndex::POINT_NUMBER, record.number.clone()),
        WordIndexBlock::text(WordIndex::POINT_CODE, record.code.clone()),
        coordinate(WordIndex::TARGET_EASTING, record.easting),
        coordinate(WordIndex::TARGET_NORTHING, record.northing),
        coordinate(WordIndex::TARGET_ELEVATION, record.height),
    ]
}

/// 按 CSV 规则输出一行（必要时加引号），不含换行符。
pub fn csv_row(blocks: &[WordIndexBlock]) -> Result<String, IoError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(blocks.iter().map(|block| block.format(OutputContext::Csv)))?;
    let bytes = writer
        .into_inner()
        .map_err(|err| IoError::Csv(csv::Error::from(err.into_error())))?;
    let row = String::from_utf8_lossy(&bytes);
    Ok(row.trim_end_matches(['\r', '\n']).to_string())
}
