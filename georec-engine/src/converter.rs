use georec_core::dialect::Dialect;
use georec_core::record::PointRecord;
use georec_io::csv_export::{csv_row, point_record_blocks};
use georec_io::{DecodeError, decode_any};
use tracing::{info, warn};

use crate::aggregator::{Aggregation, RecordAggregator, UnknownWordIndex};
use crate::dedup::{DEFAULT_THRESHOLD, eliminate_duplicates, sort_result};
use crate::emitter::{LineCounter, NumberFormat, ZeissEmitter};
use crate::errors::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Zeiss(Dialect),
    Csv,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    pub output: OutputFormat,
    pub start_line_number: u32,
    pub number_format: NumberFormat,
    pub eliminate_duplicates: bool,
    pub duplicate_threshold: f64,
    pub sort_output: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            output: OutputFormat::Zeiss(Dialect::M5),
            start_line_number: 1,
            number_format: NumberFormat::default(),
            eliminate_duplicates: false,
            duplicate_threshold: DEFAULT_THRESHOLD,
            sort_output: false,
        }
    }
}

/// 无法解码而被跳过的输入行。
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub line_no: usize,
    pub content: String,
    pub error: DecodeError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    pub output: Vec<String>,
    pub records: Vec<PointRecord>,
    pub skipped: Vec<SkippedLine>,
    pub unknown_word_indices: Vec<UnknownWordIndex>,
    pub lines_read: usize,
}

impl ConversionReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// 严格模式：存在被跳过的行时返回错误。
    pub fn ensure_clean(&self) -> Result<(), EngineError> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(EngineError::SkippedLines {
                count: self.skipped.len(),
            })
        }
    }
}

/// 完整转换流程：解码 → 聚合 → 去重 → 输出 → 排序。单行错误不会中断整个批次。
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConversionOptions,
}

impl Converter {
    pub fn new(options: ConversionOptions) -> Self {
        Self { options }
    }

    pub fn convert<S: AsRef<str>>(&self, lines: &[S]) -> Result<ConversionReport, EngineError> {
        let mut aggregator = RecordAggregator::new();
        let mut skipped = Vec::new();

        for (offset, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            let line_no = offset + 1;
            match decode_any(line) {
                Ok(decoded) => aggregator.push_line(line_no, &decoded.into_blocks()),
                Err(error) => {
                    warn!(line_no, error = %error, "跳过无法解码的行");
                    skipped.push(SkippedLine {
                        line_no,
                        content: line.to_string(),
                        error,
                    });
                }
            }
        }

        let Aggregation {
            records,
            unknown_word_indices,
        } = aggregator.finish();

        let records = if self.options.eliminate_duplicates {
            let before = records.len();
            let kept = eliminate_duplicates(records, self.options.duplicate_threshold);
            info!(
                removed = before - kept.len(),
                threshold = self.options.duplicate_threshold,
                "已剔除重复点"
            );
            kept
        } else {
            records
        };

        let mut output = self.render(&records)?;
        if self.options.sort_output {
            output = sort_result(output);
        }

        info!(
            lines_read = lines.len(),
            records = records.len(),
            output = output.len(),
            skipped = skipped.len(),
            unknown = unknown_word_indices.len(),
            "转换完成"
        );
        Ok(ConversionReport {
            output,
            records,
            skipped,
            unknown_word_indices,
            lines_read: lines.len(),
        })
    }

    fn render(&self, records: &[PointRecord]) -> Result<Vec<String>, EngineError> {
        match self.options.output {
            OutputFormat::Zeiss(dialect) => {
                let mut emitter = ZeissEmitter::new(
                    dialect,
                    self.options.number_format,
                    LineCounter::new(self.options.start_line_number),
                );
                Ok(emitter.emit_all(records))
            }
            OutputFormat::Csv => {
                let decimals = self.options.number_format.coordinate_decimals;
                records
                    .iter()
                    .map(|record| csv_row(&point_record_blocks(record, decimals)))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(EngineError::from)
            }
        }
    }
}
