//! 多行点记录聚合。
//!
//! 测站行、目标行与坐标行往往是物理上分开的几行，它们共享同一个点号。
//! 聚合器按点号切分，把连续的行合并为一条 `PointRecord`。

use georec_core::record::{PointRecord, PointRecordBuilder, RecordField};
use georec_core::word::{WordGroup, WordIndex, WordIndexBlock};
use tracing::{debug, warn};

/// 单行的语义类别。测站标记优先：同时带有两类标记的行按测站行处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Station,
    Target,
    Plain,
}

pub fn classify_line(blocks: &[WordIndexBlock]) -> LineClass {
    if blocks.iter().any(|block| block.word_index.marks_station()) {
        LineClass::Station
    } else if blocks.iter().any(|block| block.word_index.marks_target()) {
        LineClass::Target
    } else {
        LineClass::Plain
    }
}

/// 输入中出现的未知字索引及其所在行号（从 1 开始）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownWordIndex {
    pub line_no: usize,
    pub index: WordIndex,
}

#[derive(Debug, Default)]
enum AggregatorState {
    #[default]
    Idle,
    Accumulating(PointRecordBuilder),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Aggregation {
    pub records: Vec<PointRecord>,
    pub unknown_word_indices: Vec<UnknownWordIndex>,
}

#[derive(Debug, Default)]
pub struct RecordAggregator {
    state: AggregatorState,
    output: Aggregation,
}

impl RecordAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已完成（已刷新）的记录数，不含正在累积的记录。
    pub fn completed(&self) -> usize {
        self.output.records.len()
    }

    pub fn push_line(&mut self, line_no: usize, blocks: &[WordIndexBlock]) {
        let number = blocks
            .iter()
            .find(|block| block.word_index == WordIndex::POINT_NUMBER)
            .map(|block| block.raw_value.trim().to_string());

        let mut builder = match (std::mem::take(&mut self.state), number) {
            (AggregatorState::Accumulating(current), Some(number))
                if current.number() != number =>
            {
                self.flush(current);
                PointRecordBuilder::new(number)
            }
            (AggregatorState::Accumulating(current), _) => current,
            (AggregatorState::Idle, number) => PointRecordBuilder::new(number.unwrap_or_default()),
        };
        self.apply_line(line_no, &mut builder, blocks);
        self.state = AggregatorState::Accumulating(builder);
    }

    pub fn finish(mut self) -> Aggregation {
        if let AggregatorState::Accumulating(builder) = std::mem::take(&mut self.state) {
            self.flush(builder);
        }
        self.output
    }

    fn apply_line(
        &mut self,
        line_no: usize,
        builder: &mut PointRecordBuilder,
        blocks: &[WordIndexBlock],
    ) {
        let class = classify_line(blocks);
        match class {
            LineClass::Station => builder.mark_station(),
            LineClass::Target => builder.mark_target(),
            LineClass::Plain => {}
        }

        for block in blocks {
            let index = block.word_index;
            match index.group() {
                WordGroup::Unknown => {
                    debug!(line_no, %index, "忽略未知字索引");
                    self.output
                        .unknown_word_indices
                        .push(UnknownWordIndex { line_no, index });
                }
                WordGroup::PointNumber => {}
                WordGroup::PointCode => builder.set_code(block.raw_value.as_str()),
                WordGroup::Code => {
                    if !builder.has_code() {
                        builder.set_code(block.raw_value.as_str());
                    }
                }
                WordGroup::TargetEasting | WordGroup::TargetNorthing | WordGroup::TargetElevation
                    if class == LineClass::Station =>
                {
                    debug!(line_no, %index, "测站行中的目标坐标被忽略");
                }
                group => {
                    let Some(field) = record_field(group) else {
                        continue;
                    };
                    match block.numeric_value {
                        Some(value) => builder.set(field, value),
                        None if block.is_empty() => {}
                        None => warn!(
                            line_no,
                            %index,
                            value = %block.raw_value,
                            "数值字段无法解析，已忽略"
                        ),
                    }
                }
            }
        }
    }

    fn flush(&mut self, builder: PointRecordBuilder) {
        let number = builder.number().to_string();
        match builder.finish() {
            Some(record) => {
                let missing = record.missing_fields();
                if !missing.is_empty() {
                    warn!(
                        number = %record.number,
                        kind = ?record.kind,
                        missing = ?missing,
                        "点记录缺少字段，按空白占位输出"
                    );
                }
                debug!(number = %record.number, kind = ?record.kind, "完成点记录");
                self.output.records.push(record);
            }
            None => debug!(%number, "空记录已丢弃"),
        }
    }
}

fn record_field(group: WordGroup) -> Option<RecordField> {
    let field = match group {
        WordGroup::TargetEasting | WordGroup::StationEasting => RecordField::Easting,
        WordGroup::TargetNorthing | WordGroup::StationNorthing => RecordField::Northing,
        WordGroup::TargetElevation | WordGroup::StationElevation => RecordField::Height,
        WordGroup::TargetHeight => RecordField::TargetHeight,
        WordGroup::InstrumentHeight => RecordField::InstrumentHeight,
        WordGroup::HorizontalAngle => RecordField::HorizontalAngle,
        WordGroup::VerticalAngle => RecordField::VerticalAngle,
        WordGroup::SlopeDistance => RecordField::SlopeDistance,
        _ => return None,
    };
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use georec_core::record::RecordKind;

    fn number(value: &str) -> WordIndexBlock {
        WordIndexBlock::text(WordIndex::POINT_NUMBER, value)
    }

    fn value(index: u8, value: f64) -> WordIndexBlock {
        WordIndexBlock::numeric(WordIndex::new(index), value.to_string(), value)
    }

    #[test]
    fn lines_sharing_a_number_form_one_record() {
        let mut aggregator = RecordAggregator::new();
        aggregator.push_line(1, &[number("ST1"), value(88, 1.55)]);
        aggregator.push_line(
            2,
            &[number("ST1"), value(84, 100.0), value(85, 200.0), value(86, 50.0)],
        );
        aggregator.push_line(3, &[number("P7"), value(81, 1.0), value(82, 2.0)]);
        assert_eq!(aggregator.completed(), 1);

        let output = aggregator.finish();
        assert_eq!(output.records.len(), 2);

        let station = &output.records[0];
        assert_eq!(station.kind, RecordKind::Station);
        assert_eq!(station.instrument_height, Some(1.55));
        assert_eq!(station.easting, Some(100.0));
        assert_eq!(station.height, Some(50.0));

        let point = &output.records[1];
        assert_eq!(point.number, "P7");
        assert_eq!(point.kind, RecordKind::Target);
        assert_eq!(point.height, None);
    }

    #[test]
    fn station_line_ignores_target_coordinates() {
        let mut aggregator = RecordAggregator::new();
        aggregator.push_line(
            1,
            &[number("ST1"), value(84, 10.0), value(81, 99.0), value(88, 1.5)],
        );
        let record = &aggregator.finish().records[0];
        assert!(record.is_station_line());
        assert_eq!(record.easting, Some(10.0));
    }

    #[test]
    fn target_with_measurement_is_target_record() {
        let mut aggregator = RecordAggregator::new();
        aggregator.push_line(
            1,
            &[
                number("2154H"),
                value(81, 1.0),
                value(82, 2.0),
                value(83, 3.0),
                value(87, 1.6),
            ],
        );
        let record = &aggregator.finish().records[0];
        assert!(record.is_target_line());
        assert_eq!(record.target_height, Some(1.6));
    }

    #[test]
    fn target_coordinates_without_measurement_are_still_a_target() {
        let mut aggregator = RecordAggregator::new();
        aggregator.push_line(
            1,
            &[number("300"), value(81, 110.0), value(82, 210.0), value(83, 51.0)],
        );
        aggregator.push_line(2, &[number("301"), value(21, 200.0), value(31, 12.0)]);
        let output = aggregator.finish();

        let target = &output.records[0];
        assert!(target.is_target_line());
        assert_eq!(target.height, Some(51.0));
        assert_eq!(target.target_height, None);
        assert_eq!(target.slope_distance, None);

        assert_eq!(output.records[1].kind, RecordKind::Coordinate);
    }

    #[test]
    fn point_code_takes_precedence_over_generic_code() {
        let mut aggregator = RecordAggregator::new();
        aggregator.push_line(
            1,
            &[
                number("5"),
                WordIndexBlock::text(WordIndex::CODE, "GEN"),
                WordIndexBlock::text(WordIndex::POINT_CODE, "FENCE"),
            ],
        );
        aggregator.push_line(2, &[number("5"), WordIndexBlock::text(WordIndex::CODE, "LATE")]);
        let record = &aggregator.finish().records[0];
        assert_eq!(record.code, "FENCE");
    }

    #[test]
    fn empty_records_are_not_flushed() {
        let mut aggregator = RecordAggregator::new();
        aggregator.push_line(1, &[number("1")]);
        aggregator.push_line(2, &[number("2"), value(81, 5.0), value(82, 6.0)]);
        aggregator.push_line(3, &[number("3"), WordIndexBlock::empty(WordIndex::POINT_CODE, 4)]);
        let output = aggregator.finish();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].number, "2");
    }

    #[test]
    fn unknown_indices_are_reported_not_fatal() {
        let mut aggregator = RecordAggregator::new();
        aggregator.push_line(
            4,
            &[
                number("9"),
                WordIndexBlock::text(WordIndex::new(51), "0000+000"),
                value(81, 1.0),
                value(82, 2.0),
            ],
        );
        let output = aggregator.finish();
        assert_eq!(output.records.len(), 1);
        assert_eq!(
            output.unknown_word_indices,
            vec![UnknownWordIndex {
                line_no: 4,
                index: WordIndex::new(51),
            }]
        );
    }

    #[test]
    fn classification_prefers_station_markers() {
        assert_eq!(
            classify_line(&[value(81, 1.0), value(88, 1.5)]),
            LineClass::Station
        );
        assert_eq!(classify_line(&[value(83, 1.0)]), LineClass::Target);
        assert_eq!(classify_line(&[number("1"), value(21, 1.0)]), LineClass::Plain);
    }
}
