use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use georec_core::dialect::Dialect;
use georec_io::zeiss::{WordBlock, ZeissRecord, decode_line};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GoldenFile {
    records: Vec<GoldenRecord>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenRecord {
    dialect: Dialect,
    line_number: Option<u32>,
    point_identification: String,
    point_number: String,
    blocks: Vec<WordBlock>,
    #[serde(default)]
    error: String,
    /// 归一化后的字索引块，形如 `81=12.345`。
    words: Vec<String>,
}

impl GoldenRecord {
    fn from_record(record: &ZeissRecord) -> Self {
        Self {
            dialect: record.dialect,
            line_number: record.line_number,
            point_identification: record.point_identification.clone(),
            point_number: record.point_number.clone(),
            blocks: record.blocks.to_vec(),
            error: record.error.clone(),
            words: record
                .to_blocks()
                .iter()
                .map(|block| format!("{}={}", block.word_index, block.raw_value))
                .collect(),
        }
    }
}

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

pub fn assert_golden(name: &str, records: &[ZeissRecord]) {
    let snapshot = GoldenFile {
        records: records.iter().map(GoldenRecord::from_record).collect(),
    };
    let base_dir = data_dir().join("golden");
    if let Err(err) = fs::create_dir_all(&base_dir) {
        panic!("无法创建黄金数据目录 {}: {err}", base_dir.display());
    }
    let golden_path = base_dir.join(format!("{name}.json"));
    let serialized = serde_json::to_string_pretty(&snapshot).expect("序列化黄金快照失败");

    if !golden_path.exists() {
        fs::write(&golden_path, &serialized)
            .unwrap_or_else(|err| panic!("写入黄金文件 {} 失败: {err}", golden_path.display()));
        panic!(
            "黄金文件 {} 不存在，已自动生成。请确认内容后重新运行测试。",
            golden_path.display()
        );
    }

    let expected_str = fs::read_to_string(&golden_path)
        .unwrap_or_else(|err| panic!("读取黄金文件 {} 失败: {err}", golden_path.display()));
    let expected: GoldenFile = serde_json::from_str(&expected_str)
        .unwrap_or_else(|err| panic!("解析黄金文件 {} 失败: {err}", golden_path.display()));

    if expected != snapshot {
        let diff_path = base_dir.join(format!("{name}.actual.json"));
        fs::write(&diff_path, &serialized).expect("写入差异文件失败");
        panic!(
            "黄金文件 {} 与当前解码结果不一致。已生成对照输出 {}。",
            golden_path.display(),
            diff_path.display()
        );
    }
}

fn decode_fixture(name: &str) -> Vec<ZeissRecord> {
    let path = data_dir().join(name);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("读取测试数据 {} 失败: {err}", path.display()));
    content
        .lines()
        .enumerate()
        .map(|(index, line)| {
            decode_line(line)
                .unwrap_or_else(|err| panic!("第 {} 行解码失败: {err}", index + 1))
        })
        .collect()
}

#[test]
fn field_book_matches_golden() {
    let records = decode_fixture("field_book.rec");
    assert_eq!(records.len(), 7);
    assert_golden("field_book", &records);
}

#[test]
fn short_rec500_line_has_only_first_block() {
    let records = decode_fixture("field_book.rec");
    let short = &records[5];
    assert_eq!(short.dialect, Dialect::Rec500);
    assert_eq!(short.blocks[0].type_mark, "ih");
    assert_eq!(short.blocks[0].value, "1.550");
    assert!(short.blocks[1].is_empty());
    assert!(short.blocks[2].is_empty());
}
