//! 重复点剔除与结果排序。
//!
//! 点号相同（不区分大小写）且距离小于阈值的两点视为重复。
//! 这一关系不可传递，因此按传递闭包聚类：链式相近的点落入同一簇，
//! 每簇保留输入顺序中最先出现的一个。

use std::collections::HashMap;

use georec_core::record::PointRecord;

pub const DEFAULT_THRESHOLD: f64 = 0.03;

/// 两点间用于去重的距离。
///
/// 两点都有高程时取斜距，都没有高程时取平距；只有一方有高程时无法比较，返回 `None`。
fn separation(a: &PointRecord, b: &PointRecord) -> Option<f64> {
    let (pa, pb) = (a.position()?, b.position()?);
    match (a.height.is_some(), b.height.is_some()) {
        (true, true) => Some(pa.distance(pb)),
        (false, false) => Some(pa.horizontal_distance(pb)),
        _ => None,
    }
}

// 只剩测量值、没有点号和坐标的记录输出为空行。
fn is_blank(record: &PointRecord) -> bool {
    record.number.trim().is_empty() && record.code.trim().is_empty() && record.valency().is_none()
}

pub fn is_duplicate(a: &PointRecord, b: &PointRecord, threshold: f64) -> bool {
    number_key(&a.number) == number_key(&b.number)
        && separation(a, b).is_some_and(|distance| distance < threshold)
}

fn number_key(number: &str) -> String {
    number.trim().to_lowercase()
}

pub fn eliminate_duplicates(items: Vec<PointRecord>, threshold: f64) -> Vec<PointRecord> {
    let items: Vec<PointRecord> = items.into_iter().filter(|item| !is_blank(item)).collect();
    let mut parents: Vec<usize> = (0..items.len()).collect();

    let mut by_number: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        if item.position().is_some() {
            by_number
                .entry(number_key(&item.number))
                .or_default()
                .push(index);
        }
    }
    for members in by_number.values() {
        for (offset, &a) in members.iter().enumerate() {
            for &b in &members[offset + 1..] {
                if is_duplicate(&items[a], &items[b], threshold) {
                    union(&mut parents, a, b);
                }
            }
        }
    }

    let keep: Vec<bool> = (0..items.len())
        .map(|index| find(&mut parents, index) == index)
        .collect();
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, keep)| keep.then_some(item))
        .collect()
}

fn find(parents: &mut [usize], index: usize) -> usize {
    let mut root = index;
    while parents[root] != root {
        root = parents[root];
    }
    let mut current = index;
    while parents[current] != root {
        let next = parents[current];
        parents[current] = root;
        current = next;
    }
    root
}

// 较小的下标做根，根即簇内最先出现的条目。
fn union(parents: &mut [usize], a: usize, b: usize) {
    let ra = find(parents, a);
    let rb = find(parents, b);
    if ra != rb {
        parents[ra.max(rb)] = ra.min(rb);
    }
}

/// 按整行小写文本稳定排序。
pub fn sort_result(mut lines: Vec<String>) -> Vec<String> {
    lines.sort_by_cached_key(|line| line.to_lowercase());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use georec_core::record::RecordKind;

    // 点码用作标签，便于断言保留了哪一条。
    fn point(number: &str, x: f64, tag: &str) -> PointRecord {
        PointRecord {
            number: number.to_string(),
            code: tag.to_string(),
            easting: Some(x),
            northing: Some(0.0),
            height: Some(0.0),
            instrument_height: None,
            target_height: None,
            horizontal_angle: None,
            vertical_angle: None,
            slope_distance: None,
            kind: RecordKind::Coordinate,
        }
    }

    fn tags(items: &[PointRecord]) -> Vec<&str> {
        items.iter().map(|item| item.code.as_str()).collect()
    }

    #[test]
    fn close_points_with_same_number_collapse_to_first() {
        let items = vec![
            point("A1", 0.0, "first"),
            point("B2", 0.0, "other number"),
            point("a1", 0.02, "second"),
        ];
        let result = eliminate_duplicates(items, DEFAULT_THRESHOLD);
        assert_eq!(tags(&result), vec!["first", "other number"]);
    }

    #[test]
    fn elimination_is_idempotent() {
        let items = vec![
            point("1", 0.0, "a"),
            point("1", 0.01, "b"),
            point("2", 5.0, "c"),
            point("1", 9.0, "d"),
        ];
        let once = eliminate_duplicates(items, DEFAULT_THRESHOLD);
        let twice = eliminate_duplicates(once.clone(), DEFAULT_THRESHOLD);
        assert_eq!(once, twice);
        assert_eq!(tags(&once), vec!["a", "c", "d"]);
    }

    #[test]
    fn threshold_is_strict() {
        let at = vec![point("1", 0.0, "a"), point("1", 0.5, "b")];
        assert_eq!(eliminate_duplicates(at, 0.5).len(), 2);

        let below = vec![point("1", 0.0, "a"), point("1", 0.5 - 1e-9, "b")];
        assert_eq!(eliminate_duplicates(below, 0.5).len(), 1);
    }

    #[test]
    fn chains_are_merged_transitively() {
        // a–b 与 b–c 均在阈值内，a–c 不在；三者同属一簇。
        let items = vec![
            point("7", 0.0, "a"),
            point("7", 0.25, "b"),
            point("7", 0.5, "c"),
        ];
        let result = eliminate_duplicates(items, 0.3);
        assert_eq!(tags(&result), vec!["a"]);
    }

    #[test]
    fn missing_height_is_not_read_as_zero() {
        let mut no_height = point("5", 0.0, "plan");
        no_height.height = None;
        let mut low = point("5", 0.0, "low");
        low.height = Some(0.01);
        assert!(!is_duplicate(&no_height, &low, DEFAULT_THRESHOLD));
        assert_eq!(
            eliminate_duplicates(vec![no_height.clone(), low], DEFAULT_THRESHOLD).len(),
            2
        );

        let mut other_plan = point("5", 0.02, "plan too");
        other_plan.height = None;
        assert!(is_duplicate(&no_height, &other_plan, DEFAULT_THRESHOLD));
    }

    #[test]
    fn slope_distance_decides_when_both_have_height() {
        let a = point("9", 0.0, "a");
        let mut b = point("9", 0.0, "b");
        b.height = Some(0.05);
        assert!(!is_duplicate(&a, &b, DEFAULT_THRESHOLD));
        b.height = Some(0.02);
        assert!(is_duplicate(&a, &b, DEFAULT_THRESHOLD));
    }

    #[test]
    fn blank_records_dropped_and_unpositioned_kept() {
        let mut unpositioned = point("1", 0.0, "no position");
        unpositioned.easting = None;
        let mut blank = point("", 0.0, "");
        blank.easting = None;
        blank.northing = None;
        blank.height = None;
        blank.horizontal_angle = Some(100.0);

        let items = vec![point("1", 0.0, "a"), unpositioned, blank];
        let result = eliminate_duplicates(items, DEFAULT_THRESHOLD);
        assert_eq!(tags(&result), vec!["a", "no position"]);
    }

    #[test]
    fn sort_is_case_insensitive_and_stable() {
        let sorted = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(sort_result(sorted.clone()), sorted);

        let mixed = vec![
            "b".to_string(),
            "ABC1".to_string(),
            "abc1".to_string(),
            "Abc0".to_string(),
        ];
        assert_eq!(sort_result(mixed), vec!["Abc0", "ABC1", "abc1", "b"]);
    }
}
