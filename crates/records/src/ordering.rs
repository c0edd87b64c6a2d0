//! 记录按 `timestamp` 字段排序
//!
//! 字符串按常见日期格式依次尝试解析，数字视为毫秒时间戳。
//! 无法解析的记录排在所有有效记录之后，彼此保持原有顺序。

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

/// 记录中用于排序的字段名
pub const TIMESTAMP_FIELD: &str = "timestamp";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// 省略秒的带时区格式（RFC 3339 要求秒）
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// 解析日期字符串，失败返回 `None`
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // `Z` 后缀统一为 `+00:00`，%:z 不接受 `Z`
    let with_offset = match raw.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => raw.to_string(),
    };
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return start_of_day(date);
        }
    }

    parse_reduced_date(raw)
}

/// ISO 8601 简化形式：`YYYY-MM` 取当月第一天，`YYYY` 取当年第一天
fn parse_reduced_date(raw: &str) -> Option<DateTime<Utc>> {
    let (year, month) = match raw.split_once('-') {
        Some((year, month)) if month.len() == 2 => (year, month.parse::<u32>().ok()?),
        Some(_) => return None,
        None => (raw, 1),
    };
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month, 1).and_then(start_of_day)
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

/// 提取记录的排序时间
pub fn record_timestamp(record: &Value) -> Option<DateTime<Utc>> {
    match record.get(TIMESTAMP_FIELD)? {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
        _ => None,
    }
}

/// 按时间倒序排序（最新在前），稳定排序
pub fn sort_newest_first(records: &mut [Value]) {
    records.sort_by_cached_key(|record| std::cmp::Reverse(SortKey(record_timestamp(record))));
}

/// `None` 小于任何有效时间，倒序后排在末尾
#[derive(PartialEq, Eq)]
struct SortKey(Option<DateTime<Utc>>);

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }
}
