use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

pub use serde_with::{serde_as, DeserializeAs};

/// 人类可读的时间间隔，例如 `"500ms"`、`"1h"`、`"1h30m"`
///
/// 用于轮询间隔、清理间隔等配置项：
///
/// ```ignore
/// #[serde_as(as = "HumanDur")]
/// pub poll_interval: Duration,
/// ```
pub struct HumanDur;

impl<'de> DeserializeAs<'de, Duration> for HumanDur {
    fn deserialize_as<D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

const UNITS: [(&str, u64); 7] = [
    ("d", 86_400_000_000_000),
    ("h", 3_600_000_000_000),
    ("m", 60_000_000_000),
    ("s", 1_000_000_000),
    ("ms", 1_000_000),
    ("us", 1_000),
    ("ns", 1),
];

fn unit_nanos(unit: &str) -> Option<u64> {
    UNITS.iter().find(|(name, _)| *name == unit).map(|(_, n)| *n)
}

/// 解析时间间隔，由若干 `数字+单位` 组成，单位为 d/h/m/s/ms/us/ns
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_ascii_lowercase();
    if s.is_empty() {
        bail!("空的时间间隔");
    }

    let mut total = 0f64;
    let mut rest = s.as_str();
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (num, after) = rest.split_at(num_end);
        if num.is_empty() {
            bail!("期望数字: {}", s);
        }
        let value: f64 = num.parse().map_err(|_| anyhow!("无效数字: {}", num))?;

        let unit_end = after
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after.len());
        let (unit, next) = after.split_at(unit_end);
        if unit.is_empty() {
            bail!("缺少时间单位: {}", s);
        }
        let nanos = unit_nanos(unit).ok_or_else(|| anyhow!("不支持的时间单位: {}", unit))?;

        total += value * nanos as f64;
        rest = next;
    }

    Ok(Duration::from_nanos(total.round() as u64))
}
