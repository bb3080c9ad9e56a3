/// Timestamp text for the clock image.
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use std::fmt::{Display, Write};

use crate::render::error::RenderError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimeFormat {
    /// `YYYY-MM-DD HH:MM:SS`, with `.ffffff` appended only when the
    /// microsecond part is non-zero.
    #[default]
    Default,
    /// chrono strftime pattern, validated on construction.
    Pattern(String),
}

impl TimeFormat {
    pub fn pattern(pattern: &str) -> Result<Self, RenderError> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(RenderError::Format {
                pattern: pattern.to_string(),
            });
        }
        Ok(TimeFormat::Pattern(pattern.to_string()))
    }

    pub fn render<Tz>(&self, time: &DateTime<Tz>) -> Result<String, RenderError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match self {
            TimeFormat::Default => {
                let mut out = format_with(time, DEFAULT_PATTERN)?;
                // Leap seconds report 1_000_000.. in the sub-second field.
                let micros = time.timestamp_subsec_micros() % 1_000_000;
                if micros != 0 {
                    out.push_str(&format!(".{micros:06}"));
                }
                Ok(out)
            }
            TimeFormat::Pattern(pattern) => format_with(time, pattern),
        }
    }
}

const DEFAULT_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

fn format_with<Tz>(time: &DateTime<Tz>, pattern: &str) -> Result<String, RenderError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    write!(out, "{}", time.format(pattern)).map_err(|_| RenderError::Format {
        pattern: pattern.to_string(),
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(micros: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 14, 9, 5, 3)
            .unwrap()
            + chrono::Duration::microseconds(micros as i64)
    }

    #[test]
    fn test_default_format_with_micros() {
        let text = TimeFormat::Default.render(&at(120_034)).unwrap();
        assert_eq!(text, "2026-10-14 09:05:03.120034");
    }

    #[test]
    fn test_default_format_pads_micros() {
        let text = TimeFormat::Default.render(&at(7)).unwrap();
        assert_eq!(text, "2026-10-14 09:05:03.000007");
    }

    #[test]
    fn test_default_format_drops_zero_micros() {
        let text = TimeFormat::Default.render(&at(0)).unwrap();
        assert_eq!(text, "2026-10-14 09:05:03");
    }

    #[test]
    fn test_default_format_ignores_sub_micro_nanos() {
        let t = at(0) + chrono::Duration::nanoseconds(999);
        assert_eq!(TimeFormat::Default.render(&t).unwrap(), "2026-10-14 09:05:03");
    }

    #[test]
    fn test_pattern_format() {
        let fmt = TimeFormat::pattern("%a %H:%M").unwrap();
        assert_eq!(fmt.render(&at(0)).unwrap(), "Wed 09:05");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        match TimeFormat::pattern("%Q %H") {
            Err(RenderError::Format { pattern }) => assert_eq!(pattern, "%Q %H"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_unvalidated_pattern_does_not_panic() {
        let fmt = TimeFormat::Pattern("%Q".to_string());
        assert!(fmt.render(&at(0)).is_err());
    }
}
