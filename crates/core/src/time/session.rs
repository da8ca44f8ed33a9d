use anyhow::Context;
use chrono::NaiveTime;

/// Parses the session hour a market view was requested for.
///
/// Accepts `HH` or `HH:MM` (24h clock).
pub fn parse_session_hour(raw: &str) -> anyhow::Result<NaiveTime> {
    let s = raw.trim();
    anyhow::ensure!(!s.is_empty(), "hour must be non-empty");

    if s.contains(':') {
        return NaiveTime::parse_from_str(s, "%H:%M")
            .with_context(|| format!("invalid hour {s:?}, expected HH or HH:MM"));
    }

    let hour: u32 = s
        .parse()
        .with_context(|| format!("invalid hour {s:?}, expected HH or HH:MM"))?;
    NaiveTime::from_hms_opt(hour, 0, 0).with_context(|| format!("hour out of range: {hour}"))
}

pub fn format_session_hour(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}
