// SPDX-License-Identifier: MIT

//! ISO-8601 duration codec for `syncrate`.
//!
//! Supports only days/hours/minutes/seconds (the subset the source actually
//! emits and parses), plus the `"PUSH"` sentinel for `-1` (push-only
//! packages, never due by time — see `spec.md` §3/§8).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid ISO8601 duration string: {0:?}")]
    InvalidFormat(String),
    #[error("duration must be a non-negative integer or -1 (PUSH), got {0}")]
    Negative(i64),
    #[error("duration must be less than 31 days (2678400s), got {0}")]
    TooLarge(i64),
}

/// Parse an ISO-8601 duration (`P1DT2H3M4S` style, days/hours/minutes/seconds
/// only) into seconds. `"PUSH"` maps to the `-1` sentinel. An empty string
/// maps to `0`.
pub fn parse(iso8601: &str) -> Result<i64, DurationError> {
    if iso8601.is_empty() {
        return Ok(0);
    }
    if iso8601 == "PUSH" {
        return Ok(-1);
    }

    let rest = iso8601.strip_prefix('P').ok_or_else(|| DurationError::InvalidFormat(iso8601.to_string()))?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let days = parse_component(date_part, 'D')?;
    // Years/months/weeks are accepted-but-zero in the source grammar; we
    // only ever see days in practice, so anything else in the date part
    // that isn't a bare number+D is a format error.
    if !date_part.is_empty() && days.is_none() {
        return Err(DurationError::InvalidFormat(iso8601.to_string()));
    }

    let (hours, minutes, seconds) = if let Some(t) = time_part {
        let (h, rem) = take_component(t, 'H');
        let (m, rem) = take_component(rem, 'M');
        let (s, rem) = take_component(rem, 'S');
        if !rem.is_empty() {
            return Err(DurationError::InvalidFormat(iso8601.to_string()));
        }
        (h.unwrap_or(0), m.unwrap_or(0), s.unwrap_or(0))
    } else {
        (0, 0, 0)
    };

    Ok(days.unwrap_or(0) * 86400 + hours * 3600 + minutes * 60 + seconds)
}

fn parse_component(s: &str, unit: char) -> Result<Option<i64>, DurationError> {
    if s.is_empty() {
        return Ok(None);
    }
    let stripped = s.strip_suffix(unit).ok_or_else(|| DurationError::InvalidFormat(s.to_string()))?;
    stripped.parse::<i64>().map(Some).map_err(|_| DurationError::InvalidFormat(s.to_string()))
}

/// Consume a leading `<digits><unit>` prefix if present, returning the parsed
/// value and the remaining slice (unconsumed if the unit isn't next).
fn take_component(s: &str, unit: char) -> (Option<i64>, &str) {
    let digit_len = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digit_len == 0 {
        return (None, s);
    }
    let Some(rest) = s[digit_len..].strip_prefix(unit) else {
        return (None, s);
    };
    match s[..digit_len].parse::<i64>() {
        Ok(v) => (Some(v), rest),
        Err(_) => (None, s),
    }
}

/// Format seconds (or the `-1` PUSH sentinel) as an ISO-8601 duration.
pub fn format(duration: i64) -> Result<String, DurationError> {
    if duration == -1 {
        return Ok("PUSH".to_string());
    }
    if duration < 0 {
        return Err(DurationError::Negative(duration));
    }
    if duration > 2_678_399 {
        return Err(DurationError::TooLarge(duration));
    }
    if duration == 0 {
        // Matches the source: empty string, not "PT0S", to stay compatible
        // with the empty-string convention in the example config.
        return Ok(String::new());
    }

    let mut out = String::from("P");
    let mut rem = duration;

    let days = rem / 86400;
    rem %= 86400;
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }

    if rem > 0 {
        out.push('T');
        let hours = rem / 3600;
        rem %= 3600;
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        let minutes = rem / 60;
        rem %= 60;
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if rem > 0 {
            out.push_str(&format!("{rem}S"));
        }
    }

    Ok(out)
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
