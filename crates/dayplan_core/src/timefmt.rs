use crate::error::AppError;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const OFFSET_ENV_VAR: &str = "DAYPLAN_UTC_OFFSET";

/// `DAYPLAN_UTC_OFFSET` (`+HH:MM`) if set, else the system offset, else UTC.
pub fn local_offset() -> UtcOffset {
    if let Ok(raw) = std::env::var(OFFSET_ENV_VAR)
        && !raw.trim().is_empty()
    {
        match parse_offset(&raw) {
            Ok(offset) => return offset,
            Err(err) => tracing::warn!(value = %raw, error = %err, "ignoring invalid offset override"),
        }
    }
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

pub fn parse_offset(raw: &str) -> Result<UtcOffset, AppError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(
        trimmed,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|_| AppError::invalid_input("offset must look like +HH:MM"))
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, or `YYYY-MM-DD` (midnight).
/// Inputs without an offset are read at `offset`.
pub fn parse_datetime(raw: &str, offset: UtcOffset) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("datetime is required"));
    }

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }

    let with_seconds = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day] [hour]:[minute]");
    if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, with_seconds)
        .or_else(|_| PrimitiveDateTime::parse(trimmed, without_seconds))
    {
        return Ok(parsed.assume_offset(offset));
    }

    let date = parse_date(trimmed).map_err(|_| {
        AppError::invalid_input("datetime must be RFC3339, YYYY-MM-DD HH:MM[:SS] or YYYY-MM-DD")
    })?;
    Ok(date.midnight().assume_offset(offset))
}

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::invalid_input("date must be YYYY-MM-DD"))
}

pub fn format_datetime(value: OffsetDateTime) -> Result<String, AppError> {
    value
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn format_date(value: Date) -> Result<String, AppError> {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{format_date, format_datetime, parse_date, parse_datetime, parse_offset};
    use time::macros::{date, datetime, offset};

    #[test]
    fn parses_rfc3339_with_its_own_offset() {
        let parsed = parse_datetime("2024-01-02T09:00:00+01:00", offset!(-5)).unwrap();
        assert_eq!(parsed, datetime!(2024-01-02 09:00 +1));
    }

    #[test]
    fn parses_local_forms_at_given_offset() {
        let at = offset!(+2);
        assert_eq!(
            parse_datetime("2024-01-02 09:00", at).unwrap(),
            datetime!(2024-01-02 09:00 +2)
        );
        assert_eq!(
            parse_datetime("2024-01-02 09:00:30", at).unwrap(),
            datetime!(2024-01-02 09:00:30 +2)
        );
        assert_eq!(
            parse_datetime("2024-01-02", at).unwrap(),
            datetime!(2024-01-02 00:00 +2)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_datetime("tomorrow", offset!(UTC)).unwrap_err().code(), "invalid_input");
        assert_eq!(parse_datetime("  ", offset!(UTC)).unwrap_err().code(), "invalid_input");
        assert_eq!(parse_date("2024-13-01").unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_offset("+02:00").unwrap(), offset!(+2));
        assert_eq!(parse_offset("-05:30").unwrap(), offset!(-5:30));
        assert_eq!(parse_offset("UTC").unwrap(), offset!(UTC));
        assert!(parse_offset("2").is_err());
    }

    #[test]
    fn formats_round_values() {
        assert_eq!(
            format_datetime(datetime!(2024-01-02 09:00 UTC)).unwrap(),
            "2024-01-02T09:00:00Z"
        );
        assert_eq!(format_date(date!(2024-01-02)).unwrap(), "2024-01-02");
    }
}
