use std::str::FromStr;

/// Parse a numeric setting. Missing values give `Ok(default)`; values that are present but do not parse give an
/// `Err` carrying the offending string, so that the caller can log it before falling back.
pub fn parse_number<T: FromStr>(value: Option<String>, default: T) -> Result<T, String> {
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse::<T>().map_err(|_| v),
    }
}
