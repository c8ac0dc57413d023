use crate::{EngineError, ResultEngine};

/// Parse a user supplied amount.
///
/// Surrounding whitespace is ignored. Text that is not a number is an
/// [`EngineError::InvalidAmount`]; numbers that come out as NaN or
/// infinite (`"nan"`, `"inf"`, `"1e400"`) are an
/// [`EngineError::NonFiniteAmount`]. The sign is free.
pub(crate) fn parse_amount(raw: &str) -> ResultEngine<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| EngineError::InvalidAmount(raw.to_string()))?;
    if !value.is_finite() {
        return Err(EngineError::NonFiniteAmount(raw.to_string()));
    }
    Ok(value)
}
