//! Human-readable amounts to the smallest denomination

use crate::error::LedgerError;

/// Decimal places between one whole unit and the smallest denomination
pub const NEAR_NOMINATION_EXP: usize = 24;

/// Parse a decimal amount such as `1,000.5` into yocto units
///
/// Commas are ignored and surrounding whitespace is trimmed. At most
/// [`NEAR_NOMINATION_EXP`] fractional digits are accepted.
///
/// # Errors
/// `LedgerError::InvalidAmount` on empty input, non-digit characters, more
/// than one decimal point, too many fractional digits or overflow
pub fn parse_near_amount(text: &str) -> Result<u128, LedgerError> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(LedgerError::InvalidAmount("empty amount".to_string()));
    }

    let (whole, frac) = match cleaned.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(LedgerError::InvalidAmount(text.to_string()));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(LedgerError::InvalidAmount(text.to_string()));
    }
    if frac.len() > NEAR_NOMINATION_EXP {
        return Err(LedgerError::InvalidAmount(format!(
            "{text}: more than {NEAR_NOMINATION_EXP} fractional digits"
        )));
    }

    let digits = format!("{whole}{frac:0<NEAR_NOMINATION_EXP$}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse::<u128>()
        .map_err(|e| LedgerError::InvalidAmount(format!("{text}: {e}")))
}
