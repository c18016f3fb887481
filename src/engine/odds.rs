use thiserror::Error;

/// Error for American odds that cannot be converted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OddsError {
    /// Zero is meaningful in neither the favourite (`-`) nor the underdog
    /// (`+`) convention.
    #[error("american odds must be nonzero")]
    Zero,
    #[error("american odds must be a finite number")]
    NotFinite,
}

/// Convert American odds to decimal odds.
///
/// American odds are a signed figure: `+150` pays $150 profit per $100
/// staked, `-120` requires a $120 stake to win $100. Decimal odds are the
/// total payout multiplier per unit staked, stake included, so the result is
/// always greater than 1.
///
/// * `a > 0` → `a/100 + 1`
/// * `a < 0` → `100/|a| + 1`
/// * `a = 0` or non-finite → error; the caller must reject the input.
pub fn american_to_decimal(american: f64) -> Result<f64, OddsError> {
    if !american.is_finite() {
        return Err(OddsError::NotFinite);
    }
    if american == 0.0 {
        return Err(OddsError::Zero);
    }
    if american > 0.0 {
        Ok(american / 100.0 + 1.0)
    } else {
        Ok(100.0 / american.abs() + 1.0)
    }
}
