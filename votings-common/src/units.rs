use thiserror::Error;

/// Value in wei, the smallest indivisible unit (10^-18 ether).
pub type Amount = u128;

/// Decimal places of one ether.
pub const ETHER_DECIMALS: usize = 18;

/// One ether in wei.
pub const WEI_PER_ETHER: Amount = 1_000_000_000_000_000_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Empty amount")]
    Empty,

    #[error("Invalid digit in amount: {0}")]
    InvalidDigit(String),

    #[error("Too many decimal places in {0} (max 18)")]
    TooPrecise(String),

    #[error("Amount out of range: {0}")]
    Overflow(String),
}

/// Parses a decimal ether string (`"0.01"`, `"3"`, `".5"`) into wei.
pub fn parse_ether(input: &str) -> Result<Amount, UnitsError> {
    let s = input.trim();
    if s.is_empty() || s == "." {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(UnitsError::InvalidDigit(input.to_string()));
    }
    if fraction.len() > ETHER_DECIMALS {
        return Err(UnitsError::TooPrecise(input.to_string()));
    }

    let overflow = || UnitsError::Overflow(input.to_string());

    let whole_wei = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<Amount>()
            .map_err(|_| overflow())?
            .checked_mul(WEI_PER_ETHER)
            .ok_or_else(overflow)?
    };

    let fraction_wei = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = ETHER_DECIMALS);
        padded.parse::<Amount>().map_err(|_| overflow())?
    };

    whole_wei.checked_add(fraction_wei).ok_or_else(overflow)
}

/// Renders wei as a decimal ether string without trailing zeros.
pub fn format_ether(wei: Amount) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = wei % WEI_PER_ETHER;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0>width$}", fraction, width = ETHER_DECIMALS);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
