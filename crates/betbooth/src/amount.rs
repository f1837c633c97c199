use alloy::primitives::U256;
use eyre::Context as _;

/// Wei per ETH (10^18), the fixed conversion factor for the native currency.
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

/// Parse a base-unit (wei) amount given as a plain decimal integer string.
pub fn parse_amount_wei(s: &str) -> eyre::Result<U256> {
    let s = s.trim();
    if s.is_empty() {
        eyre::bail!("empty amount");
    }
    let v: U256 = s.parse().context("parse wei amount")?;
    Ok(v)
}

/// Parse a UI decimal ETH amount ("1.5") into wei.
pub fn parse_eth_to_wei(s: &str) -> eyre::Result<U256> {
    let s = s.trim();
    if s.is_empty() {
        eyre::bail!("empty amount");
    }

    let (whole, frac) = match s.split_once('.') {
        Some((a, b)) => (a, b),
        None => (s, ""),
    };

    if whole.starts_with('-') {
        eyre::bail!("amount must be non-negative");
    }
    if frac.len() > 18 {
        eyre::bail!("too many decimal places (max 18 for ETH)");
    }

    let whole_v: U256 = if whole.is_empty() {
        U256::ZERO
    } else {
        whole.parse().context("parse whole part")?
    };

    let mut frac_s = frac.to_owned();
    while frac_s.len() < 18 {
        frac_s.push('0');
    }
    let frac_v: U256 = if frac_s.is_empty() {
        U256::ZERO
    } else {
        frac_s.parse().context("parse fractional part")?
    };

    let wei = whole_v
        .checked_mul(U256::from(WEI_PER_ETH))
        .and_then(|x| x.checked_add(frac_v))
        .ok_or_else(|| eyre::eyre!("amount overflow"))?;
    Ok(wei)
}

/// Format a wei amount into a decimal ETH string without using floats.
///
/// Examples:
/// - 1000000000000000000 => "1"
/// - 1500000000000000000 => "1.5"
/// - 1 => "0.000000000000000001"
pub fn format_wei_to_eth(wei: U256) -> String {
    let scale = U256::from(WEI_PER_ETH);
    let whole = wei / scale;
    let frac = wei % scale;
    if frac.is_zero() {
        return whole.to_string();
    }
    let mut frac_s = format!("{frac:0>18}");
    while frac_s.ends_with('0') {
        frac_s.pop();
    }
    format!("{whole}.{frac_s}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_wei_plain_integer() {
        let v = parse_amount_wei("42");
        assert!(v.is_ok(), "parse failed: {v:?}");
        assert_eq!(v.ok(), Some(U256::from(42_u64)));

        assert!(parse_amount_wei("").is_err(), "empty should fail");
        assert!(parse_amount_wei("1.5").is_err(), "decimal point in wei");
    }

    #[test]
    fn parse_eth_decimal_to_wei() {
        let one = parse_eth_to_wei("1");
        assert!(one.is_ok(), "parse failed: {one:?}");
        assert_eq!(one.ok(), Some(U256::from(WEI_PER_ETH)));

        let half = parse_eth_to_wei("0.5");
        assert!(half.is_ok(), "parse failed: {half:?}");
        assert_eq!(half.ok(), Some(U256::from(WEI_PER_ETH / 2)));

        let tiny = parse_eth_to_wei("0.000000000000000001");
        assert!(tiny.is_ok(), "parse failed: {tiny:?}");
        assert_eq!(tiny.ok(), Some(U256::from(1_u64)));
    }

    #[test]
    fn parse_eth_rejects_too_many_decimals() {
        let r = parse_eth_to_wei("1.0000000000000000001");
        assert!(r.is_err(), "expected error, got ok");
    }

    #[test]
    fn parse_eth_rejects_negative() {
        assert!(parse_eth_to_wei("-1").is_err(), "negative should fail");
    }

    #[test]
    fn format_one_eth_exactly() {
        assert_eq!(format_wei_to_eth(U256::from(WEI_PER_ETH)), "1");
    }

    #[test]
    fn format_trims_trailing_zeros() {
        assert_eq!(
            format_wei_to_eth(U256::from(1_500_000_000_000_000_000_u128)),
            "1.5"
        );
        assert_eq!(format_wei_to_eth(U256::from(1_u64)), "0.000000000000000001");
        assert_eq!(format_wei_to_eth(U256::ZERO), "0");
    }

    #[test]
    fn format_is_idempotent_on_same_input() {
        let v = U256::from(123_456_000_000_000_000_u128);
        assert_eq!(format_wei_to_eth(v), format_wei_to_eth(v));
    }
}
