//! Display helpers shared by the HTML page and the terminal client

use num_bigint::BigUint;
use num_traits::Zero;

/// Wei per ether.
const WEI_DECIMALS: usize = 18;

/// Shorten long hex strings to `first8...last8`; anything under 19 characters
/// is returned unchanged.
pub fn short_hex(long: &str) -> String {
    let chars: Vec<char> = long.chars().collect();
    if chars.len() < 19 {
        return long.to_string();
    }

    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Render a wei amount in ether with trailing zeros trimmed, e.g. `1.5`.
pub fn format_wei(wei: &BigUint) -> String {
    if wei.is_zero() {
        return "0".to_string();
    }

    let digits = wei.to_str_radix(10);
    let (whole, frac) = if digits.len() > WEI_DECIMALS {
        let split = digits.len() - WEI_DECIMALS;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = WEI_DECIMALS))
    };

    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, frac)
    }
}
