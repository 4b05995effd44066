//! Asset symbol normalization.

/// Prefix the exchange puts on locked-earn balances ("LDBTC" holds BTC).
const EARN_PREFIX: &str = "LD";

/// Strips the earn-wrapper prefix so wrapped balances merge with their
/// underlying asset for valuation. Anything else passes through unchanged.
pub fn normalize_symbol(symbol: &str) -> &str {
    symbol.strip_prefix(EARN_PREFIX).unwrap_or(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_earn_prefix() {
        assert_eq!(normalize_symbol("LDBTC"), "BTC");
    }

    #[test]
    fn leaves_unwrapped_symbols_unchanged() {
        assert_eq!(normalize_symbol("ETH"), "ETH");
        assert_eq!(normalize_symbol(""), "");
    }

    #[test]
    fn bare_prefix_normalizes_to_empty() {
        assert_eq!(normalize_symbol("LD"), "");
    }

    #[test]
    fn is_idempotent_for_typical_symbols() {
        assert_eq!(normalize_symbol(normalize_symbol("LDETH")), "ETH");
    }
}
