//! Asset classification by ticker symbol.

use serde::{Deserialize, Serialize};

/// Coarse asset category used for stop-loss bases and correlation estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Crypto,
    Forex,
    Stock,
    Commodity,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Crypto => "crypto",
            AssetClass::Forex => "forex",
            AssetClass::Stock => "stock",
            AssetClass::Commodity => "commodity",
        }
    }
}

/// Tickers that mark a symbol as crypto wherever they appear in it.
const CRYPTO_TICKERS: &[&str] = &["BTC", "ETH", "BNB", "ADA", "SOL", "DOGE"];

const EQUITY_TICKERS: &[&str] = &["AAPL", "TSLA", "AMZN", "GOOGL", "MSFT", "NVDA"];

const COMMODITY_NAMES: &[&str] = &["GOLD", "OIL", "SILVER"];

const PAIR_SEPARATORS: &[char] = &['/', '-', '_'];

/// Rules in evaluation order. The first one that matches decides the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationRule {
    CryptoTicker,
    CurrencyPair,
    EquityAllowList,
    CommodityAllowList,
    Default,
}

impl ClassificationRule {
    pub const ORDER: [ClassificationRule; 5] = [
        ClassificationRule::CryptoTicker,
        ClassificationRule::CurrencyPair,
        ClassificationRule::EquityAllowList,
        ClassificationRule::CommodityAllowList,
        ClassificationRule::Default,
    ];

    /// Class this rule assigns when it matches.
    pub fn class(&self) -> AssetClass {
        match self {
            ClassificationRule::CryptoTicker | ClassificationRule::Default => AssetClass::Crypto,
            ClassificationRule::CurrencyPair => AssetClass::Forex,
            ClassificationRule::EquityAllowList => AssetClass::Stock,
            ClassificationRule::CommodityAllowList => AssetClass::Commodity,
        }
    }

    /// Whether this rule matches an already-normalized symbol.
    pub fn matches(&self, symbol: &str) -> bool {
        match self {
            ClassificationRule::CryptoTicker => {
                CRYPTO_TICKERS.iter().any(|t| symbol.contains(t))
            }
            ClassificationRule::CurrencyPair => is_currency_pair(symbol),
            ClassificationRule::EquityAllowList => EQUITY_TICKERS.contains(&symbol),
            ClassificationRule::CommodityAllowList => COMMODITY_NAMES.contains(&symbol),
            ClassificationRule::Default => true,
        }
    }
}

/// Trim and upper-case a symbol so lookups are case-insensitive.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Two three-letter codes joined by a single separator, e.g. `EUR/USD`.
fn is_currency_pair(symbol: &str) -> bool {
    let Some(sep) = symbol.find(PAIR_SEPARATORS) else {
        return false;
    };
    let (base, rest) = symbol.split_at(sep);
    let quote = &rest[1..];

    let is_code = |s: &str| s.len() == 3 && s.chars().all(|c| c.is_ascii_alphabetic());
    is_code(base) && is_code(quote)
}

/// The rule that decides `symbol`'s class.
pub fn matching_rule(symbol: &str) -> ClassificationRule {
    let normalized = normalize_symbol(symbol);
    ClassificationRule::ORDER
        .into_iter()
        .find(|rule| rule.matches(&normalized))
        .unwrap_or(ClassificationRule::Default)
}

/// Classify a ticker. Total: unknown symbols are treated as crypto.
pub fn classify(symbol: &str) -> AssetClass {
    matching_rule(symbol).class()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_ticker_rule() {
        assert_eq!(matching_rule("BTC"), ClassificationRule::CryptoTicker);
        assert_eq!(classify("ethusdt"), AssetClass::Crypto);
        assert_eq!(classify("DOGE-PERP"), AssetClass::Crypto);
    }

    #[test]
    fn test_crypto_ticker_beats_pair_shape() {
        // BTC/USD has the pair shape but the ticker rule comes first
        assert_eq!(matching_rule("BTC/USD"), ClassificationRule::CryptoTicker);
    }

    #[test]
    fn test_currency_pair_rule() {
        assert_eq!(matching_rule("EUR/USD"), ClassificationRule::CurrencyPair);
        assert_eq!(classify("gbp-jpy"), AssetClass::Forex);
        assert_eq!(classify("USD_CHF"), AssetClass::Forex);
        // no separator, or wrong shape
        assert_eq!(classify("EURUSD"), AssetClass::Crypto);
        assert_eq!(classify("EURO/USD"), AssetClass::Crypto);
        assert_eq!(classify("EU1/USD"), AssetClass::Crypto);
    }

    #[test]
    fn test_equity_rule() {
        assert_eq!(matching_rule("AAPL"), ClassificationRule::EquityAllowList);
        assert_eq!(classify(" msft "), AssetClass::Stock);
        assert_eq!(classify("AAPL2"), AssetClass::Crypto);
    }

    #[test]
    fn test_commodity_rule() {
        assert_eq!(matching_rule("GOLD"), ClassificationRule::CommodityAllowList);
        assert_eq!(classify("silver"), AssetClass::Commodity);
        assert_eq!(classify("OIL"), AssetClass::Commodity);
    }

    #[test]
    fn test_unknown_defaults_to_crypto() {
        assert_eq!(matching_rule("XYZ"), ClassificationRule::Default);
        assert_eq!(classify(""), AssetClass::Crypto);
        assert_eq!(classify("???"), AssetClass::Crypto);
    }
}
