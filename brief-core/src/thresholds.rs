//! Significance thresholds for liquidation events

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BriefError, BriefResult};

/// Symbols priced as metals rather than crypto majors
const METAL_SYMBOLS: &[&str] = &["XAU", "XAG", "GOLD", "SILVER"];

/// Maps a symbol to the minimum notional an event needs to be significant
///
/// Immutable once built; construction validates every threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdTable {
    per_symbol: HashMap<String, f64>,
    default: f64,
    metals: f64,
}

impl ThresholdTable {
    pub fn new(
        per_symbol: HashMap<String, f64>,
        default: f64,
        metals: f64,
    ) -> BriefResult<Self> {
        let valid = |t: f64| t.is_finite() && t >= 0.0;
        if !valid(default) || !valid(metals) {
            return Err(BriefError::config(format!(
                "invalid fallback threshold: default={default}, metals={metals}"
            )));
        }
        for (symbol, threshold) in &per_symbol {
            if !valid(*threshold) {
                return Err(BriefError::config(format!(
                    "invalid threshold for {symbol}: {threshold}"
                )));
            }
        }
        Ok(Self {
            per_symbol,
            default,
            metals,
        })
    }

    /// Minimum notional for an event on `symbol` to count as significant
    pub fn threshold_for(&self, symbol: &str) -> f64 {
        if let Some(t) = self.per_symbol.get(symbol) {
            return *t;
        }
        if METAL_SYMBOLS.contains(&symbol) {
            return self.metals;
        }
        self.default
    }
}

impl Default for ThresholdTable {
    /// The thresholds the bot ships with: majors need a large print to make
    /// the digest, everything else clears a lower bar.
    fn default() -> Self {
        let per_symbol = HashMap::from([
            ("BTC".to_string(), 200_000.0),
            ("ETH".to_string(), 200_000.0),
            ("SOL".to_string(), 100_000.0),
        ]);
        Self {
            per_symbol,
            default: 50_000.0,
            metals: 150_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_symbol_beats_default() {
        let table = ThresholdTable::default();
        assert_eq!(table.threshold_for("BTC"), 200_000.0);
        assert_eq!(table.threshold_for("SOL"), 100_000.0);
    }

    #[test]
    fn unknown_symbol_uses_default() {
        let table = ThresholdTable::default();
        assert_eq!(table.threshold_for("DOGE"), 50_000.0);
    }

    #[test]
    fn metals_use_metals_fallback() {
        let table = ThresholdTable::default();
        assert_eq!(table.threshold_for("XAU"), 150_000.0);
        assert_eq!(table.threshold_for("XAG"), 150_000.0);
    }

    #[test]
    fn explicit_entry_beats_metals_fallback() {
        let table = ThresholdTable::new(
            HashMap::from([("XAU".to_string(), 1_000.0)]),
            50_000.0,
            150_000.0,
        )
        .unwrap();
        assert_eq!(table.threshold_for("XAU"), 1_000.0);
    }

    #[test]
    fn rejects_non_finite_threshold() {
        let result = ThresholdTable::new(
            HashMap::from([("BTC".to_string(), f64::NAN)]),
            50_000.0,
            150_000.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_negative_default() {
        let result = ThresholdTable::new(HashMap::new(), -1.0, 150_000.0);
        assert!(result.is_err());
    }
}
