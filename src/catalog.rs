//! Static registry of resolvable currencies.
//!
//! The catalog is built once at process start and shared by `Arc`;
//! every lookup and routing decision goes through it.

use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyClass {
    Fiat,
    Crypto,
}

#[derive(Debug, Clone)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub class: CurrencyClass,
}

#[derive(Debug)]
pub struct Catalog {
    entries: BTreeMap<&'static str, Currency>,
}

const BUILTIN: &[Currency] = &[
    Currency {
        code: "USD",
        name: "United States Dollar",
        symbol: "$",
        class: CurrencyClass::Fiat,
    },
    Currency {
        code: "INR",
        name: "Indian Rupee",
        symbol: "₹",
        class: CurrencyClass::Fiat,
    },
    Currency {
        code: "EUR",
        name: "Euro",
        symbol: "€",
        class: CurrencyClass::Fiat,
    },
    Currency {
        code: "JPY",
        name: "Japanese Yen",
        symbol: "¥",
        class: CurrencyClass::Fiat,
    },
    Currency {
        code: "GBP",
        name: "British Pound Sterling",
        symbol: "£",
        class: CurrencyClass::Fiat,
    },
    Currency {
        code: "BTC",
        name: "Bitcoin",
        symbol: "BTC",
        class: CurrencyClass::Crypto,
    },
    Currency {
        code: "ETH",
        name: "Ethereum",
        symbol: "ETH",
        class: CurrencyClass::Crypto,
    },
];

impl Catalog {
    /// The fixed, curated set of supported currencies.
    pub fn builtin() -> Arc<Self> {
        Arc::new(Self {
            entries: BUILTIN.iter().map(|c| (c.code, c.clone())).collect(),
        })
    }

    pub fn get(&self, code: &str) -> Option<&Currency> {
        self.entries.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn is_crypto(&self, code: &str) -> bool {
        self.get(code)
            .is_some_and(|c| c.class == CurrencyClass::Crypto)
    }

    /// All catalog codes, in stable order.
    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contents() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 7);
        assert!(catalog.contains("USD"));
        assert!(catalog.contains("BTC"));
        assert!(!catalog.contains("XYZ"));

        let eur = catalog.get("EUR").unwrap();
        assert_eq!(eur.name, "Euro");
        assert_eq!(eur.symbol, "€");
        assert_eq!(eur.class, CurrencyClass::Fiat);
    }

    #[test]
    fn test_class_lookup() {
        let catalog = Catalog::builtin();
        assert!(catalog.is_crypto("BTC"));
        assert!(catalog.is_crypto("ETH"));
        assert!(!catalog.is_crypto("USD"));
        assert!(!catalog.is_crypto("XYZ"));
    }
}
