// Per-category provider results keyed by destination (or flight leg)

use crate::offer::{ProviderOffer, Synthetic, WeatherSummary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry<T> {
    pub key: String,
    pub items: Vec<T>,
}

/// Results of one provider category, in the order keys were first added.
///
/// A key that was queried and came back empty is kept as an empty entry, so
/// `get` can tell "no offers" apart from "never queried".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderResultSet<T> {
    entries: Vec<ResultEntry<T>>,
}

impl<T> Default for ProviderResultSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> ProviderResultSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // Appends to an existing key rather than replacing it
    pub fn add(&mut self, key: impl Into<String>, items: Vec<T>) {
        let key = key.into();
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.items.extend(items),
            None => self.entries.push(ResultEntry { key, items }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[T]> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.items.as_slice())
    }

    pub fn is_queried(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.items.as_slice()))
    }

    // Number of keys, not of items
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.entries.iter().map(|entry| entry.items.len()).sum()
    }
}

impl<T: Synthetic> ProviderResultSet<T> {
    // Keys whose items came (at least partly) from the fallback generator
    pub fn synthetic_keys(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.items.iter().any(Synthetic::is_synthetic))
            .map(|entry| entry.key.as_str())
            .collect()
    }
}

// Everything the composition actually used, returned to the caller for display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResults {
    pub flights: ProviderResultSet<ProviderOffer>,
    pub hotels: ProviderResultSet<ProviderOffer>,
    pub activities: ProviderResultSet<ProviderOffer>,
    pub weather: ProviderResultSet<WeatherSummary>,
}

impl RawResults {
    pub fn fallback_count(&self) -> usize {
        self.flights.synthetic_keys().len()
            + self.hotels.synthetic_keys().len()
            + self.activities.synthetic_keys().len()
            + self.weather.synthetic_keys().len()
    }
}
