//! Ingredient extraction: turns free-text meals into categorized ingredient
//! lists, through the AI completion endpoint when it cooperates and through
//! a deterministic local parser when it does not.

pub mod categories;
pub mod client;
pub mod fallback;
pub mod retry;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub use client::{ExtractionConfig, IngredientExtractor};
pub use retry::{ExtractionAttempt, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IngredientCategory {
    Produce,
    Protein,
    Dairy,
    Grains,
    Other,
}

impl IngredientCategory {
    pub const ALL: [IngredientCategory; 5] = [
        IngredientCategory::Produce,
        IngredientCategory::Protein,
        IngredientCategory::Dairy,
        IngredientCategory::Grains,
        IngredientCategory::Other,
    ];

    /// Maps a label such as `"produce"` or `"Grains"` to a category.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "produce" => Some(Self::Produce),
            "protein" | "proteins" => Some(Self::Protein),
            "dairy" => Some(Self::Dairy),
            "grains" | "grain" => Some(Self::Grains),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for IngredientCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Produce => "Produce",
            Self::Protein => "Protein",
            Self::Dairy => "Dairy",
            Self::Grains => "Grains",
            Self::Other => "Other",
        };
        f.write_str(label)
    }
}

/// A quantity as the AI or a recipe line wrote it: a number when it parses
/// as one, the raw text otherwise ("a pinch", "1/2").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Amount(f64),
    Text(String),
}

impl Quantity {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Quantity::Amount(value),
            _ => Quantity::Text(trimmed.to_string()),
        }
    }

    pub fn as_amount(&self) -> Option<f64> {
        match self {
            Quantity::Amount(value) => Some(*value),
            Quantity::Text(text) => text.trim().parse::<f64>().ok(),
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::Text(String::new())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Amount(value) if value.fract() == 0.0 => write!(f, "{}", *value as i64),
            Quantity::Amount(value) => write!(f, "{}", value),
            Quantity::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRecord {
    pub name: String,
    pub quantity: Quantity,
    pub unit: String,
    pub category: IngredientCategory,
}

impl IngredientRecord {
    /// Builds a record whose category comes from the keyword tables.
    pub fn categorized(name: impl Into<String>, quantity: Quantity, unit: impl Into<String>) -> Self {
        let name = name.into();
        let category = categories::categorize(&name);
        Self {
            name,
            quantity,
            unit: unit.into(),
            category,
        }
    }
}

/// Ingredients grouped by category. The total is always derived from the
/// lists themselves, so it cannot drift from their lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedIngredientList {
    lists: BTreeMap<IngredientCategory, Vec<IngredientRecord>>,
    error: Option<String>,
}

impl CategorizedIngredientList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            lists: BTreeMap::new(),
            error: Some(error.into()),
        }
    }

    pub fn push(&mut self, record: IngredientRecord) {
        self.lists.entry(record.category).or_default().push(record);
    }

    /// Category-wise concatenation; `other`'s records follow ours.
    pub fn merge(&mut self, other: CategorizedIngredientList) {
        for (category, records) in other.lists {
            self.lists.entry(category).or_default().extend(records);
        }
    }

    pub fn get(&self, category: IngredientCategory) -> &[IngredientRecord] {
        self.lists.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &IngredientRecord> {
        self.lists.values().flatten()
    }

    pub fn total_count(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }
}

impl FromIterator<IngredientRecord> for CategorizedIngredientList {
    fn from_iter<I: IntoIterator<Item = IngredientRecord>>(iter: I) -> Self {
        let mut list = CategorizedIngredientList::new();
        for record in iter {
            list.push(record);
        }
        list
    }
}

impl Serialize for CategorizedIngredientList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut categories = BTreeMap::new();
        for category in IngredientCategory::ALL {
            categories.insert(category.to_string(), self.get(category));
        }
        let mut state = serializer.serialize_struct("CategorizedIngredientList", 3)?;
        state.serialize_field("categories", &categories)?;
        state.serialize_field("totalCount", &self.total_count())?;
        state.serialize_field("error", &self.error)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct CategorizedIngredientListWire {
    #[serde(default)]
    categories: BTreeMap<String, Vec<IngredientRecord>>,
    #[serde(default)]
    error: Option<String>,
}

impl<'de> Deserialize<'de> for CategorizedIngredientList {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = CategorizedIngredientListWire::deserialize(deserializer)?;
        let mut list: CategorizedIngredientList =
            wire.categories.into_values().flatten().collect();
        list.error = wire.error;
        Ok(list)
    }
}
