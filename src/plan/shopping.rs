use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

use crate::extraction::{CategorizedIngredientList, IngredientCategory, IngredientRecord, Quantity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub name: String,
    pub quantity: Quantity,
    pub unit: String,
    /// How many meal mentions were folded into this line.
    pub occurrences: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub sections: BTreeMap<IngredientCategory, Vec<ShoppingItem>>,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    category: String,
    name: &'a str,
    quantity: String,
    unit: &'a str,
    occurrences: u32,
}

fn normalized_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ShoppingList {
    /// Folds duplicate ingredients into one line per name and unit. Numeric
    /// quantities are summed; a textual quantity keeps the first mention.
    pub fn from_ingredients(ingredients: &CategorizedIngredientList) -> Self {
        let mut list = ShoppingList::default();
        for category in IngredientCategory::ALL {
            for record in ingredients.get(category) {
                list.add(record);
            }
        }
        list
    }

    fn add(&mut self, record: &IngredientRecord) {
        let section = self.sections.entry(record.category).or_default();
        let key = normalized_name(&record.name);
        let unit = record.unit.trim().to_lowercase();

        if let Some(existing) = section
            .iter_mut()
            .find(|item| normalized_name(&item.name) == key && item.unit == unit)
        {
            existing.occurrences += 1;
            if let (Some(a), Some(b)) = (existing.quantity.as_amount(), record.quantity.as_amount()) {
                existing.quantity = Quantity::Amount(a + b);
            }
            return;
        }

        section.push(ShoppingItem {
            name: record.name.trim().to_string(),
            quantity: record.quantity.clone(),
            unit,
            occurrences: 1,
        });
    }

    pub fn item_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for (category, items) in &self.sections {
            for item in items {
                csv_writer.serialize(CsvRow {
                    category: category.to_string(),
                    name: &item.name,
                    quantity: item.quantity.to_string(),
                    unit: &item.unit,
                    occurrences: item.occurrences,
                })?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}
