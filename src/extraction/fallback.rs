//! Deterministic ingredient extraction for when the AI path is exhausted.
//!
//! Three strategies, tried in order until one yields something:
//! an explicit `ingredients: [...]` block, measured `<qty><unit> <name>`
//! mentions anywhere in the description, and finally placeholder items
//! derived from the meal name.

use regex::Regex;
use std::sync::LazyLock;

use super::{CategorizedIngredientList, IngredientRecord, Quantity};

static INGREDIENTS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)ingredients\s*:\s*\[([^\]]*)\]").unwrap());

static BLOCK_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(?:(kg|g|ml|l|cups?|tbsp|tsp|oz)\s+)?(.+)$").unwrap()
});

static MEASURED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(kg|g|ml|l|cups?|tbsp|tsp|oz)\s+([a-z]+(?:[ -][a-z]+){0,2})")
        .unwrap()
});

static NAME_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+|\s+with\s+|,|&").unwrap());

const NAME_STOP_WORDS: &[&str] = &["with", "and", "or", "on", "in", "plus", "for"];

/// Runs the fallback strategies for one meal. Never fails; the result may be
/// empty when the meal name itself is blank.
pub fn parse_meal(meal_name: &str, meal_description: &str) -> CategorizedIngredientList {
    let from_block = parse_ingredients_block(meal_description);
    if !from_block.is_empty() {
        return from_block;
    }
    let measured = parse_measured_mentions(meal_description);
    if !measured.is_empty() {
        return measured;
    }
    placeholders_from_name(meal_name)
}

pub fn parse_ingredients_block(text: &str) -> CategorizedIngredientList {
    let Some(captures) = INGREDIENTS_BLOCK.captures(text) else {
        return CategorizedIngredientList::new();
    };
    captures[1]
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|item| !item.is_empty())
        .map(parse_block_item)
        .collect()
}

fn parse_block_item(item: &str) -> IngredientRecord {
    match BLOCK_ITEM.captures(item) {
        Some(captures) => {
            let unit = captures.get(2).map_or("", |m| m.as_str()).to_lowercase();
            IngredientRecord::categorized(
                captures[3].trim(),
                Quantity::parse(&captures[1]),
                unit,
            )
        }
        None => IngredientRecord::categorized(item, Quantity::default(), ""),
    }
}

pub fn parse_measured_mentions(text: &str) -> CategorizedIngredientList {
    MEASURED
        .captures_iter(text)
        .filter_map(|captures| {
            let name = trim_at_stop_word(&captures[3]);
            if name.is_empty() {
                return None;
            }
            Some(IngredientRecord::categorized(
                name,
                Quantity::parse(&captures[1]),
                captures[2].to_lowercase(),
            ))
        })
        .collect()
}

fn trim_at_stop_word(name: &str) -> String {
    name.split_whitespace()
        .take_while(|word| !NAME_STOP_WORDS.contains(&word.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn placeholders_from_name(meal_name: &str) -> CategorizedIngredientList {
    NAME_SEPARATORS
        .split(meal_name)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| IngredientRecord::categorized(part, Quantity::Amount(1.0), "serving"))
        .collect()
}
