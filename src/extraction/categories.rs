use super::IngredientCategory;

const PRODUCE_KEYWORDS: &[&str] = &[
    "apple", "avocado", "banana", "berry", "broccoli", "cabbage", "carrot", "celery",
    "cucumber", "eggplant", "fruit", "garlic", "ginger", "greens", "kale", "lemon",
    "lettuce", "lime", "mango", "mushroom", "onion", "orange", "pear", "pepper",
    "potato", "salad", "spinach", "squash", "tomato", "vegetable", "veggie", "zucchini",
];

const PROTEIN_KEYWORDS: &[&str] = &[
    "bacon", "bean", "beef", "chicken", "chickpea", "cod", "edamame", "egg", "fish",
    "ham", "lamb", "lentil", "peanut", "pork", "prawn", "protein", "salmon", "sardine",
    "seitan", "shrimp", "steak", "tempeh", "tofu", "tuna", "turkey", "whey",
];

const DAIRY_KEYWORDS: &[&str] = &[
    "butter", "cheese", "cottage", "cream", "feta", "kefir", "milk", "mozzarella",
    "parmesan", "ricotta", "yogurt", "yoghurt",
];

const GRAINS_KEYWORDS: &[&str] = &[
    "bagel", "barley", "bread", "bulgur", "cereal", "couscous", "cracker", "flour",
    "granola", "noodle", "oat", "oatmeal", "pasta", "quinoa", "rice", "spaghetti",
    "tortilla", "wheat", "wrap",
];

/// Table order matters: the first table with a matching word wins, so
/// "peanut butter" lands in Protein before Dairy sees "butter".
const TABLES: &[(IngredientCategory, &[&str])] = &[
    (IngredientCategory::Produce, PRODUCE_KEYWORDS),
    (IngredientCategory::Protein, PROTEIN_KEYWORDS),
    (IngredientCategory::Dairy, DAIRY_KEYWORDS),
    (IngredientCategory::Grains, GRAINS_KEYWORDS),
];

pub fn categorize(name: &str) -> IngredientCategory {
    let lowered = name.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();

    for (category, keywords) in TABLES {
        if words
            .iter()
            .any(|word| keywords.iter().any(|keyword| word_matches(word, keyword)))
        {
            return *category;
        }
    }
    IngredientCategory::Other
}

fn word_matches(word: &str, keyword: &str) -> bool {
    if word == keyword {
        return true;
    }
    if let (Some(stem), Some(root)) = (word.strip_suffix("ies"), keyword.strip_suffix('y')) {
        if stem.ends_with(root) {
            return true;
        }
    }
    if word.strip_suffix("es") == Some(keyword) || word.strip_suffix('s') == Some(keyword) {
        return true;
    }
    // Compounds such as "buttermilk" or "pineapple".
    keyword.len() >= 4 && (word.ends_with(keyword) || word.strip_suffix('s').is_some_and(|w| w.ends_with(keyword)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_categories() {
        assert_eq!(categorize("rice"), IngredientCategory::Grains);
        assert_eq!(categorize("chicken"), IngredientCategory::Protein);
        assert_eq!(categorize("Greek Yogurt"), IngredientCategory::Dairy);
        assert_eq!(categorize("baby spinach"), IngredientCategory::Produce);
        assert_eq!(categorize("olive oil"), IngredientCategory::Other);
    }

    #[test]
    fn test_plurals_and_compounds() {
        assert_eq!(categorize("eggs"), IngredientCategory::Protein);
        assert_eq!(categorize("tomatoes"), IngredientCategory::Produce);
        assert_eq!(categorize("blueberries"), IngredientCategory::Produce);
        assert_eq!(categorize("buttermilk"), IngredientCategory::Dairy);
        assert_eq!(categorize("rolled oats"), IngredientCategory::Grains);
    }

    #[test]
    fn test_table_order_resolves_overlaps() {
        assert_eq!(categorize("peanut butter"), IngredientCategory::Protein);
        assert_eq!(categorize("eggplant"), IngredientCategory::Produce);
    }
}
