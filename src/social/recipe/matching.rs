//! Ingredient-match scoring. Pure and stateless: the same selection over the
//! same catalog always yields the same ranking.

use crate::social::recipe::models::{Recipe, RecipeMatch};
use std::collections::HashSet;

/// Comparison key for an ingredient name: trimmed and lowercased
pub fn normalize_ingredient(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Score every recipe against `selected`.
///
/// `match_percentage` is matched / total recipe ingredients, rounded to the
/// nearest integer. Recipes with no match are dropped. Results are ordered by
/// percentage descending, then by name ascending.
pub fn match_recipes<S: AsRef<str>>(selected: &[S], recipes: &[Recipe]) -> Vec<RecipeMatch> {
    let selected: HashSet<String> = selected
        .iter()
        .map(|s| normalize_ingredient(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect();
    if selected.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<RecipeMatch> = recipes
        .iter()
        .filter_map(|recipe| {
            let total_count = recipe.ingredients.len();
            if total_count == 0 {
                return None;
            }
            let matched_count = recipe
                .ingredients
                .iter()
                .filter(|i| selected.contains(&normalize_ingredient(&i.name)))
                .count();
            if matched_count == 0 {
                return None;
            }
            let match_percentage =
                (matched_count as f64 * 100.0 / total_count as f64).round() as u32;
            Some(RecipeMatch {
                recipe: recipe.clone(),
                matched_count,
                total_count,
                match_percentage,
            })
        })
        .collect();

    // ties: case-insensitive name, then raw bytes so the order stays total
    matches.sort_by(|a, b| {
        b.match_percentage
            .cmp(&a.match_percentage)
            .then_with(|| {
                a.recipe
                    .name
                    .to_lowercase()
                    .cmp(&b.recipe.name.to_lowercase())
            })
            .then_with(|| a.recipe.name.cmp(&b.recipe.name))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::recipe::models::Ingredient;

    fn recipe(name: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            id: name.to_lowercase(),
            name: name.into(),
            ingredients: ingredients
                .iter()
                .map(|n| Ingredient {
                    name: n.to_string(),
                    measure: None,
                })
                .collect(),
            instructions: None,
            image_url: None,
        }
    }

    fn catalog() -> Vec<Recipe> {
        vec![
            recipe("Mojito", &["White rum", "Lime", "Mint", "Sugar"]),
            recipe("Margarita", &["Tequila", "Lime", "Triple sec", "Salt"]),
            recipe("Daiquiri", &["White rum", "Lime", "Sugar"]),
            recipe("Old Fashioned", &["Bourbon", "Sugar", "Bitters"]),
        ]
    }

    #[test]
    fn empty_selection_matches_nothing() {
        let none: [&str; 0] = [];
        assert!(match_recipes(&none, &catalog()).is_empty());
        assert!(match_recipes(&["  ", ""], &catalog()).is_empty());
    }

    #[test]
    fn full_match_scores_one_hundred() {
        let results = match_recipes(&[" white RUM", "lime ", "Sugar"], &catalog());
        assert_eq!(results[0].recipe.name, "Daiquiri");
        assert_eq!(results[0].match_percentage, 100);
        assert_eq!(results[0].matched_count, 3);
        assert_eq!(results[0].total_count, 3);
    }

    #[test]
    fn ties_break_by_name() {
        let results = match_recipes(&["lime", "salt", "mint"], &catalog());
        let ranked: Vec<(&str, u32)> = results
            .iter()
            .map(|m| (m.recipe.name.as_str(), m.match_percentage))
            .collect();
        assert_eq!(
            ranked,
            vec![("Margarita", 50), ("Mojito", 50), ("Daiquiri", 33)]
        );
    }

    #[test]
    fn name_ties_ignore_case() {
        let catalog = vec![
            recipe("Mojito", &["Lime", "Mint"]),
            recipe("daiquiri", &["Lime", "Sugar"]),
            recipe("Daiquiri", &["Lime", "Rum"]),
        ];
        let results = match_recipes(&["lime"], &catalog);
        let names: Vec<&str> = results.iter().map(|m| m.recipe.name.as_str()).collect();
        assert_eq!(names, vec!["Daiquiri", "daiquiri", "Mojito"]);
    }

    #[test]
    fn unmatched_recipes_are_dropped() {
        let results = match_recipes(&["bitters"], &catalog());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].recipe.name, "Old Fashioned");
        assert_eq!(results[0].match_percentage, 33);
    }
}
