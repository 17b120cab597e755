use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
}

/// Stored ingredient entries are either bare names or `{name, measure}`
/// objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredIngredient {
    Name(String),
    Full(Ingredient),
}

impl From<StoredIngredient> for Ingredient {
    fn from(value: StoredIngredient) -> Self {
        match value {
            StoredIngredient::Name(name) => Ingredient {
                name,
                measure: None,
            },
            StoredIngredient::Full(ingredient) => ingredient,
        }
    }
}

/// Parse the JSON `ingredients` column; blank names are dropped
pub fn parse_ingredients(raw: &str) -> Result<Vec<Ingredient>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let stored: Vec<StoredIngredient> =
        serde_json::from_str(raw).context("malformed ingredient list")?;
    Ok(stored
        .into_iter()
        .map(Ingredient::from)
        .filter(|i| !i.name.trim().is_empty())
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Option<String>,
    pub image_url: Option<String>,
}

/// A recipe scored against the user's selected ingredients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeMatch {
    pub recipe: Recipe,
    pub matched_count: usize,
    pub total_count: usize,
    /// 0..=100
    pub match_percentage: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_ingredient_entries() {
        let parsed =
            parse_ingredients(r#"["Lime juice", {"name": "Tequila", "measure": "2 oz"}, "  "]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                Ingredient {
                    name: "Lime juice".into(),
                    measure: None
                },
                Ingredient {
                    name: "Tequila".into(),
                    measure: Some("2 oz".into())
                },
            ]
        );
        assert!(parse_ingredients("").unwrap().is_empty());
        assert!(parse_ingredients("not json").is_err());
    }
}
