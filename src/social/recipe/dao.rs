//! Recipe catalog data access

use crate::social::recipe::models::{parse_ingredients, Ingredient, Recipe};
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, warn};

pub struct RecipeDao {
    db: Pool<Sqlite>,
}

impl RecipeDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    fn map_row(m: SqliteRow) -> Result<Recipe> {
        let id: String = m.get("id");
        let raw: String = m.get("ingredients");
        let ingredients = parse_ingredients(&raw)
            .with_context(|| format!("recipe {} has a malformed ingredient list", id))?;
        Ok(Recipe {
            id,
            name: m.get("name"),
            ingredients,
            instructions: m.get("instructions"),
            image_url: m.get("image_url"),
        })
    }

    pub async fn insert_recipe(&self, recipe: &Recipe) -> Result<()> {
        let ingredients = serde_json::to_string(&recipe.ingredients)?;
        sqlx::query(
            r#"
            INSERT INTO recipes (id, name, ingredients, instructions, image_url)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                ingredients = excluded.ingredients,
                instructions = excluded.instructions,
                image_url = excluded.image_url
            "#,
        )
        .bind(&recipe.id)
        .bind(&recipe.name)
        .bind(ingredients)
        .bind(&recipe.instructions)
        .bind(&recipe.image_url)
        .execute(&self.db)
        .await
        .context("failed to insert recipe")?;
        Ok(())
    }

    pub async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        let row = sqlx::query(
            "SELECT id, name, ingredients, instructions, image_url FROM recipes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("failed to query recipe")?;
        row.map(Self::map_row).transpose()
    }

    /// The whole catalog, by name. A recipe whose ingredient list cannot be
    /// parsed is logged and left out rather than failing the listing.
    pub async fn get_all_recipes(&self) -> Result<Vec<Recipe>> {
        let rows = sqlx::query(
            "SELECT id, name, ingredients, instructions, image_url FROM recipes ORDER BY name",
        )
        .fetch_all(&self.db)
        .await
        .context("failed to query recipes")?;

        let mut recipes = Vec::with_capacity(rows.len());
        for row in rows {
            match Self::map_row(row) {
                Ok(recipe) => recipes.push(recipe),
                Err(e) => warn!("[RecipeDAO] skipping recipe: {:#}", e),
            }
        }
        debug!("[RecipeDAO] loaded {} recipes", recipes.len());
        Ok(recipes)
    }

    /// Distinct ingredient names across the catalog, for ingredient pickers
    pub async fn get_all_ingredient_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .get_all_recipes()
            .await?
            .into_iter()
            .flat_map(|r| r.ingredients.into_iter().map(|i: Ingredient| i.name.trim().to_string()))
            .collect();
        names.sort_by_key(|n| n.to_lowercase());
        names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::db::create_memory_pool;
    use crate::social::db::test_support::init_test_logger;
    use crate::social::recipe::match_recipes;

    #[tokio::test]
    async fn catalog_round_trips_and_skips_broken_rows() -> Result<()> {
        init_test_logger();
        let pool = create_memory_pool().await?;
        let dao = RecipeDao::new(pool.clone());
        dao.insert_recipe(&Recipe {
            id: "r1".into(),
            name: "Gimlet".into(),
            ingredients: vec![
                Ingredient {
                    name: "Gin".into(),
                    measure: Some("2 oz".into()),
                },
                Ingredient {
                    name: "lime".into(),
                    measure: None,
                },
            ],
            instructions: Some("Shake".into()),
            image_url: None,
        })
        .await?;
        sqlx::query("INSERT INTO recipes (id, name, ingredients) VALUES ('r2', 'Broken', '{oops')")
            .execute(&pool)
            .await?;
        sqlx::query(r#"INSERT INTO recipes (id, name, ingredients) VALUES ('r3', 'Gin Rickey', '["Gin", "Lime", "Soda"]')"#)
            .execute(&pool)
            .await?;

        let recipes = dao.get_all_recipes().await?;
        assert_eq!(recipes.len(), 2);
        assert!(dao.get_recipe("r2").await.is_err());

        let ranked = match_recipes(&["gin", "LIME"], &recipes);
        assert_eq!(ranked[0].recipe.name, "Gimlet");
        assert_eq!(ranked[0].match_percentage, 100);
        assert_eq!(ranked[1].match_percentage, 67);

        assert_eq!(
            dao.get_all_ingredient_names().await?,
            vec!["Gin", "lime", "Soda"]
        );
        Ok(())
    }
}
