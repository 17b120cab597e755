//! Recipe catalog and "what can I make with this" ingredient matching.

pub mod dao;
pub mod matching;
pub mod models;

pub use dao::RecipeDao;
pub use matching::{match_recipes, normalize_ingredient};
pub use models::{Ingredient, Recipe, RecipeMatch};
