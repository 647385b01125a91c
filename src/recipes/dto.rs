use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;
use crate::tags::repo::Tag;
use crate::users::dto::PublicUser;

/// Compact recipe form used in favorite/cart responses and author listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecipeShort {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

/// One ingredient line inside a recipe, joined with its reference data.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientEntry {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe representation returned by list and detail endpoints.
#[derive(Debug, Serialize)]
pub struct RecipeDetails {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: PublicUser,
    pub ingredients: Vec<RecipeIngredientEntry>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Deserialize)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i32,
}

/// Body of POST /recipes and PATCH /recipes/:id. The image is an opaque
/// string reference; no upload pipeline exists on this side.
#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipePayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::bad_request("Recipe name is required"));
        }
        if self.cooking_time < 1 {
            return Err(ApiError::bad_request("Cooking time must be at least 1"));
        }
        if self.tags.is_empty() {
            return Err(ApiError::bad_request("At least one tag is required"));
        }
        if self.ingredients.is_empty() {
            return Err(ApiError::bad_request("At least one ingredient is required"));
        }
        let mut ids: Vec<i64> = self.ingredients.iter().map(|i| i.id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.ingredients.len() {
            return Err(ApiError::bad_request("Duplicate ingredient in recipe"));
        }
        if self.ingredients.iter().any(|i| i.amount < 1) {
            return Err(ApiError::bad_request("Ingredient amount must be at least 1"));
        }
        Ok(())
    }
}

/// Filters for GET /recipes. Parsed by hand from raw query pairs because
/// `tags` is a repeatable key.
#[derive(Debug, Default, PartialEq)]
pub struct RecipeListQuery {
    pub author: Option<Uuid>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub limit: i64,
    pub offset: i64,
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(format!("invalid boolean value: {other}")),
    }
}

impl RecipeListQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, String> {
        let mut query = RecipeListQuery {
            limit: 20,
            ..Default::default()
        };
        for (key, value) in pairs {
            match key.as_str() {
                "author" => {
                    query.author =
                        Some(value.parse().map_err(|_| "invalid author id".to_string())?);
                }
                "tags" => query.tags.push(value.clone()),
                "is_favorited" => query.is_favorited = parse_flag(value)?,
                "is_in_shopping_cart" => query.is_in_shopping_cart = parse_flag(value)?,
                "limit" => {
                    query.limit = value
                        .parse()
                        .ok()
                        .filter(|v| *v >= 0)
                        .ok_or_else(|| "invalid limit".to_string())?;
                }
                "offset" => {
                    query.offset = value
                        .parse()
                        .ok()
                        .filter(|v| *v >= 0)
                        .ok_or_else(|| "invalid offset".to_string())?;
                }
                _ => {}
            }
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> RecipePayload {
        RecipePayload {
            name: "Pancakes".into(),
            text: "Mix and fry".into(),
            image: None,
            cooking_time: 15,
            tags: vec![1],
            ingredients: vec![
                IngredientAmount { id: 1, amount: 200 },
                IngredientAmount { id: 2, amount: 2 },
            ],
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn rejects_empty_tags_and_ingredients() {
        let mut p = payload();
        p.tags.clear();
        assert!(p.validate().is_err());

        let mut p = payload();
        p.ingredients.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_ingredients() {
        let mut p = payload();
        p.ingredients.push(IngredientAmount { id: 1, amount: 50 });
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let mut p = payload();
        p.ingredients[0].amount = 0;
        assert!(p.validate().is_err());

        let mut p = payload();
        p.cooking_time = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn query_parses_repeated_tags_and_flags() {
        let pairs = vec![
            ("tags".to_string(), "breakfast".to_string()),
            ("tags".to_string(), "dinner".to_string()),
            ("is_favorited".to_string(), "1".to_string()),
            ("limit".to_string(), "5".to_string()),
        ];
        let q = RecipeListQuery::from_pairs(&pairs).unwrap();
        assert_eq!(q.tags, vec!["breakfast", "dinner"]);
        assert!(q.is_favorited);
        assert!(!q.is_in_shopping_cart);
        assert_eq!(q.limit, 5);
        assert_eq!(q.offset, 0);
    }

    #[test]
    fn query_rejects_bad_values() {
        let pairs = vec![("author".to_string(), "not-a-uuid".to_string())];
        assert!(RecipeListQuery::from_pairs(&pairs).is_err());

        let pairs = vec![("is_favorited".to_string(), "maybe".to_string())];
        assert!(RecipeListQuery::from_pairs(&pairs).is_err());
    }

    #[test]
    fn query_rejects_negative_paging() {
        let pairs = vec![("limit".to_string(), "-1".to_string())];
        assert!(RecipeListQuery::from_pairs(&pairs).is_err());

        let pairs = vec![("offset".to_string(), "-5".to_string())];
        assert!(RecipeListQuery::from_pairs(&pairs).is_err());

        let pairs = vec![
            ("limit".to_string(), "0".to_string()),
            ("offset".to_string(), "0".to_string()),
        ];
        assert!(RecipeListQuery::from_pairs(&pairs).is_ok());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let pairs = vec![("page_token".to_string(), "xyz".to_string())];
        let q = RecipeListQuery::from_pairs(&pairs).unwrap();
        assert_eq!(q.limit, 20);
        assert!(q.tags.is_empty());
    }
}
