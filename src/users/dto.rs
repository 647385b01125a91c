use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;
use crate::recipes::dto::RecipeShort;

/// Another user's profile, as seen by the (possibly anonymous) caller.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl PublicUser {
    pub fn from_user(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

/// Profile of a followed author, with a short list of their recipes.
#[derive(Debug, Serialize)]
pub struct SubscriptionUser {
    #[serde(flatten)]
    pub user: PublicUser,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub recipes_limit: Option<i64>,
}

fn default_limit() -> i64 {
    20
}

impl SubscriptionQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.limit < 0 || self.offset < 0 {
            return Err(ApiError::bad_request("limit and offset must not be negative"));
        }
        if self.recipes_limit.is_some_and(|v| v < 0) {
            return Err(ApiError::bad_request("recipes_limit must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<i64>,
}

impl RecipesLimitQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.recipes_limit.is_some_and(|v| v < 0) {
            return Err(ApiError::bad_request("recipes_limit must not be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn subscription_user_flattens_profile_fields() {
        let user = User {
            id: Uuid::new_v4(),
            email: "author@example.com".into(),
            username: "author".into(),
            first_name: "Ann".into(),
            last_name: "Author".into(),
            password_hash: "x".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let sub = SubscriptionUser {
            user: PublicUser::from_user(user, true),
            recipes: vec![],
            recipes_count: 0,
        };
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["username"], "author");
        assert_eq!(json["is_subscribed"], true);
        assert_eq!(json["recipes_count"], 0);
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn subscription_query_rejects_negative_paging() {
        let q = SubscriptionQuery {
            limit: -1,
            offset: 0,
            recipes_limit: None,
        };
        assert!(q.validate().is_err());

        let q = SubscriptionQuery {
            limit: 20,
            offset: 0,
            recipes_limit: Some(-3),
        };
        assert!(q.validate().is_err());

        let q = SubscriptionQuery {
            limit: 20,
            offset: 0,
            recipes_limit: Some(0),
        };
        assert!(q.validate().is_ok());
    }

    #[test]
    fn recipes_limit_query_rejects_negative_value() {
        assert!(RecipesLimitQuery { recipes_limit: Some(-1) }.validate().is_err());
        assert!(RecipesLimitQuery { recipes_limit: None }.validate().is_ok());
    }
}
