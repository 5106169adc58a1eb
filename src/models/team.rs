use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::params::double_option;
use super::{non_blank, require, ParamKey};
use crate::error::FieldErrors;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes accepted when creating or updating a team.
///
/// `owner_id` distinguishes "not given" (`None`) from an explicit `null` (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TeamAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        custom = "non_blank",
        length(max = 255, message = "is too long (maximum is 255 characters)")
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<Option<i64>>,
}

impl ParamKey for TeamAttrs {
    const KEY: &'static str = "team";
}

impl TeamAttrs {
    pub fn check(&self) -> FieldErrors {
        self.validate().err().map(FieldErrors::from).unwrap_or_default()
    }

    pub fn check_for_create(&self) -> FieldErrors {
        let mut errors = self.check();
        require(&mut errors, "name", &self.name);
        errors
    }

    /// The owner this change would leave the team with.
    pub fn resolved_owner(&self, current: Option<i64>) -> Option<i64> {
        match self.owner_id {
            Some(owner) => owner,
            None => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BLANK;
    use serde_json::json;

    #[test]
    fn test_team_name_required() {
        let errors = TeamAttrs::default().check_for_create();
        assert_eq!(errors.get("name"), Some(&[BLANK.to_string()][..]));

        let blank = TeamAttrs {
            name: Some("   ".into()),
            owner_id: None,
        };
        assert_eq!(blank.check().get("name"), Some(&[BLANK.to_string()][..]));
    }

    #[test]
    fn test_resolved_owner() {
        let keep: TeamAttrs = serde_json::from_value(json!({ "name": "x" })).unwrap();
        assert_eq!(keep.resolved_owner(Some(4)), Some(4));

        let clear: TeamAttrs = serde_json::from_value(json!({ "owner_id": null })).unwrap();
        assert_eq!(clear.resolved_owner(Some(4)), None);

        let change: TeamAttrs = serde_json::from_value(json!({ "owner_id": 9 })).unwrap();
        assert_eq!(change.resolved_owner(Some(4)), Some(9));
    }
}
