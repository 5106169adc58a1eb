use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{require_association, ParamKey};
use crate::error::FieldErrors;

/// Links a user to a team. The (team_id, user_id) pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: i64,
    pub user_id: i64,
    pub team_id: i64,
    pub role: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes accepted for members. Updates only ever read `role`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MemberAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 32767, message = "must be between 0 and 32767"))]
    pub role: Option<i32>,
}

impl ParamKey for MemberAttrs {
    const KEY: &'static str = "member";
}

impl MemberAttrs {
    pub fn check(&self) -> FieldErrors {
        self.validate().err().map(FieldErrors::from).unwrap_or_default()
    }

    pub fn check_for_create(&self) -> FieldErrors {
        let mut errors = self.check();
        require_association(&mut errors, "user", &self.user_id);
        require_association(&mut errors, "team", &self.team_id);
        errors
    }
}

/// Optional filters for listing members. `team_id` takes precedence over `user_id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberQuery {
    pub team_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl MemberQuery {
    pub fn for_team(team_id: i64) -> Self {
        Self {
            team_id: Some(team_id),
            user_id: None,
        }
    }

    pub fn for_user(user_id: i64) -> Self {
        Self {
            team_id: None,
            user_id: Some(user_id),
        }
    }

    pub fn matches(&self, member: &Member) -> bool {
        match (self.team_id, self.user_id) {
            (Some(team_id), _) => member.team_id == team_id,
            (None, Some(user_id)) => member.user_id == user_id,
            (None, None) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MUST_EXIST;

    fn member(team_id: i64, user_id: i64) -> Member {
        let now = Utc::now();
        Member {
            id: 1,
            user_id,
            team_id,
            role: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_member_attrs_validation() {
        let errors = MemberAttrs::default().check_for_create();
        assert_eq!(errors.get("user"), Some(&[MUST_EXIST.to_string()][..]));
        assert_eq!(errors.get("team"), Some(&[MUST_EXIST.to_string()][..]));

        let negative = MemberAttrs {
            user_id: Some(1),
            team_id: Some(1),
            role: Some(-1),
        };
        assert!(negative.check_for_create().get("role").is_some());
    }

    #[test]
    fn test_query_matching() {
        assert!(MemberQuery::default().matches(&member(1, 2)));
        assert!(MemberQuery::for_team(1).matches(&member(1, 2)));
        assert!(!MemberQuery::for_team(3).matches(&member(1, 2)));
        assert!(MemberQuery::for_user(2).matches(&member(1, 2)));

        // Team filter wins when both are given.
        let both = MemberQuery {
            team_id: Some(1),
            user_id: Some(99),
        };
        assert!(both.matches(&member(1, 2)));
    }
}
