pub mod member;
pub mod params;
pub mod task;
pub mod team;
pub mod user;

use std::borrow::Cow;

use validator::ValidationError;

use crate::error::{FieldErrors, BLANK, MUST_EXIST};

pub use member::{Member, MemberAttrs, MemberQuery};
pub use params::{ParamKey, Params};
pub use task::{Task, TaskAttrs, TaskQuery};
pub use team::{Team, TeamAttrs};
pub use user::{User, UserAttrs, UserSummary};

/// Rejects empty and whitespace-only strings.
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::Borrowed(BLANK));
        return Err(error);
    }
    Ok(())
}

/// Records `can't be blank` when a required attribute is missing.
pub(crate) fn require<T>(errors: &mut FieldErrors, field: &str, value: &Option<T>) {
    if value.is_none() {
        errors.add(field, BLANK);
    }
}

/// Records `must exist` on the association name when its id is missing.
pub(crate) fn require_association<T>(errors: &mut FieldErrors, association: &str, id: &Option<T>) {
    if id.is_none() {
        errors.add(association, MUST_EXIST);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert!(non_blank("x").is_ok());
        assert!(non_blank("").is_err());
        assert!(non_blank("  \t").is_err());
    }

    #[test]
    fn test_require_helpers() {
        let mut errors = FieldErrors::new();
        require(&mut errors, "title", &None::<String>);
        require(&mut errors, "body", &Some("b".to_string()));
        require_association(&mut errors, "team", &None::<i64>);

        assert_eq!(errors.get("title"), Some(&[BLANK.to_string()][..]));
        assert_eq!(errors.get("body"), None);
        assert_eq!(errors.get("team"), Some(&[MUST_EXIST.to_string()][..]));
    }
}
