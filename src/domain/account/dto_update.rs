use serde::Deserialize;

/// Partial account update; `None` fields are left untouched.
///
/// Role is not a mergeable field; role transitions go through
/// promote/demote only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.password.is_none()
    }
}
