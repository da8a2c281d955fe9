use serde::{Deserialize, Serialize};

/// Account role. Persisted as `"USER"` / `"ADMIN"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

/// Registered operator. Owned by the auth layer; the core only reads
/// `id` and `name` to stamp reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_wire_shape() -> anyhow::Result<()> {
        let user = User::new("2", "John Doe", "john@gmail.com", UserRole::User);
        let json = serde_json::to_value(&user)?;

        assert_eq!(json["role"], "USER");
        assert!(json.get("avatar").is_none());

        let admin: User = serde_json::from_str(
            r#"{"id":"1","name":"Admin User","email":"admin@roadsense.com","role":"ADMIN","avatar":"a.png"}"#,
        )?;
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.avatar.as_deref(), Some("a.png"));
        Ok(())
    }
}
