use serde::{Deserialize, Serialize};

/// The acting user of a request, as supplied by the authentication layer
///
/// Anonymous requests carry no `User` at all (`Option<User>::None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub groups: Vec<String>,
}

impl User {
    /// An active, unprivileged user
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            groups: Vec::new(),
        }
    }

    /// An active staff superuser
    pub fn staff(id: u64, username: impl Into<String>) -> Self {
        Self {
            is_staff: true,
            is_superuser: true,
            ..Self::new(id, username)
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}
