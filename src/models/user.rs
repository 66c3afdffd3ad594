use serde::{Deserialize, Serialize};

pub const DEMO_USER_ID: &str = "demo-user-1";
pub const DEMO_USER_NAME: &str = "Demo User";
pub const DEMO_USER_EMAIL: &str = "demo@example.com";
pub const DEMO_ORGANIZATION_ID: &str = "org-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
    pub organization_id: String,
}

impl SessionUser {
    /// The fixed identity handed out in demo and development setups.
    pub fn demo() -> Self {
        Self {
            id: DEMO_USER_ID.into(),
            name: Some(DEMO_USER_NAME.into()),
            email: DEMO_USER_EMAIL.into(),
            image: None,
            organization_id: DEMO_ORGANIZATION_ID.into(),
        }
    }
}
