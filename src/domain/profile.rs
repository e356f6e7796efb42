use serde::{Deserialize, Serialize};

/// The profile of the user owning a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub account_github: Option<GithubAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubAccount {
    /// OAuth token, encrypted at rest.
    pub token: String,
}
