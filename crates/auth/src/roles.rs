use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier carried in tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const REVIEWER: &'static str = "reviewer";
    pub const RECRUITER: &'static str = "recruiter";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    pub fn reviewer() -> Self {
        Self::new(Self::REVIEWER)
    }

    pub fn recruiter() -> Self {
        Self::new(Self::RECRUITER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Case-insensitive membership check.
pub fn has_any_role(granted: &[Role], wanted: &[&str]) -> bool {
    granted
        .iter()
        .any(|r| wanted.iter().any(|w| r.as_str().eq_ignore_ascii_case(w)))
}
