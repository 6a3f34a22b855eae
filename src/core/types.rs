use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Code,
    Unsupported,
}

impl From<Option<&str>> for ResponseType {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some("code") => Self::Code,
            _ => Self::Unsupported,
        }
    }
}

#[derive(Debug, Clone, Default, Eq)]
pub struct Scope(HashSet<String>);

impl Scope {
    pub fn from_delimited_parts(parts: &str) -> Self {
        let parts = parts
            .split(' ')
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();
        Self(parts)
    }

    pub fn as_joined(&self) -> String {
        let mut parts = self.as_parts();
        parts.sort();
        parts.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn as_parts(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    pub fn contains_all(&self, other: &Scope) -> bool {
        self.0.is_superset(&other.0)
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parts = String::deserialize(deserializer)?;
        Ok(Self::from_delimited_parts(&parts))
    }
}

impl Serialize for Scope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let joined = self.as_joined();
        serializer.serialize_str(&joined)
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct RedirectUri(pub String);

impl AsRef<str> for RedirectUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct AuthCode(pub String);

impl AsRef<str> for AuthCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashedAuthCode(pub String);

impl From<String> for HashedAuthCode {
    fn from(from: String) -> Self {
        Self(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_ignores_repeated_and_empty_parts() {
        let scope = Scope::from_delimited_parts(" scope2  scope1 scope2 ");
        assert_eq!(scope.as_joined(), "scope1 scope2");
        assert!(Scope::from_delimited_parts("").is_empty());
    }

    #[test]
    fn scope_subset_checks() {
        let registered = Scope::from_delimited_parts("scope1 scope2");
        assert!(registered.contains_all(&Scope::from_delimited_parts("scope2")));
        assert!(registered.contains_all(&Scope::default()));
        assert!(!registered.contains_all(&Scope::from_delimited_parts("scope2 scope3")));
    }

    #[test]
    fn only_the_code_response_type_is_supported() {
        assert_eq!(ResponseType::from(Some("code")), ResponseType::Code);
        assert_eq!(ResponseType::from(Some("token")), ResponseType::Unsupported);
        assert_eq!(ResponseType::from(Some("Code")), ResponseType::Unsupported);
        assert_eq!(ResponseType::from(None), ResponseType::Unsupported);
    }
}
