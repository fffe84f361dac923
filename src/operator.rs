use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Full administrative access: delete submissions, change screen options.
    ManageOptions,
    /// View the submissions screen.
    Read,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageOptions => "manage_options",
            Self::Read => "read",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorConfig {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// The authenticated caller of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub name: String,
    capabilities: Vec<Capability>,
}

impl Operator {
    pub fn new(name: impl Into<String>, capabilities: Vec<Capability>) -> Self {
        Self {
            name: name.into(),
            capabilities,
        }
    }

    /// The operator the command line runs as.
    pub fn local() -> Self {
        Self::new("local", vec![Capability::ManageOptions, Capability::Read])
    }

    /// Session key used to scope confirmation tokens and queued notices.
    pub fn session(&self) -> &str {
        &self.name
    }

    pub fn can(&self, capability: Capability) -> bool {
        // manage_options implies everything else
        self.capabilities.contains(&capability)
            || self.capabilities.contains(&Capability::ManageOptions)
    }

    pub fn require(&self, capability: Capability, what: &'static str) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            tracing::warn!(
                "Operator '{}' lacks capability '{}'",
                self.name,
                capability.as_str()
            );
            Err(AppError::Forbidden(what))
        }
    }
}

/// Resolve an operator from a presented key.
pub fn authenticate(
    operators: &[OperatorConfig],
    key: Option<&str>,
) -> Result<Operator, AppError> {
    let key = key.filter(|k| !k.is_empty()).ok_or(AppError::Unauthenticated)?;
    operators
        .iter()
        .find(|o| o.key == key)
        .map(|o| Operator::new(o.name.clone(), o.capabilities.clone()))
        .ok_or(AppError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operators() -> Vec<OperatorConfig> {
        vec![
            OperatorConfig {
                name: "admin".into(),
                key: "k-admin".into(),
                capabilities: vec![Capability::ManageOptions],
            },
            OperatorConfig {
                name: "viewer".into(),
                key: "k-viewer".into(),
                capabilities: vec![Capability::Read],
            },
        ]
    }

    #[test]
    fn test_authenticate() {
        let ops = operators();
        let admin = authenticate(&ops, Some("k-admin")).unwrap();
        assert_eq!(admin.name, "admin");
        assert!(admin.can(Capability::Read));
        assert!(admin.can(Capability::ManageOptions));

        let viewer = authenticate(&ops, Some("k-viewer")).unwrap();
        assert!(viewer.can(Capability::Read));
        assert!(!viewer.can(Capability::ManageOptions));

        assert!(matches!(
            authenticate(&ops, Some("nope")),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            authenticate(&ops, Some("")),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            authenticate(&ops, None),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn test_require() {
        let viewer = Operator::new("viewer", vec![Capability::Read]);
        let err = viewer
            .require(Capability::ManageOptions, "delete submissions")
            .unwrap_err();
        assert!(err.is_fatal_rejection());
        assert!(Operator::local().require(Capability::ManageOptions, "x").is_ok());
    }
}
