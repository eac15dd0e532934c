//! Environment context
//!
//! [`EnvironmentContext`] is everything synthesis knows about where the stack is going:
//! the environment suffix woven into names, the optional account and region, and the
//! tags every resource receives. It is built once by the caller (usually
//! [`Settings::build_context`](super::Settings::build_context)) and passed explicitly into
//! [`Stack::new`](crate::stack::Stack::new); there is no process-wide registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Partition used in every ARN.
pub const PARTITION: &str = "aws";

/// Placeholder written into ARNs when the account is unknown.
pub const ACCOUNT_PLACEHOLDER: &str = "${AWS::AccountId}";

/// Placeholder written into ARNs when the region is unknown.
pub const REGION_PLACEHOLDER: &str = "${AWS::Region}";

/// Immutable description of the target environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentContext {
    suffix: String,
    account: Option<String>,
    region: Option<String>,
    global_tags: BTreeMap<String, String>,
}

impl EnvironmentContext {
    /// Suffix used when none is supplied.
    pub const DEFAULT_SUFFIX: &'static str = "dev";

    /// Context without account or region. An empty suffix falls back to
    /// [`DEFAULT_SUFFIX`](Self::DEFAULT_SUFFIX).
    pub fn new(suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        let suffix = if suffix.trim().is_empty() {
            Self::DEFAULT_SUFFIX.to_string()
        } else {
            suffix.trim().to_string()
        };

        Self {
            suffix,
            account: None,
            region: None,
            global_tags: BTreeMap::new(),
        }
    }

    /// Pin account and region.
    #[must_use]
    pub fn with_environment(
        mut self,
        account: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        self.account = Some(account.into());
        self.region = Some(region.into());
        self
    }

    /// Pin account and region only when both are present and non-empty.
    ///
    /// A lone account or a lone region is dropped with a warning; names and ARNs then
    /// fall back to their unqualified forms.
    #[must_use]
    pub fn with_optional_environment(
        self,
        account: Option<String>,
        region: Option<String>,
    ) -> Self {
        let account = account.filter(|a| !a.trim().is_empty());
        let region = region.filter(|r| !r.trim().is_empty());

        match (account, region) {
            (Some(account), Some(region)) => self.with_environment(account, region),
            (None, None) => self,
            (account, region) => {
                tracing::warn!(
                    "Ignoring partial environment (account: {:?}, region: {:?}); both are required",
                    account,
                    region
                );
                self
            }
        }
    }

    /// Add a global tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.global_tags.insert(key.into(), value.into());
        self
    }

    /// Add several global tags. Later entries replace earlier ones.
    #[must_use]
    pub fn with_tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.global_tags.extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Environment suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Account id, when pinned.
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Region, when pinned.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Tags applied to every resource.
    #[must_use]
    pub const fn global_tags(&self) -> &BTreeMap<String, String> {
        &self.global_tags
    }

    /// Account id or its pseudo-parameter placeholder.
    #[must_use]
    pub fn account_or_placeholder(&self) -> &str {
        self.account().unwrap_or(ACCOUNT_PLACEHOLDER)
    }

    /// Region or its pseudo-parameter placeholder.
    #[must_use]
    pub fn region_or_placeholder(&self) -> &str {
        self.region().unwrap_or(REGION_PLACEHOLDER)
    }
}

impl Default for EnvironmentContext {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUFFIX)
    }
}
