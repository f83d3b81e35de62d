//! Internal/external link classification
//!
//! The default rule is plain substring containment of the portal domain in
//! the link. It misreads links that merely mention the domain (for example in
//! a query string) and is kept because existing outputs were produced with it.
//! `DomainMatch::Host` compares the parsed host instead.

use crate::models::ApplyType;
use serde::Deserialize;
use std::str::FromStr;
use url::Url;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DomainMatch {
    /// `link.contains(domain)`
    #[default]
    Substring,
    /// host == domain, or host ends with `.domain`
    Host,
}

impl FromStr for DomainMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(DomainMatch::Substring),
            "host" => Ok(DomainMatch::Host),
            other => Err(format!("unknown domain match mode: {}", other)),
        }
    }
}

/// The portal whose pages are "internal"
#[derive(Clone, Debug)]
pub struct PortalHost {
    domain: String,
    mode: DomainMatch,
}

impl PortalHost {
    pub fn new(domain: impl Into<String>, mode: DomainMatch) -> Self {
        Self {
            domain: domain.into().trim().to_ascii_lowercase(),
            mode,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Whether `link` belongs to the portal
    pub fn is_internal(&self, link: &str) -> bool {
        match self.mode {
            DomainMatch::Substring => link.contains(&self.domain),
            DomainMatch::Host => Url::parse(link)
                .ok()
                .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
                .map(|host| host == self.domain || host.ends_with(&format!(".{}", self.domain)))
                .unwrap_or(false),
        }
    }

    /// `internal` / `external` for a direct link or redirect target
    pub fn link_type(&self, link: &str) -> ApplyType {
        if self.is_internal(link) {
            ApplyType::Internal
        } else {
            ApplyType::External
        }
    }

    /// `internal_popup` / `external_popup` for a popup url
    pub fn popup_type(&self, link: &str) -> ApplyType {
        if self.is_internal(link) {
            ApplyType::InternalPopup
        } else {
            ApplyType::ExternalPopup
        }
    }
}

/// A link that can be followed without clicking (http or https, scheme-qualified)
pub fn is_absolute_link(link: &str) -> bool {
    Url::parse(link)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
