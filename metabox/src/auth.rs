//! Authorization and anti-forgery collaborators
//!
//! Both are host concerns. The panel only asks yes/no questions through these
//! traits before touching any field.

use std::collections::HashSet;

use crate::store::PostId;

/// The acting user for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub id: u64,
    capabilities: HashSet<String>,
}

impl Principal {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            capabilities: HashSet::new(),
        }
    }

    /// A principal with no id and no capabilities.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Decides whether a principal may act on a post.
pub trait Authorizer: Send + Sync {
    fn can(&self, principal: &Principal, capability: &str, post_id: PostId) -> bool;
}

/// Grants access when the principal carries the capability, for any post.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityAuthorizer;

impl Authorizer for CapabilityAuthorizer {
    fn can(&self, principal: &Principal, capability: &str, _post_id: PostId) -> bool {
        principal.has_capability(capability)
    }
}

/// Issues and verifies anti-forgery tokens.
pub trait NonceProvider: Send + Sync {
    /// Token to embed in the rendered panel for `action`.
    fn issue(&self, action: &str) -> String;

    /// Whether `token` is valid for `action`.
    fn verify(&self, token: &str, action: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_authorizer_checks_principal() {
        let editor = Principal::new(1).with_capability("edit_post");
        let guest = Principal::anonymous();
        let auth = CapabilityAuthorizer;

        assert!(auth.can(&editor, "edit_post", PostId(9)));
        assert!(!auth.can(&editor, "delete_post", PostId(9)));
        assert!(!auth.can(&guest, "edit_post", PostId(9)));
    }
}
