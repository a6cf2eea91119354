//! # Security Module
//!
//! Declarative, per-action authorization.
//!
//! Actions carry zero or more [`AuthorizationPolicy`] values attached at
//! registration time. Before an action runs, the [`Authorizer`] asks each of
//! them whether the current [`Identity`] may proceed:
//!
//! 1. An action without policies is always allowed
//! 2. Otherwise every attached policy must accept
//! 3. On denial the dispatcher renders an Unauthorized result and the action
//!    body never runs
//!
//! ## Policies
//!
//! [`Authorize`] accepts any signed-in identity, optionally restricted to a
//! set of roles:
//!
//! ```rust
//! use ctrlrouter::security::Authorize;
//!
//! let signed_in = Authorize::any();
//! let admins = Authorize::roles(["Admin"]);
//! ```
//!
//! Any closure over the optional identity is a policy as well:
//!
//! ```rust
//! use ctrlrouter::server::Identity;
//!
//! let only_ana = |who: Option<&Identity>| who.is_some_and(|i| i.username() == "ana");
//! ```

use tracing::{debug, info};

use crate::action::ActionDescriptor;
use crate::server::session::Identity;

/// What a policy gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationContext<'a> {
    /// Signed-in identity of the session, if any
    pub identity: Option<&'a Identity>,
    /// Handler type name (e.g. `UserController`)
    pub handler: &'a str,
    /// Selected action name
    pub action: &'a str,
}

/// Predicate deciding whether an action may run.
pub trait AuthorizationPolicy: Send + Sync {
    /// `true` to allow the action.
    fn allows(&self, ctx: &AuthorizationContext<'_>) -> bool;
}

impl<F> AuthorizationPolicy for F
where
    F: Fn(Option<&Identity>) -> bool + Send + Sync,
{
    fn allows(&self, ctx: &AuthorizationContext<'_>) -> bool {
        self(ctx.identity)
    }
}

/// Requires a signed-in identity; with roles, one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authorize {
    roles: Vec<String>,
}

impl Authorize {
    /// Any signed-in identity.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// A signed-in identity holding at least one of `roles`.
    pub fn roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl AuthorizationPolicy for Authorize {
    fn allows(&self, ctx: &AuthorizationContext<'_>) -> bool {
        match ctx.identity {
            None => false,
            Some(_) if self.roles.is_empty() => true,
            Some(identity) => self.roles.iter().any(|r| identity.is_in_role(r)),
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Evaluates an action's authorization policies.
pub struct Authorizer;

impl Authorizer {
    #[must_use]
    pub fn authorize(
        identity: Option<&Identity>,
        handler: &str,
        action: &ActionDescriptor,
    ) -> Decision {
        let policies = action.authorization();
        if policies.is_empty() {
            return Decision::Allow;
        }
        let ctx = AuthorizationContext {
            identity,
            handler,
            action: action.name(),
        };
        if policies.iter().all(|p| p.allows(&ctx)) {
            debug!(
                handler = %handler,
                action = %action.name(),
                policies = policies.len(),
                "Authorization granted"
            );
            Decision::Allow
        } else {
            info!(
                handler = %handler,
                action = %action.name(),
                user = identity.map(Identity::username).unwrap_or("<anonymous>"),
                "Authorization denied"
            );
            Decision::Deny
        }
    }
}
