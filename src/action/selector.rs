use http::Method;
use tracing::debug;

use super::core::ActionDescriptor;

/// Picks the action serving a request among a handler's declared actions.
pub struct ActionSelector;

impl ActionSelector {
    /// First action, in declaration order, whose name matches `action`
    /// case-insensitively and whose method policy accepts `method`.
    ///
    /// An action without declared methods accepts GET only.
    #[must_use]
    pub fn select<'a>(
        actions: &'a [ActionDescriptor],
        action: &str,
        method: &Method,
    ) -> Option<&'a ActionDescriptor> {
        let mut candidates = 0usize;
        let selected = actions
            .iter()
            .filter(|a| a.name().eq_ignore_ascii_case(action))
            .inspect(|_| candidates += 1)
            .find(|a| a.accepts(method));
        debug!(
            action = %action,
            method = %method,
            candidates,
            matched = selected.is_some(),
            "Action selection"
        );
        selected
    }
}
