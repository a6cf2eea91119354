use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::binding::ModelState;
use crate::server::cookies::Cookie;
use crate::server::request::Request;
use crate::server::session::{Identity, Session};

/// Content of a successful view result.
#[derive(Debug, Clone, PartialEq)]
pub enum Viewable {
    /// Literal HTML
    Html(String),
    /// A named view rendered by the view collaborator
    Template { name: String, model: Value },
}

/// Abstract outcome of an action, rendered exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    View(Viewable),
    /// Redirect to a location
    Redirect(String),
    Unauthorized,
}

impl ActionResult {
    pub fn html(html: impl Into<String>) -> Self {
        ActionResult::View(Viewable::Html(html.into()))
    }

    /// A named view with a serializable model. A model that fails to
    /// serialize is rendered with a `null` model.
    pub fn view<M: Serialize>(name: impl Into<String>, model: &M) -> Self {
        ActionResult::View(Viewable::Template {
            name: name.into(),
            model: serde_json::to_value(model).unwrap_or(Value::Null),
        })
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        ActionResult::Redirect(location.into())
    }

    /// Short variant name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ActionResult::View(Viewable::Html(_)) => "html",
            ActionResult::View(Viewable::Template { .. }) => "view",
            ActionResult::Redirect(_) => "redirect",
            ActionResult::Unauthorized => "unauthorized",
        }
    }
}

/// Per-exchange state handed to an action body.
#[derive(Debug)]
pub struct ActionContext {
    request: Request,
    model_state: ModelState,
    cookies: Vec<Cookie>,
}

impl ActionContext {
    pub fn new(request: Request, model_state: ModelState) -> Self {
        Self {
            request,
            model_state,
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    #[must_use]
    pub fn session(&self) -> Option<&Arc<Session>> {
        self.request.session()
    }

    /// Signed-in identity of the session.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.session().and_then(|s| s.identity())
    }

    /// Validation outcome of the models bound for this action.
    #[must_use]
    pub fn model_state(&self) -> &ModelState {
        &self.model_state
    }

    /// Queue a cookie to be set on the response.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }

    pub(crate) fn take_cookies(&mut self) -> Vec<Cookie> {
        std::mem::take(&mut self.cookies)
    }
}
