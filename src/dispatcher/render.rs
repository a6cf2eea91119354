use http::StatusCode;
use std::sync::Arc;
use tracing::{debug, error};

use super::result::{ActionResult, Viewable};
use crate::error::DispatchError;
use crate::server::response::Response;
use crate::views::ViewRenderer;

/// Body of the `401 Unauthorized` page.
const UNAUTHORIZED_HTML: &str = "<!DOCTYPE html><html><head><title>401 Unauthorized</title></head>\
<body><h1>Unauthorized</h1><p>You are not allowed to access this resource.</p></body></html>";

/// Turns an [`ActionResult`] into a concrete [`Response`].
#[derive(Clone, Default)]
pub struct ResultRenderer {
    views: Option<Arc<dyn ViewRenderer>>,
}

impl ResultRenderer {
    #[must_use]
    pub fn new(views: Option<Arc<dyn ViewRenderer>>) -> Self {
        Self { views }
    }

    #[must_use]
    pub fn has_views(&self) -> bool {
        self.views.is_some()
    }

    /// Render a result.
    ///
    /// View results give `200 OK` HTML, redirects `303 See Other` with a
    /// `Location` header, and Unauthorized a `401` page.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Render`] when a named view has no renderer or the
    /// renderer fails.
    pub fn render(&self, result: ActionResult) -> Result<Response, DispatchError> {
        let kind = result.kind();
        let response = match result {
            ActionResult::View(Viewable::Html(html)) => Response::html(StatusCode::OK, html),
            ActionResult::View(Viewable::Template { name, model }) => {
                let views = self.views.as_ref().ok_or_else(|| {
                    error!(view = %name, "View result without a view renderer");
                    DispatchError::Render {
                        message: format!("no view renderer configured for view '{name}'"),
                    }
                })?;
                let html = views.render_view(&name, &model).map_err(|e| {
                    error!(view = %name, error = %e, "View rendering failed");
                    DispatchError::Render {
                        message: e.to_string(),
                    }
                })?;
                Response::html(StatusCode::OK, html)
            }
            ActionResult::Redirect(location) => Response::redirect(&location),
            ActionResult::Unauthorized => Response::html(StatusCode::UNAUTHORIZED, UNAUTHORIZED_HTML),
        };
        debug!(
            result = kind,
            status = response.status().as_u16(),
            body_size_bytes = response.body().len(),
            "Result rendered"
        );
        Ok(response)
    }
}
