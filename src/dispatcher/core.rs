use http::StatusCode;
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

use super::registry::{ControllerRegistry, HandlerFactory};
use super::render::ResultRenderer;
use super::result::{ActionContext, ActionResult};
use crate::action::{ActionDescriptor, ActionSelector};
use crate::binding::ParameterBinder;
use crate::config::{AppConfig, RoutingConfig, SessionConfig};
use crate::error::DispatchError;
use crate::ids::ExchangeId;
use crate::router::RouteResolver;
use crate::security::{Authorizer, Decision};
use crate::server::cookies::Cookie;
use crate::server::request::{parse_request_bytes, Request};
use crate::server::response::{write_response, Response};
use crate::server::session::{InMemorySessionStore, SessionStore};
use crate::views::{TemplateViews, ViewRenderer};

/// Runs one exchange through
/// ResolveRoute → CreateInstance → SelectAction → Authorize → Bind → Invoke → Render.
///
/// Holds only read-only configuration; every exchange owns its own
/// request and response, so one dispatcher can serve any number of threads.
pub struct Dispatcher {
    registry: Arc<ControllerRegistry>,
    factory: Arc<dyn HandlerFactory>,
    resolver: RouteResolver,
    routing: RoutingConfig,
    renderer: ResultRenderer,
    sessions: Option<Arc<dyn SessionStore>>,
    session_config: SessionConfig,
}

impl Dispatcher {
    /// Dispatcher with default configuration, no views and in-memory sessions.
    ///
    /// The registry doubles as the handler factory.
    #[must_use]
    pub fn new(registry: ControllerRegistry) -> Self {
        Self::from_config(registry, &AppConfig::default())
    }

    /// Dispatcher configured from `config`: routing defaults, session cookie
    /// settings and, when `views.directory` is set, file-based views.
    #[must_use]
    pub fn from_config(registry: ControllerRegistry, config: &AppConfig) -> Self {
        let registry = Arc::new(registry);
        let factory: Arc<dyn HandlerFactory> = Arc::clone(&registry) as Arc<dyn HandlerFactory>;
        let views = config
            .views
            .directory
            .as_ref()
            .map(|dir| Arc::new(TemplateViews::new(dir.clone())) as Arc<dyn ViewRenderer>);
        let sessions = config.session.enabled.then(|| {
            Arc::new(
                InMemorySessionStore::new(config.session.cookie_name.clone())
                    .with_ttl_days(config.session.cookie_expiry_days),
            ) as Arc<dyn SessionStore>
        });
        info!(
            handlers = registry.len(),
            views = views.is_some(),
            sessions = sessions.is_some(),
            default_route = %format_args!(
                "{}/{}",
                config.routing.default_handler, config.routing.default_action
            ),
            "Dispatcher configured"
        );
        Self {
            registry,
            factory,
            resolver: RouteResolver::new(&config.routing),
            routing: config.routing.clone(),
            renderer: ResultRenderer::new(views),
            sessions,
            session_config: config.session.clone(),
        }
    }

    /// Use an external factory to create handler instances.
    #[must_use]
    pub fn with_factory(mut self, factory: Arc<dyn HandlerFactory>) -> Self {
        self.factory = factory;
        self
    }

    #[must_use]
    pub fn with_views(mut self, views: Arc<dyn ViewRenderer>) -> Self {
        self.renderer = ResultRenderer::new(Some(views));
        self
    }

    #[must_use]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    #[must_use]
    pub fn without_sessions(mut self) -> Self {
        self.sessions = None;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    #[must_use]
    pub fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    /// Attach the request's session. Returns the cookie to set when the
    /// session was created for this exchange.
    fn attach_session(&self, request: &mut Request) -> Option<Cookie> {
        let store = self.sessions.as_ref()?;
        let session = store.get_session(request);
        let known = request
            .cookies()
            .get(store.cookie_name())
            .is_some_and(|c| c.value() == session.id());
        let cookie = (!known).then(|| {
            Cookie::with_expiry_days(
                store.cookie_name(),
                session.id(),
                self.session_config.cookie_expiry_days,
            )
            .path("/")
            .http_only(true)
        });
        debug!(session_id = %session.id(), new_session = !known, "Session attached");
        request.attach_session(session);
        cookie
    }

    /// Run the state machine for one request.
    ///
    /// The session is attached once an action has been selected, so requests
    /// that fail routing never create one. A session created for an exchange
    /// that then fails is discarded along with its unsent cookie.
    ///
    /// # Errors
    ///
    /// Routing failures ([`DispatchError::RouteNotFound`],
    /// [`DispatchError::HandlerNotFound`], [`DispatchError::ActionNotFound`])
    /// and fatal ones ([`DispatchError::Configuration`],
    /// [`DispatchError::Render`]). Authorization denial is not an error.
    pub fn dispatch(&self, mut request: Request) -> Result<Response, DispatchError> {
        let route = self.resolver.resolve(request.path())?;
        let type_name = self.routing.type_name(&route.handler);

        let mut instance = self.factory.create_instance(&type_name).ok_or_else(|| {
            warn!(handler = %type_name, "Handler not found");
            DispatchError::HandlerNotFound {
                handler: type_name.clone(),
            }
        })?;

        let action = self
            .registry
            .actions(&type_name)
            .and_then(|actions| ActionSelector::select(actions, &route.action, request.method()))
            .ok_or_else(|| {
                warn!(
                    handler = %type_name,
                    action = %route.action,
                    method = %request.method(),
                    "No action accepts this request"
                );
                DispatchError::ActionNotFound {
                    handler: type_name.clone(),
                    action: route.action.clone(),
                    method: request.method().to_string(),
                }
            })?;

        let session_cookie = self.attach_session(&mut request);
        match self.run_action(action, &type_name, instance.as_mut(), request) {
            Ok(mut response) => {
                if let Some(cookie) = session_cookie {
                    response.add_cookie(cookie);
                }
                Ok(response)
            }
            Err(e) => {
                if let (Some(store), Some(cookie)) = (&self.sessions, &session_cookie) {
                    store.discard(cookie.value());
                }
                Err(e)
            }
        }
    }

    /// Authorize → Bind → Invoke → Render for the selected action.
    fn run_action(
        &self,
        action: &ActionDescriptor,
        type_name: &str,
        instance: &mut (dyn Any + Send),
        request: Request,
    ) -> Result<Response, DispatchError> {
        let identity = request.session().and_then(|s| s.identity());
        let (result, cookies) = match Authorizer::authorize(identity.as_ref(), type_name, action) {
            Decision::Deny => (ActionResult::Unauthorized, Vec::new()),
            Decision::Allow => {
                let args = ParameterBinder::bind(action, &request);
                let mut ctx = ActionContext::new(request, args.model_state().clone());
                info!(
                    handler = %type_name,
                    action = %action.name(),
                    arguments = args.len(),
                    "Invoking action"
                );
                let result = action.invoke(instance, &mut ctx, args).map_err(|e| {
                    error!(handler = %type_name, action = %action.name(), error = %e, "Action invocation failed");
                    e
                })?;
                (result, ctx.take_cookies())
            }
        };

        let mut response = self.renderer.render(result)?;
        for cookie in cookies {
            response.add_cookie(cookie);
        }
        Ok(response)
    }

    /// Run one exchange, answering every failure with a complete response.
    #[must_use]
    pub fn handle(&self, request: Request) -> Response {
        let exchange_id = ExchangeId::for_request(&request);
        let span = info_span!(
            "exchange",
            exchange_id = %exchange_id,
            method = %request.method(),
            path = %request.path()
        );
        let _guard = span.enter();
        let start = Instant::now();

        let response = match self.dispatch(request) {
            Ok(response) => response,
            Err(e) if e.is_fatal() => {
                error!(error = %e, "Exchange failed");
                Response::error(e.status(), &e.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Exchange rejected");
                Response::error(e.status(), &e.to_string())
            }
        };

        info!(
            status = response.status().as_u16(),
            duration_us = start.elapsed().as_micros(),
            "Exchange completed"
        );
        response
    }

    /// Parse raw bytes, handle the request and serialize the response.
    ///
    /// A malformed request is answered with `400 Bad Request`.
    #[must_use]
    pub fn handle_raw(&self, raw: &[u8]) -> Vec<u8> {
        let response = match parse_request_bytes(raw) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!(error = %e, bytes = raw.len(), "Malformed request rejected");
                Response::error(StatusCode::BAD_REQUEST, &e.to_string())
            }
        };
        write_response(&response)
    }
}
