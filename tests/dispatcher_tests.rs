mod common;

use common::http::{exchange, get, get_with_cookie, post_form};
use ctrlrouter::action::{HandlerInstance, ScalarType};
use ctrlrouter::binding::{BindingModel, ValidationRule};
use ctrlrouter::security::Authorize;
use ctrlrouter::server::{Cookie, Identity, InMemorySessionStore, ResponseHead, SessionStore};
use ctrlrouter::views::TemplateViews;
use ctrlrouter::{ActionDescriptor, ActionResult, Controller, ControllerRegistry, Dispatcher};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct HomeController;

impl Controller for HomeController {
    const NAME: &'static str = "HomeController";

    fn actions() -> Vec<ActionDescriptor> {
        vec![ActionDescriptor::new::<Self, _>("Index", |_, _, _| {
            ActionResult::html("home")
        })]
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegisterForm {
    username: String,
    age: u32,
}

impl BindingModel for RegisterForm {
    fn rules() -> Vec<(&'static str, ValidationRule)> {
        vec![("username", ValidationRule::Required)]
    }
}

#[derive(Default)]
struct UserController;

impl Controller for UserController {
    const NAME: &'static str = "UserController";

    fn actions() -> Vec<ActionDescriptor> {
        vec![
            ActionDescriptor::new::<Self, _>("Register", |_, _, mut args| {
                let bound = args.take_model::<RegisterForm>(0).unwrap();
                if bound.is_valid {
                    ActionResult::redirect(format!("/User/Welcome?age={}", bound.model.age))
                } else {
                    ActionResult::html(format!("invalid {}", bound.issues.len()))
                }
            })
            .post()
            .model::<RegisterForm>("form"),
            ActionDescriptor::new::<Self, _>("Login", |_, ctx, args| {
                let name: String = args.get(0).unwrap();
                if let Some(session) = ctx.session() {
                    session.sign_in(Identity::new(name.clone()).with_roles(["admin"]));
                }
                ActionResult::html(format!("signed in {name}"))
            })
            .scalar("name", ScalarType::Text),
            ActionDescriptor::new::<Self, _>("Admin", |_, _, _| ActionResult::html("admin"))
                .authorize(Authorize::roles(["admin"])),
            ActionDescriptor::new::<Self, _>("Profile", |_, ctx, _| {
                let name = ctx.identity().map(|i| i.username().to_string());
                ActionResult::view("User/Profile", &json!({ "name": name }))
            }),
            ActionDescriptor::new::<Self, _>("Theme", |_, ctx, _| {
                ctx.set_cookie(Cookie::new("theme", "dark").path("/"));
                ActionResult::html("theme set")
            }),
        ]
    }
}

#[derive(Default)]
struct GoController;

impl Controller for GoController {
    const NAME: &'static str = "GoController";

    fn actions() -> Vec<ActionDescriptor> {
        vec![ActionDescriptor::new::<Self, _>("To", |_, _, args| {
            ActionResult::redirect(args.get::<String>(0).unwrap_or_else(|| "/".into()))
        })
        .scalar("next", ScalarType::Text)]
    }
}

struct AuditController {
    hits: Arc<AtomicUsize>,
}

impl Controller for AuditController {
    const NAME: &'static str = "AuditController";

    fn actions() -> Vec<ActionDescriptor> {
        vec![ActionDescriptor::new::<Self, _>("Secret", |c, _, _| {
            c.hits.fetch_add(1, Ordering::SeqCst);
            ActionResult::html("secret")
        })
        .authorize(Authorize::any())]
    }
}

fn app() -> Dispatcher {
    let mut registry = ControllerRegistry::new();
    registry
        .register::<HomeController>()
        .register::<UserController>()
        .register::<GoController>();
    Dispatcher::new(registry)
}

fn app_with_store() -> (Dispatcher, Arc<InMemorySessionStore>) {
    let store = Arc::new(InMemorySessionStore::new("CTRL_SESSION"));
    let dispatcher = app().with_session_store(Arc::clone(&store) as Arc<dyn SessionStore>);
    (dispatcher, store)
}

fn session_cookie(head: &ResponseHead) -> Option<String> {
    head.cookies
        .get("CTRL_SESSION")
        .map(|c| format!("CTRL_SESSION={}", c.value()))
}

#[test]
fn test_root_routes_to_default_action() {
    let dispatcher = app();
    let (head, body) = exchange(&dispatcher, &get("/"));
    assert_eq!(head.status, StatusCode::OK);
    assert_eq!(body, "home");

    let (head, body) = exchange(&dispatcher, &get("/?from=mail#top"));
    assert_eq!(head.status, StatusCode::OK);
    assert_eq!(body, "home");
}

#[test]
fn test_method_policy() {
    let dispatcher = app();
    let (head, _) = exchange(
        &dispatcher,
        &post_form("/user/register", "username=ana&age=30"),
    );
    assert_eq!(head.status, StatusCode::SEE_OTHER);
    assert_eq!(head.headers.get("Location"), Some("/User/Welcome?age=30"));

    let (head, _) = exchange(&dispatcher, &get("/User/Register"));
    assert_eq!(head.status, StatusCode::NOT_FOUND);

    let (head, _) = exchange(&dispatcher, &post_form("/Home/Index", "a=1"));
    assert_eq!(head.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_invalid_model_reaches_action() {
    let dispatcher = app();
    let (head, body) = exchange(&dispatcher, &post_form("/User/Register", "age=30"));
    assert_eq!(head.status, StatusCode::OK);
    assert_eq!(body, "invalid 1");
}

#[test]
fn test_unparseable_model_field_keeps_default() {
    let dispatcher = app();
    let (head, _) = exchange(
        &dispatcher,
        &post_form("/User/Register", "username=ana&age=old"),
    );
    assert_eq!(head.status, StatusCode::SEE_OTHER);
    assert_eq!(head.headers.get("Location"), Some("/User/Welcome?age=0"));
}

#[test]
fn test_routing_failures_are_not_found() {
    let dispatcher = app();
    for path in ["/Home", "/Missing/Index", "/Home/Missing", "//"] {
        let (head, _) = exchange(&dispatcher, &get(path));
        assert_eq!(head.status, StatusCode::NOT_FOUND, "path {path}");
    }
}

#[test]
fn test_denied_action_never_runs() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let mut registry = ControllerRegistry::new();
    registry.register_with(move || AuditController {
        hits: Arc::clone(&counter),
    });
    let dispatcher = Dispatcher::new(registry);

    let (head, body) = exchange(&dispatcher, &get("/Audit/Secret"));
    assert_eq!(head.status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Unauthorized"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_signed_in_session_is_authorized() {
    let dispatcher = app();
    let (head, _) = exchange(&dispatcher, &get("/User/Admin"));
    assert_eq!(head.status, StatusCode::UNAUTHORIZED);

    let (head, body) = exchange(&dispatcher, &get("/User/Login?name=ana"));
    assert_eq!(body, "signed in ana");
    let cookie = session_cookie(&head).unwrap();

    let (head, body) = exchange(&dispatcher, &get_with_cookie("/User/Admin", &cookie));
    assert_eq!(head.status, StatusCode::OK);
    assert_eq!(body, "admin");
}

#[test]
fn test_session_cookie_only_for_new_sessions() {
    let dispatcher = app();
    let (head, _) = exchange(&dispatcher, &get("/"));
    let cookie = session_cookie(&head).unwrap();

    let (head, _) = exchange(&dispatcher, &get_with_cookie("/", &cookie));
    assert!(head.cookies.get("CTRL_SESSION").is_none());

    let (head, _) = exchange(&dispatcher, &get_with_cookie("/", "CTRL_SESSION=unknown"));
    assert!(head.cookies.get("CTRL_SESSION").is_some());
}

#[test]
fn test_failed_exchanges_leave_no_sessions() {
    let (dispatcher, store) = app_with_store();
    for _ in 0..200 {
        let (head, _) = exchange(&dispatcher, &get("/No/Such"));
        assert_eq!(head.status, StatusCode::NOT_FOUND);
        assert!(head.cookies.is_empty());
    }
    let (head, _) = exchange(&dispatcher, &get("/User/Register"));
    assert_eq!(head.status, StatusCode::NOT_FOUND);
    assert!(store.is_empty());

    // render failure after the session was attached
    let (head, _) = exchange(&dispatcher, &get("/User/Profile"));
    assert_eq!(head.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(head.cookies.is_empty());
    assert!(store.is_empty());

    let (head, _) = exchange(&dispatcher, &get("/"));
    assert!(head.cookies.get("CTRL_SESSION").is_some());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_redirect_target_cannot_inject_headers() {
    let dispatcher = app().without_sessions();
    let (head, body) = exchange(
        &dispatcher,
        &get("/Go/To?next=/home%0D%0ASet-Cookie:%20admin=1"),
    );
    assert_eq!(head.status, StatusCode::SEE_OTHER);
    assert!(head.cookies.is_empty());
    assert_eq!(head.headers.get("Location"), Some("/homeSet-Cookie: admin=1"));
    assert_eq!(head.headers.get("Content-Length"), Some("0"));
    assert!(body.is_empty());
}

#[test]
fn test_without_sessions() {
    let dispatcher = app().without_sessions();
    let (head, body) = exchange(&dispatcher, &get("/"));
    assert_eq!(body, "home");
    assert!(head.cookies.is_empty());
}

#[test]
fn test_action_cookies_are_emitted() {
    let dispatcher = app().without_sessions();
    let (head, _) = exchange(&dispatcher, &get("/User/Theme"));
    assert_eq!(head.cookies.get("theme").map(Cookie::value), Some("dark"));
}

#[test]
fn test_view_without_renderer_is_server_error() {
    let dispatcher = app();
    let (head, _) = exchange(&dispatcher, &get("/User/Profile"));
    assert_eq!(head.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_view_is_rendered() {
    let views = TemplateViews::in_memory()
        .with_template("User/Profile", "<p>{{ name or \"guest\" }}</p>");
    let dispatcher = app().with_views(Arc::new(views));
    let (head, body) = exchange(&dispatcher, &get("/User/Profile"));
    assert_eq!(head.status, StatusCode::OK);
    assert_eq!(body, "<p>guest</p>");
}

#[test]
fn test_wrong_instance_type_is_server_error() {
    let factory = |name: &str| -> Option<HandlerInstance> {
        (name == "HomeController").then(|| Box::new(7u32) as HandlerInstance)
    };
    let mut registry = ControllerRegistry::new();
    registry.register::<HomeController>();
    let dispatcher = Dispatcher::new(registry).with_factory(Arc::new(factory));
    let (head, _) = exchange(&dispatcher, &get("/"));
    assert_eq!(head.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_malformed_request_is_bad_request() {
    let dispatcher = app();
    let wire = dispatcher.handle_raw(b"GET / HTTP/1.1\r\nAccept: */*\r\n\r\n");
    assert!(wire.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));

    let wire = dispatcher.handle_raw(&[0xff, 0xfe, b'\r', b'\n']);
    assert!(wire.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
}

#[test]
fn test_dispatcher_is_shared_across_threads() {
    let dispatcher = Arc::new(app());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dispatcher = Arc::clone(&dispatcher);
            std::thread::spawn(move || exchange(&dispatcher, &get("/")).1)
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "home");
    }
}
