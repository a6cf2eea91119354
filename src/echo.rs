//! Built-in echo application used by the CLI.

use serde_json::{json, Map, Value};

use crate::action::ActionDescriptor;
use crate::dispatcher::{ActionResult, Controller, ControllerRegistry};
use crate::server::request::{ParamMap, Request};
use crate::server::response::escape_html;

fn params_json(params: &ParamMap) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect::<Map<_, _>>(),
    )
}

/// JSON view of a parsed request.
#[must_use]
pub fn describe_request(req: &Request) -> Value {
    let headers: Vec<Value> = req
        .headers()
        .iter()
        .map(|(name, value)| json!([name, value]))
        .collect();
    let cookies: Map<String, Value> = req
        .cookies()
        .iter()
        .map(|c| (c.name().to_string(), Value::String(c.value().to_string())))
        .collect();
    json!({
        "method": req.method().as_str(),
        "url": req.url(),
        "path": req.path(),
        "query": params_json(req.query()),
        "form": params_json(req.form()),
        "headers": headers,
        "cookies": cookies,
        "body": req.body(),
    })
}

/// Landing page for `/`.
#[derive(Debug, Default)]
pub struct HomeController;

impl Controller for HomeController {
    const NAME: &'static str = "HomeController";

    fn actions() -> Vec<ActionDescriptor> {
        vec![ActionDescriptor::new::<Self, _>("Index", |_, _, _| {
            ActionResult::html("<h1>ctrlrouter</h1><p>Try <code>/Echo/Index?name=value</code>.</p>")
        })]
    }
}

/// Echoes the request back as JSON inside an HTML page.
#[derive(Debug, Default)]
pub struct EchoController;

impl EchoController {
    fn echo(&mut self, req: &Request) -> ActionResult {
        let pretty = serde_json::to_string_pretty(&describe_request(req)).unwrap_or_default();
        ActionResult::html(format!("<pre>{}</pre>", escape_html(&pretty)))
    }
}

impl Controller for EchoController {
    const NAME: &'static str = "EchoController";

    fn actions() -> Vec<ActionDescriptor> {
        vec![
            ActionDescriptor::new::<Self, _>("Index", |c, ctx, _| c.echo(ctx.request()))
                .get()
                .post()
                .put()
                .delete(),
        ]
    }
}

/// Registry holding the echo application.
#[must_use]
pub fn echo_registry() -> ControllerRegistry {
    let mut registry = ControllerRegistry::new();
    registry
        .register::<HomeController>()
        .register::<EchoController>();
    registry
}
