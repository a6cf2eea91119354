//! # ctrlrouter
//!
//! **ctrlrouter** is a synchronous HTTP/1.1 request parser and MVC-style
//! controller router. A listener hands it the raw bytes of one request and
//! gets back the raw bytes of one response.
//!
//! ## Architecture
//!
//! - **[`server`]** - request parsing, headers, cookies, sessions and response serialization
//! - **[`router`]** - `/{Handler}/{Action}` path resolution with a configurable default route
//! - **[`action`]** - action descriptors, parameter metadata and method-based selection
//! - **[`binding`]** - scalar and model parameter binding with validation rules
//! - **[`security`]** - declarative per-action authorization policies
//! - **[`dispatcher`]** - the per-exchange state machine and result rendering
//! - **[`views`]** - named view templates rendered with minijinja
//! - **[`config`]** / **[`logging`]** - YAML configuration and tracing setup
//!
//! ### Request Flow
//!
//! ```text
//! raw bytes ──parse──▶ Request ──attach session──▶ resolve route
//!     ──▶ create handler ──▶ select action ──▶ authorize
//!     ──▶ bind parameters ──▶ invoke ──▶ render ──▶ raw bytes
//! ```
//!
//! Every exchange is independent: the dispatcher only holds read-only
//! configuration, so one instance can be shared by any number of threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use ctrlrouter::{ActionDescriptor, ActionResult, Controller, ControllerRegistry, Dispatcher};
//!
//! #[derive(Default)]
//! struct GreetController;
//!
//! impl Controller for GreetController {
//!     const NAME: &'static str = "GreetController";
//!
//!     fn actions() -> Vec<ActionDescriptor> {
//!         vec![ActionDescriptor::new::<Self, _>("Hello", |_, _, args| {
//!             let name: String = args.get_named("name").unwrap_or_else(|| "world".into());
//!             ActionResult::html(format!("Hello, {name}"))
//!         })
//!         .scalar("name", ctrlrouter::action::ScalarType::Text)]
//!     }
//! }
//!
//! let mut registry = ControllerRegistry::new();
//! registry.register::<GreetController>();
//! let dispatcher = Dispatcher::new(registry);
//!
//! let wire = dispatcher.handle_raw(b"GET /Greet/Hello?name=ana HTTP/1.1\r\nHost: h\r\n\r\n");
//! let text = String::from_utf8(wire).unwrap();
//! assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
//! assert!(text.ends_with("Hello, ana"));
//! ```
//!
//! ## Error Handling
//!
//! Malformed requests are answered with `400`, routing failures with `404`
//! and configuration or render failures with `500`. A denied authorization
//! renders `401 Unauthorized` without running the action. Parameter binding
//! never fails an exchange; unbound slots and [`binding::ModelState`] issues
//! are handed to the action instead.

pub mod action;
pub mod binding;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod ids;
pub mod logging;
pub mod router;
pub mod security;
pub mod server;
pub mod views;

pub use action::ActionDescriptor;
pub use config::AppConfig;
pub use dispatcher::{ActionContext, ActionResult, Controller, ControllerRegistry, Dispatcher};
pub use error::{DispatchError, MalformedRequest};
pub use server::{parse_request, write_response, Request, Response};
