//! # Dispatcher Module
//!
//! The dispatcher is the single entry point consumed by a listener. For each
//! exchange it:
//!
//! 1. resolves the path to a handler and action name
//! 2. asks the factory for a handler instance
//! 3. selects the action accepting the request method
//! 4. attaches the session (creating one and a cookie for it when needed)
//! 5. checks the action's authorization policies
//! 6. binds the action's parameters
//! 7. invokes the action
//! 8. renders its [`ActionResult`] into a [`crate::server::Response`]
//!
//! Routing failures end the exchange with a 404, configuration and render
//! failures with a 500. A denied authorization is a normal outcome rendered
//! as `401 Unauthorized`, and the action body never runs.
//!
//! ## Registration
//!
//! ```rust
//! use ctrlrouter::action::ActionDescriptor;
//! use ctrlrouter::dispatcher::{ActionResult, Controller, ControllerRegistry, Dispatcher};
//!
//! #[derive(Default)]
//! struct HomeController;
//!
//! impl Controller for HomeController {
//!     const NAME: &'static str = "HomeController";
//!
//!     fn actions() -> Vec<ActionDescriptor> {
//!         vec![ActionDescriptor::new::<Self, _>("Index", |_, _, _| {
//!             ActionResult::html("<h1>Home</h1>")
//!         })]
//!     }
//! }
//!
//! let mut registry = ControllerRegistry::new();
//! registry.register::<HomeController>();
//! let dispatcher = Dispatcher::new(registry);
//! let wire = dispatcher.handle_raw(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! assert!(wire.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

mod core;
mod registry;
mod render;
mod result;

pub use core::Dispatcher;
pub use registry::{Controller, ControllerRegistry, HandlerFactory};
pub use render::ResultRenderer;
pub use result::{ActionContext, ActionResult, Viewable};
