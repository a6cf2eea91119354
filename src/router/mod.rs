//! # Router Module
//!
//! Maps a request path onto the handler and action that should serve it.
//!
//! Routing is purely conventional: there is no route table. The root path
//! resolves to a configurable default pair (`Home`/`Index`), and every other
//! path names the handler in its first segment and the action in its second:
//!
//! ```text
//! /                 -> (Home, Index)
//! /user/register    -> (User, Register)
//! /User/Register?x  -> (User, Register)
//! ```
//!
//! Whether the resolved pair actually exists is decided later by the
//! dispatcher's registry and the action selector.

mod core;

pub use core::{capitalize, RouteDescriptor, RouteResolver};
