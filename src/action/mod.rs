//! # Action Module
//!
//! Actions are declared explicitly at registration time. Each
//! [`ActionDescriptor`] carries the action's name, its allowed-methods policy,
//! its parameter shapes and its authorization policies, together with the
//! type-erased body the dispatcher invokes.
//!
//! ```rust,ignore
//! ActionDescriptor::new::<UserController, _>("Register", UserController::register)
//!     .post()
//!     .model::<RegisterForm>("form")
//!     .authorize(Authorize::any());
//! ```

mod core;
mod selector;

pub use core::{
    ActionDescriptor, ActionFn, FieldMeta, HandlerInstance, ModelBinder, ParameterKind,
    ParameterMeta, ScalarType,
};
pub use selector::ActionSelector;
