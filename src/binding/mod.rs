//! # Binding Module
//!
//! Turns loosely typed request data into an action's argument list.
//!
//! Binding never rejects a request. Two policies apply:
//!
//! - **Scalars** are scanned strictly in order. The first one that cannot be
//!   found or coerced leaves it and every following parameter unbound.
//! - **Models** ([`BindingModel`]) are bound field by field. A field that is
//!   missing or does not coerce keeps its default and the next field is tried.
//!   Field rules are evaluated afterwards and only flag the model as invalid.

mod core;
mod model;
pub mod validation;

pub use core::{Argument, Arguments, ParameterBinder};
pub use model::{bind_model, infer_fields, Bound, BindingModel, BoundModel};
pub use validation::{ModelState, ValidationIssue, ValidationRule};
