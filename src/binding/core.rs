use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::model::{Bound, BoundModel};
use super::validation::ModelState;
use crate::action::{ActionDescriptor, ParameterKind};
use crate::server::request::Request;

/// One slot of the argument list.
#[derive(Debug)]
pub enum Argument {
    /// No value: lookup or coercion failed, or an earlier scalar stopped the scan
    Unbound,
    Scalar(Value),
    Model(BoundModel),
}

/// Arguments for one action invocation, in declaration order.
#[derive(Debug, Default)]
pub struct Arguments {
    slots: Vec<(String, Argument)>,
    model_state: ModelState,
}

impl Arguments {
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|(n, _)| n == name)
    }

    #[must_use]
    pub fn is_bound(&self, index: usize) -> bool {
        !matches!(self.slots.get(index), None | Some((_, Argument::Unbound)))
    }

    /// Raw JSON value of a bound scalar.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.slots.get(index) {
            Some((_, Argument::Scalar(v))) => Some(v),
            _ => None,
        }
    }

    /// A bound scalar converted to `T`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Option<T> {
        self.value(index)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    #[must_use]
    pub fn get_named<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.position(name).and_then(|i| self.get(i))
    }

    /// Move a bound model out of its slot, leaving the slot unbound.
    ///
    /// Returns `None` when the slot holds no model of type `M`.
    pub fn take_model<M: 'static>(&mut self, index: usize) -> Option<Bound<M>> {
        let slot = self.slots.get_mut(index)?;
        if !matches!(&slot.1, Argument::Model(m) if m.instance.is::<M>()) {
            return None;
        }
        match std::mem::replace(&mut slot.1, Argument::Unbound) {
            Argument::Model(bound) => {
                let is_valid = bound.is_valid();
                let model = bound.instance.downcast::<M>().ok()?;
                Some(Bound {
                    model: *model,
                    is_valid,
                    issues: bound.issues,
                })
            }
            _ => None,
        }
    }

    pub fn take_model_named<M: 'static>(&mut self, name: &str) -> Option<Bound<M>> {
        let index = self.position(name)?;
        self.take_model(index)
    }

    /// Validation outcome across all bound models.
    #[must_use]
    pub fn model_state(&self) -> &ModelState {
        &self.model_state
    }
}

/// Produces an action's argument list from request data.
pub struct ParameterBinder;

impl ParameterBinder {
    /// Bind every declared parameter of `action` from `request`.
    ///
    /// Never fails. Scalars are looked up by name (query, then form) and
    /// coerced; the first scalar that is missing or does not coerce stops the
    /// scan and leaves every later parameter unbound. Models are bound field
    /// by field and validated.
    #[must_use]
    pub fn bind(action: &ActionDescriptor, request: &Request) -> Arguments {
        let params = action.params();
        let mut args = Arguments {
            slots: Vec::with_capacity(params.len()),
            model_state: ModelState::new(),
        };

        let mut stopped = false;
        for (index, param) in params.iter().enumerate() {
            let argument = if stopped {
                Argument::Unbound
            } else {
                match param.kind() {
                    ParameterKind::Scalar(ty) => {
                        match request.data(param.name()).and_then(|raw| ty.coerce(raw)) {
                            Some(value) => Argument::Scalar(value),
                            None => {
                                warn!(
                                    action = %action.name(),
                                    parameter = %param.name(),
                                    position = index,
                                    unbound = params.len() - index,
                                    "Scalar parameter unavailable, remaining parameters left unbound"
                                );
                                stopped = true;
                                Argument::Unbound
                            }
                        }
                    }
                    ParameterKind::Model { fields, binder, .. } => {
                        let bound = binder(request, fields);
                        args.model_state.extend(bound.issues().iter().cloned());
                        Argument::Model(bound)
                    }
                }
            };
            args.slots.push((param.name().to_string(), argument));
        }

        debug!(
            action = %action.name(),
            params = params.len(),
            bound = (0..args.len()).filter(|i| args.is_bound(*i)).count(),
            model_valid = args.model_state.is_valid(),
            "Parameters bound"
        );
        args
    }
}
