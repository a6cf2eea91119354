use http::Method;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::binding::validation::ValidationRule;
use crate::binding::{Arguments, BindingModel, BoundModel};
use crate::dispatcher::{ActionContext, ActionResult};
use crate::error::DispatchError;
use crate::security::AuthorizationPolicy;
use crate::server::request::Request;

/// A handler instance as handed out by the factory.
pub type HandlerInstance = Box<dyn Any + Send>;

/// Type-erased action body.
pub type ActionFn = Arc<
    dyn Fn(&mut (dyn Any + Send), &mut ActionContext, Arguments) -> Result<ActionResult, DispatchError>
        + Send
        + Sync,
>;

/// Binds one structured model from request data.
pub type ModelBinder = fn(&Request, &[FieldMeta]) -> BoundModel;

/// Primitive type a raw request value is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Text,
    Int,
    UInt,
    Float,
    Bool,
    Char,
    /// Decided by the target's deserializer (e.g. an `Option<T>` model field)
    Any,
}

impl ScalarType {
    /// Coerce a raw value. `None` means the value does not fit the type.
    #[must_use]
    pub fn coerce(self, raw: &str) -> Option<Value> {
        match self {
            ScalarType::Text => Some(Value::String(raw.to_string())),
            ScalarType::Int => raw.trim().parse::<i64>().ok().map(Value::from),
            ScalarType::UInt => raw.trim().parse::<u64>().ok().map(Value::from),
            ScalarType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            ScalarType::Bool => {
                let t = raw.trim();
                if t.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if t.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            ScalarType::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::String(c.to_string())),
                    _ => None,
                }
            }
            ScalarType::Any => self.candidates(raw).into_iter().next(),
        }
    }

    /// Every plausible coercion, most specific first.
    #[must_use]
    pub fn candidates(self, raw: &str) -> Vec<Value> {
        match self {
            ScalarType::Any => [
                ScalarType::Int,
                ScalarType::Float,
                ScalarType::Bool,
                ScalarType::Text,
            ]
            .into_iter()
            .filter_map(|ty| ty.coerce(raw))
            .collect(),
            ty => ty.coerce(raw).into_iter().collect(),
        }
    }

    /// Type of a field inferred from its default JSON value.
    #[must_use]
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::String(_) => ScalarType::Text,
            Value::Bool(_) => ScalarType::Bool,
            Value::Number(n) if n.is_f64() => ScalarType::Float,
            Value::Number(_) => ScalarType::Int,
            Value::Null | Value::Array(_) | Value::Object(_) => ScalarType::Any,
        }
    }
}

/// One bindable field of a structured model.
#[derive(Debug, Clone)]
pub struct FieldMeta {
    name: String,
    ty: ScalarType,
    rules: Vec<ValidationRule>,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            ty,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key looked up in the request data.
    #[must_use]
    pub fn lookup_key(&self) -> String {
        self.name.to_lowercase()
    }

    #[must_use]
    pub fn ty(&self) -> ScalarType {
        self.ty
    }

    #[must_use]
    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    pub(crate) fn push_rule(&mut self, rule: ValidationRule) {
        self.rules.push(rule);
    }
}

/// Shape of one declared action parameter.
#[derive(Clone)]
pub enum ParameterKind {
    Scalar(ScalarType),
    Model {
        type_name: &'static str,
        fields: Vec<FieldMeta>,
        binder: ModelBinder,
    },
}

impl fmt::Debug for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::Scalar(ty) => f.debug_tuple("Scalar").field(ty).finish(),
            ParameterKind::Model {
                type_name, fields, ..
            } => f
                .debug_struct("Model")
                .field("type_name", type_name)
                .field("fields", fields)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterMeta {
    name: String,
    kind: ParameterKind,
}

impl ParameterMeta {
    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Scalar(ty),
        }
    }

    /// A structured parameter bound field by field into a fresh `M`.
    pub fn model<M: BindingModel>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Model {
                type_name: std::any::type_name::<M>(),
                fields: M::fields(),
                binder: crate::binding::bind_model::<M>,
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }
}

/// Registration-time metadata and body of one action.
#[derive(Clone)]
pub struct ActionDescriptor {
    name: String,
    allowed_methods: Vec<Method>,
    params: Vec<ParameterMeta>,
    authorization: Vec<Arc<dyn AuthorizationPolicy>>,
    invoke: ActionFn,
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("name", &self.name)
            .field("allowed_methods", &self.allowed_methods)
            .field("params", &self.params)
            .field("authorization", &self.authorization.len())
            .finish_non_exhaustive()
    }
}

impl ActionDescriptor {
    /// Declare an action on handler type `C`.
    ///
    /// The body receives the handler instance created for the exchange. If the
    /// factory hands out an instance of another type the exchange fails with
    /// [`DispatchError::Configuration`].
    pub fn new<C, F>(name: impl Into<String>, body: F) -> Self
    where
        C: Any + Send,
        F: Fn(&mut C, &mut ActionContext, Arguments) -> ActionResult + Send + Sync + 'static,
    {
        let name = name.into();
        let action_name = name.clone();
        let invoke: ActionFn = Arc::new(
            move |instance: &mut (dyn Any + Send),
                  ctx: &mut ActionContext,
                  args: Arguments|
                  -> Result<ActionResult, DispatchError> {
                let handler = instance.downcast_mut::<C>().ok_or_else(|| {
                    DispatchError::Configuration {
                        message: format!(
                            "action '{action_name}' expects a handler of type {}",
                            std::any::type_name::<C>()
                        ),
                    }
                })?;
                Ok(body(handler, ctx, args))
            },
        );
        Self {
            name,
            allowed_methods: Vec::new(),
            params: Vec::new(),
            authorization: Vec::new(),
            invoke,
        }
    }

    /// Accept `method` in addition to any already declared.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        if !self.allowed_methods.contains(&method) {
            self.allowed_methods.push(method);
        }
        self
    }

    #[must_use]
    pub fn get(self) -> Self {
        self.method(Method::GET)
    }

    #[must_use]
    pub fn post(self) -> Self {
        self.method(Method::POST)
    }

    #[must_use]
    pub fn put(self) -> Self {
        self.method(Method::PUT)
    }

    #[must_use]
    pub fn delete(self) -> Self {
        self.method(Method::DELETE)
    }

    #[must_use]
    pub fn param(mut self, param: ParameterMeta) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn scalar(self, name: impl Into<String>, ty: ScalarType) -> Self {
        self.param(ParameterMeta::scalar(name, ty))
    }

    #[must_use]
    pub fn model<M: BindingModel>(self, name: impl Into<String>) -> Self {
        self.param(ParameterMeta::model::<M>(name))
    }

    /// Attach an authorization policy. All attached policies must accept.
    #[must_use]
    pub fn authorize<P: AuthorizationPolicy + 'static>(mut self, policy: P) -> Self {
        self.authorization.push(Arc::new(policy));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared methods; empty means the GET-only default.
    #[must_use]
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }

    #[must_use]
    pub fn params(&self) -> &[ParameterMeta] {
        &self.params
    }

    #[must_use]
    pub fn authorization(&self) -> &[Arc<dyn AuthorizationPolicy>] {
        &self.authorization
    }

    /// Whether this action accepts `method` under its declared policy.
    #[must_use]
    pub fn accepts(&self, method: &Method) -> bool {
        if self.allowed_methods.is_empty() {
            *method == Method::GET
        } else {
            self.allowed_methods.contains(method)
        }
    }

    /// Run the action body on `instance`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Configuration`] when `instance` is not the handler type
    /// the action was declared on.
    pub fn invoke(
        &self,
        instance: &mut (dyn Any + Send),
        ctx: &mut ActionContext,
        args: Arguments,
    ) -> Result<ActionResult, DispatchError> {
        (self.invoke)(instance, ctx, args)
    }
}
