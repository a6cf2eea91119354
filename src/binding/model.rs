use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::Any;
use tracing::{debug, warn};

use super::validation::{validate_fields, ValidationIssue, ValidationRule};
use crate::action::{FieldMeta, ScalarType};
use crate::server::request::Request;

/// A structured action parameter populated field by field from request data.
///
/// Fields are discovered from the serialized form of `Self::default()`, so
/// every serialized field is bindable. Its type is inferred from the default
/// value; fields that default to `null` accept whatever the deserializer
/// accepts.
///
/// ```rust,ignore
/// #[derive(Default, Serialize, Deserialize)]
/// struct RegisterForm {
///     username: String,
///     age: u32,
/// }
///
/// impl BindingModel for RegisterForm {
///     fn rules() -> Vec<(&'static str, ValidationRule)> {
///         vec![("username", ValidationRule::Required)]
///     }
/// }
/// ```
pub trait BindingModel: Serialize + DeserializeOwned + Default + Send + 'static {
    /// Validation rules keyed by field name.
    fn rules() -> Vec<(&'static str, ValidationRule)> {
        Vec::new()
    }

    /// Bindable fields with their rules attached.
    fn fields() -> Vec<FieldMeta> {
        let mut fields = infer_fields(&Self::default());
        for (name, rule) in Self::rules() {
            match fields.iter_mut().find(|f| f.name() == name) {
                Some(field) => field.push_rule(rule),
                None => warn!(
                    model = std::any::type_name::<Self>(),
                    field = name,
                    "Validation rule names an unknown field"
                ),
            }
        }
        fields
    }
}

/// Field metadata from the serialized shape of `model`.
pub fn infer_fields<M: Serialize>(model: &M) -> Vec<FieldMeta> {
    match serde_json::to_value(model) {
        Ok(Value::Object(map)) => map
            .iter()
            .map(|(name, value)| FieldMeta::new(name.clone(), ScalarType::infer(value)))
            .collect(),
        _ => Vec::new(),
    }
}

/// A type-erased bound model and its validation outcome.
#[derive(Debug)]
pub struct BoundModel {
    pub(crate) instance: Box<dyn Any + Send>,
    pub(crate) type_name: &'static str,
    pub(crate) issues: Vec<ValidationIssue>,
    pub(crate) bound_fields: usize,
}

impl BoundModel {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Number of fields that received a value from the request.
    #[must_use]
    pub fn bound_fields(&self) -> usize {
        self.bound_fields
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A bound model taken out of the argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound<M> {
    pub model: M,
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

fn object_of<M: Serialize>(model: &M) -> Map<String, Value> {
    match serde_json::to_value(model) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Bind a fresh `M` from the request's query, then form, data.
///
/// Each field is independent: a missing value or one the field's type
/// rejects leaves that field at its default and binding moves on.
pub fn bind_model<M: BindingModel>(request: &Request, fields: &[FieldMeta]) -> BoundModel {
    let default = M::default();
    let mut values = object_of(&default);
    let mut bound_fields = 0usize;

    for field in fields {
        let key = field.lookup_key();
        let Some(raw) = request.data(&key) else {
            debug!(field = %field.name(), "Model field not supplied");
            continue;
        };
        let accepted = field.ty().candidates(raw).into_iter().find(|candidate| {
            let mut trial = values.clone();
            trial.insert(field.name().to_string(), candidate.clone());
            serde_json::from_value::<M>(Value::Object(trial)).is_ok()
        });
        match accepted {
            Some(value) => {
                values.insert(field.name().to_string(), value);
                bound_fields += 1;
            }
            None => debug!(
                field = %field.name(),
                raw_value = %raw,
                "Model field rejected value, keeping default"
            ),
        }
    }

    let issues = validate_fields(fields, &values);
    let model = serde_json::from_value::<M>(Value::Object(values)).unwrap_or(default);
    debug!(
        model = std::any::type_name::<M>(),
        bound_fields,
        issue_count = issues.len(),
        "Model bound"
    );
    BoundModel {
        instance: Box::new(model),
        type_name: std::any::type_name::<M>(),
        issues,
        bound_fields,
    }
}
