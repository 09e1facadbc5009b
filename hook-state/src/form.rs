use payloads::{FieldValue, FormErrors, FormValues};
use serde::Serialize;
use std::rc::Rc;

use crate::subscribers::{SubscriptionId, Subscribers};

/// Pure validation: the same values must always produce the same errors.
pub type Validator = Rc<dyn Fn(&FormValues) -> FormErrors>;

/// Called with the values of a form that passed validation.
pub type OnSubmit = Rc<dyn Fn(&FormValues)>;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FormState {
    pub values: FormValues,
    pub errors: FormErrors,
}

/// The parts of an input change event the form cares about.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldInput {
    pub name: String,
    /// The input's `type` attribute, e.g. "text" or "checkbox".
    pub input_type: String,
    pub value: String,
    pub checked: bool,
}

impl FieldInput {
    /// Toggles carry their checked state, everything else its raw text.
    pub fn field_value(&self) -> FieldValue {
        if self.input_type.eq_ignore_ascii_case("checkbox") {
            FieldValue::Bool(self.checked)
        } else {
            FieldValue::Text(self.value.clone())
        }
    }
}

/// Holds the values and validation errors of a fixed set of named fields.
///
/// The set of field names is fixed by the initial snapshot. Changes to names
/// outside that set are ignored.
pub struct FormManager {
    initial: FormValues,
    state: FormState,
    validator: Option<Validator>,
    on_submit: Option<OnSubmit>,
    subscribers: Subscribers<FormState>,
}

impl FormManager {
    pub fn new(initial: FormValues) -> Self {
        Self {
            state: FormState {
                values: initial.clone(),
                errors: FormErrors::new(),
            },
            initial,
            validator: None,
            on_submit: None,
            subscribers: Subscribers::default(),
        }
    }

    pub fn with_validator(
        mut self,
        validator: impl Fn(&FormValues) -> FormErrors + 'static,
    ) -> Self {
        self.validator = Some(Rc::new(validator));
        self
    }

    pub fn with_on_submit(
        mut self,
        on_submit: impl Fn(&FormValues) + 'static,
    ) -> Self {
        self.on_submit = Some(Rc::new(on_submit));
        self
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn values(&self) -> &FormValues {
        &self.state.values
    }

    pub fn errors(&self) -> &FormErrors {
        &self.state.errors
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.state.values.get(name)
    }

    /// The error for `name`, treating an empty message as no error.
    pub fn error(&self, name: &str) -> Option<&str> {
        self.state
            .errors
            .get(name)
            .map(String::as_str)
            .filter(|message| !message.is_empty())
    }

    /// True when no field currently has a non-empty error.
    pub fn is_valid(&self) -> bool {
        self.state.errors.values().all(String::is_empty)
    }

    pub fn subscribe(
        &mut self,
        callback: impl Fn(&FormState) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Update a field from user input and clear its error, if any.
    pub fn change_field(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) {
        let name = name.into();
        if !self.state.values.contains_key(&name) {
            tracing::warn!("ignoring change to unknown field {name:?}");
            return;
        }
        if self.error(&name).is_some() {
            self.state.errors.remove(&name);
        }
        self.state.values.insert(name, value.into());
        self.notify();
    }

    pub fn handle_input(&mut self, input: &FieldInput) {
        self.change_field(input.name.clone(), input.field_value());
    }

    /// Validate with the configured validator and, when there are no errors,
    /// hand the values to the configured submit callback.
    pub fn submit(&mut self) -> bool {
        let validator = self.validator.clone();
        let on_submit = self.on_submit.clone();
        self.submit_with(validator.as_deref(), on_submit.as_deref())
    }

    /// Like [`submit`](Self::submit) with an explicit validator and callback.
    ///
    /// A missing validator accepts everything. Any entry in the validator's
    /// result, even an empty message, makes the submission invalid.
    pub fn submit_with(
        &mut self,
        validate: Option<&dyn Fn(&FormValues) -> FormErrors>,
        on_valid: Option<&dyn Fn(&FormValues)>,
    ) -> bool {
        let errors = validate
            .map(|validate| validate(&self.state.values))
            .unwrap_or_default();
        let is_valid = errors.is_empty();

        tracing::debug!(
            errors = errors.len(),
            is_valid,
            "form submitted"
        );
        self.state.errors = errors;
        self.notify();

        if is_valid && let Some(on_valid) = on_valid {
            on_valid(&self.state.values);
        }
        is_valid
    }

    /// Restore the initial values and clear all errors.
    pub fn reset(&mut self) {
        self.state = FormState {
            values: self.initial.clone(),
            errors: FormErrors::new(),
        };
        self.notify();
    }

    /// Set a value without touching the field's error.
    pub fn set_field_value(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) {
        let name = name.into();
        match self.state.values.get_mut(&name) {
            Some(slot) => *slot = value.into(),
            None => {
                tracing::warn!("ignoring value for unknown field {name:?}");
                return;
            }
        }
        self.notify();
    }

    pub fn set_field_error(
        &mut self,
        name: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.state.errors.insert(name.into(), message.into());
        self.notify();
    }

    fn notify(&self) {
        self.subscribers.notify(&self.state);
    }
}
