use hook_state::{FieldInput, FormManager, FormState, Validator};
use payloads::{FieldValue, FormErrors, FormValues};
use wasm_bindgen::JsCast;
use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::prelude::*;

/// Form hook return type
#[derive(Clone, PartialEq)]
pub struct UseFormHandle {
    pub values: FormValues,
    pub errors: FormErrors,
    /// Attach to `onchange` of inputs, selects and textareas. The element's
    /// `name` attribute picks the field.
    pub on_change: Callback<Event>,
    /// Same as `on_change`, for `oninput`.
    pub on_input: Callback<InputEvent>,
    pub on_submit: Callback<SubmitEvent>,
    pub reset: Callback<()>,
    pub set_field_value: Callback<(String, FieldValue)>,
    pub set_field_error: Callback<(String, String)>,
}

impl UseFormHandle {
    /// Text of a field, or an empty string for toggles and unknown names.
    pub fn text(&self, name: &str) -> String {
        self.values
            .get(name)
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
            .to_string()
    }

    pub fn checked(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors
            .get(name)
            .map(String::as_str)
            .filter(|message| !message.is_empty())
    }
}

/// Read the changed field out of an input, select or textarea event.
pub fn field_input(event: &Event) -> Option<FieldInput> {
    let target = event.target()?;
    if let Some(input) = target.dyn_ref::<HtmlInputElement>() {
        return Some(FieldInput {
            name: input.name(),
            input_type: input.type_(),
            value: input.value(),
            checked: input.checked(),
        });
    }
    if let Some(select) = target.dyn_ref::<HtmlSelectElement>() {
        return Some(FieldInput {
            name: select.name(),
            input_type: "select".into(),
            value: select.value(),
            checked: false,
        });
    }
    if let Some(textarea) = target.dyn_ref::<HtmlTextAreaElement>() {
        return Some(FieldInput {
            name: textarea.name(),
            input_type: "textarea".into(),
            value: textarea.value(),
            checked: false,
        });
    }
    None
}

/// Form state and validation hook.
///
/// `validate` and `on_submit` are read on every submit, so closures
/// recreated on each render are fine. `initial_values` is only read on
/// mount and by `reset`.
///
/// # Example
///
/// ```rust
/// # use std::rc::Rc;
/// # use hook_state::Validator;
/// # use payloads::{FormValues, requests};
/// # use ui::hooks::use_form;
/// # use yew::prelude::*;
/// # #[function_component]
/// # fn ContactForm() -> Html {
/// let form = use_form(
///     requests::contact_initial_values(),
///     Some(Rc::new(requests::validate_contact) as Validator),
///     Some(Callback::from(|values: FormValues| {
///         tracing::info!("submitted {values:?}");
///     })),
/// );
///
/// html! {
///     <form onsubmit={form.on_submit.clone()}>
///         <input name="name" value={form.text("name")}
///                oninput={form.on_input.clone()} />
///         if let Some(error) = form.error("name") {
///             <span>{error}</span>
///         }
///     </form>
/// }
/// # }
/// ```
#[hook]
pub fn use_form(
    initial_values: FormValues,
    validate: Option<Validator>,
    on_submit: Option<Callback<FormValues>>,
) -> UseFormHandle {
    let manager = use_mut_ref(move || FormManager::new(initial_values));
    let state = {
        let manager = manager.clone();
        use_state(move || manager.borrow().state().clone())
    };

    // Redraw on every change to the form
    {
        let manager = manager.clone();
        let state = state.clone();
        use_effect_with((), move |_| {
            let subscription = manager
                .borrow_mut()
                .subscribe(move |next: &FormState| state.set(next.clone()));
            move || {
                manager.borrow_mut().unsubscribe(subscription);
            }
        });
    }

    let on_change = {
        let manager = manager.clone();
        Callback::from(move |e: Event| match field_input(&e) {
            Some(input) => manager.borrow_mut().handle_input(&input),
            None => tracing::warn!("change event without a form field target"),
        })
    };

    let on_submit = {
        let manager = manager.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();

            // Release the form before handing values out, so the callback
            // may reset or edit it.
            let submitted = {
                let mut manager = manager.borrow_mut();
                manager
                    .submit_with(validate.as_deref(), None)
                    .then(|| manager.values().clone())
            };
            if let (Some(values), Some(on_submit)) = (submitted, &on_submit) {
                on_submit.emit(values);
            }
        })
    };

    let reset = {
        let manager = manager.clone();
        Callback::from(move |_| manager.borrow_mut().reset())
    };

    let set_field_value = {
        let manager = manager.clone();
        Callback::from(move |(name, value): (String, FieldValue)| {
            manager.borrow_mut().set_field_value(name, value)
        })
    };

    let set_field_error = {
        let manager = manager.clone();
        Callback::from(move |(name, message): (String, String)| {
            manager.borrow_mut().set_field_error(name, message)
        })
    };

    UseFormHandle {
        values: state.values.clone(),
        errors: state.errors.clone(),
        on_input: on_change.reform(Event::from),
        on_change,
        on_submit,
        reset,
        set_field_value,
        set_field_error,
    }
}
