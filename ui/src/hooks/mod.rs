pub mod use_fetch;
pub mod use_form;

pub use use_fetch::{FetchHookReturn, use_fetch};
pub use use_form::{UseFormHandle, field_input, use_form};
