pub mod account_helpers;
pub mod form_helpers;
pub mod input_helpers;
pub mod public_helpers;
pub mod sanitization_helpers;
