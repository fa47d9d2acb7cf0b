pub mod auth_forms;
pub mod draft_form;
pub mod map_view;
pub mod pin_popup;
