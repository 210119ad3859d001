pub mod auth_form;
pub mod chat_area;
pub mod input_bar;
pub mod notice;
pub mod sidebar;
pub mod status_bar;
pub mod user_search;
