pub mod color;
pub mod editor;
pub mod form;
pub mod help;
pub mod journal_view;
pub mod login_view;
pub mod message_list;
pub mod nav_bar;
pub mod preferences_view;
pub mod register_view;
pub mod status_bar;
