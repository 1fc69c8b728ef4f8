pub mod dialogs;
pub mod toast;
pub mod tree_view;
pub mod ui;
