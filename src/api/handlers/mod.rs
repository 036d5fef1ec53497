pub mod login;
pub mod root;
