pub mod binding;
pub mod flow;
pub mod token;
