pub mod dictionary;
pub mod types;
