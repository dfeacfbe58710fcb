pub mod help;
pub mod score;
