pub mod expr;
pub mod instruction;
pub mod name;
pub mod stmt;
