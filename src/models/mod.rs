pub mod filter;
pub mod title;
