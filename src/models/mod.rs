pub mod price;
pub mod security;
