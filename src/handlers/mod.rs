pub mod health;
pub mod image;

mod helpers;
