pub mod health;
pub mod relationship;
