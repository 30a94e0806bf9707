pub mod health;
pub mod managers;
pub mod requests;
