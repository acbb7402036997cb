pub mod health;
pub mod session;
