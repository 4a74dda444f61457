pub mod contact;
pub mod newsletter;
pub mod user;
