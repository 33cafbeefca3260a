pub mod hire;
pub mod money;
pub mod post;
pub mod user;
pub mod validate;
pub mod worker;
