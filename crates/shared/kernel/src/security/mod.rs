pub mod password;
pub mod resource;
