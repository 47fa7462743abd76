//! Types and gameplay math shared by the volley server and client.

pub mod config;
pub mod jump;
pub mod protocol;
pub mod vec3;
