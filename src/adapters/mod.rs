//! Adapters: concrete implementations of the ports plus the HTTP and
//! real-time transport layers.

pub mod auth;
pub mod http;
pub mod realtime;
pub mod storage;
