pub mod monitor;
pub mod server;
pub mod stream;
