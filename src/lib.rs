pub mod client;
pub mod config;
pub mod exception;
pub mod header;
pub mod logger;
pub mod param;
pub mod registry;
pub mod request;
pub mod response;
pub mod server;
pub mod util;

pub use client::{Client, Connection};
pub use config::Config;
pub use exception::Exception;
pub use header::Headers;
pub use param::{HttpRequestMethod, HttpVersion};
pub use registry::{Handler, Registry};
pub use request::Request;
pub use response::Response;
pub use server::{Listener, ShutdownHandle};
