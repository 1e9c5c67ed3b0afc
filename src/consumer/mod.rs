//! Consumer side: retrieving and decoding extended messages

pub mod handler;
pub mod receiver;
pub mod resolver;

pub use handler::handler;
pub use receiver::{ExtendedReceiver, RetrieveRequest};
pub use resolver::MessageResolver;
