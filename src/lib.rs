pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod input;
pub mod memory;
pub mod proto;
pub mod scan;
pub mod session;
pub mod verify;

pub use backend::{Backend, Credentials, RpcBackend};
pub use error::{Error, Result};
pub use memory::MemoryBackend;
pub use scan::{ScanCursor, Scanner};
pub use session::{Row, Session};
