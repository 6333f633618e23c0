mod atomic;
pub mod output;
mod real;
mod traits;

pub use atomic::write_bytes_atomically;
pub use real::{MemoryFileSystem, RealFileSystem};
pub use traits::FileSystem;
