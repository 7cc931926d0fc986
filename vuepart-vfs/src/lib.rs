//! Vuepart Virtual File System
//!
//! A read-side file system abstraction used by the plugin to resolve
//! package-style module specifiers without touching the disk directly.
//!
//! # Usage
//! ```
//! use vuepart_vfs::{MemoryFileSystem, VirtualFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.insert("/app/node_modules/lib/index.js", "export default 1");
//! assert!(fs.is_file(Path::new("/app/node_modules/lib/index.js")));
//! assert!(fs.is_dir(Path::new("/app/node_modules/lib")));
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::VirtualFileSystem;
