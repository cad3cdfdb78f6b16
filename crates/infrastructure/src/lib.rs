//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_security_directory;

pub use in_memory_security_directory::InMemorySecurityDirectory;
