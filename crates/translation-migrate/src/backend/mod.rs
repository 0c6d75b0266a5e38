//! Backend implementations of the collaborator traits.

mod memory;

pub use memory::MemoryBackend;
