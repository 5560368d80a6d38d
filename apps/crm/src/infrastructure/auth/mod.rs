// Auth provider adapters

pub mod hosted;
pub mod memory;

pub use hosted::HostedAuthProvider;
pub use memory::InMemoryAuthProvider;
