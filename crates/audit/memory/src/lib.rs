mod store;

pub use store::MemoryLogStore;
