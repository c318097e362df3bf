mod store;

pub use store::MemoryEntityStore;
