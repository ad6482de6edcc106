pub mod memory_store;
pub mod mongo_store;

pub use memory_store::MemoryJoydropStore;
pub use mongo_store::MongoJoydropStore;
