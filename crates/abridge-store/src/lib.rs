pub mod error;
pub mod fs;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use fs::FsUnitStore;
pub use memory::MemoryUnitStore;
pub use store::UnitStore;
