mod registry;
pub mod symbology;
mod venues;

pub use registry::{
    AssetRegistry, RefreshSummary, RefreshWarning, RegistryError, RegistrySnapshot,
};
pub use venues::VenueCatalog;
