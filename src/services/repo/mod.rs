pub mod backend;
pub mod local;
pub mod memory;
pub mod slow;

pub use backend::{
    DetailHandle, DetailedSubmoduleInfo, ModuleChain, RefDescriptor, RemoteDescriptor, RepoQuery,
    SubmoduleInfo, SubmoduleInfoResult, SubmoduleStatus,
};
pub use local::LocalRepoQuery;
pub use memory::{MemoryRepo, MemoryRepoQuery};
pub use slow::{QueryMetrics, SlowRepoConfig, SlowRepoQuery};
