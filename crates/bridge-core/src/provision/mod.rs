//! Namespace provisioning
//!
//! - **cache**: process-wide set of namespaces known to exist
//! - **provisioner**: check-cache, query, create and first-publish sequence

mod cache;
mod provisioner;

pub use cache::ProvisionCache;
pub use provisioner::{NamespaceProvisioner, Provisioned, first_release_title};
