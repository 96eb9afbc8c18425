//! OCMops CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for OCMops controllers.

pub mod conditions;
pub mod gitlab_identity_provider;
pub mod references;
pub mod workload;

pub use conditions::*;
pub use gitlab_identity_provider::*;
pub use references::*;
pub use workload::*;
