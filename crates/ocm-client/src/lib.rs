//! OpenShift Cluster Manager REST API Client
//!
//! A Rust client library for the OCM clusters-management API. Provides
//! type-safe models and methods for cluster lookup and identity provider
//! management.
//!
//! # Example
//!
//! ```no_run
//! use ocm_client::{OcmClient, OcmClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a client
//! let client = OcmClient::new(
//!     "https://api.openshift.com".to_string(),
//!     "your-bearer-token".to_string(),
//! )?;
//!
//! // Resolve a cluster by its external key
//! let cluster = client
//!     .get_cluster_by_key("abcd1234-ab12-cd34-ef56-abcdef123456")
//!     .await?;
//!
//! // List identity providers attached to it
//! if let Some(cluster) = cluster {
//!     let idp = client
//!         .find_identity_provider_by_name(&cluster.id, "gitlab")
//!         .await?;
//!     println!("gitlab provider present: {}", idp.is_some());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod ocm_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::OcmClient;
pub use error::OcmError;
pub use models::*;
pub use ocm_trait::OcmClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockOcmClient;
