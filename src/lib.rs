#![allow(clippy::style)]
#![allow(clippy::complexity)]
#![warn(clippy::bool_comparison)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::no_effect)]
#![warn(clippy::unnecessary_unwrap)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::todo)]
#![warn(clippy::wildcard_dependencies)]
#![warn(clippy::borrowed_box)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_question_mark)]
#![warn(clippy::needless_return)]
#![warn(clippy::redundant_static_lifetimes)]
#![warn(clippy::unnecessary_cast)]
#![warn(clippy::useless_asref)]
#![warn(clippy::useless_conversion)]
#![warn(clippy::as_conversions)]
#![warn(clippy::mut_mutex_lock)]
#![warn(clippy::useless_format)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::unnecessary_lazy_evaluations)]
#![warn(clippy::redundant_field_names)]
#![warn(clippy::unused_async)]
#![warn(clippy::from_over_into)]

//! This crate keeps the Kubernetes Service of a charmed application exposing
//! a declared set of ports. A [`ServicePatcher`] subscribes to the `install`
//! and `upgrade-charm` lifecycle events of the application's [`EventSource`].
//! When one fires on the leader unit, it merge-patches the Service with a
//! manifest built from the configured [`PortSpec`]s:
//!
//! ```no_run
//! # use k8s_service_patch::{Dispatcher, LifecycleEvent, PatcherConfig, PortSpec, ServicePatcher};
//! # async fn run(client: kube::Client) -> Result<(), k8s_service_patch::Error> {
//! let mut dispatcher = Dispatcher::new("prometheus");
//! let patcher = ServicePatcher::new(
//!     &mut dispatcher,
//!     client,
//!     [PortSpec::from(("web", 9090)), PortSpec::from(("metrics", 8080, 9100))],
//!     PatcherConfig::default(),
//! )?;
//!
//! // Patches the `prometheus` Service, since this unit is the leader.
//! dispatcher.emit(LifecycleEvent::Install, true).await?;
//! assert!(patcher.is_patched().await?);
//! # Ok(())
//! # }
//! ```
//!
//! Failures to patch are logged rather than returned, so a cluster that
//! refuses the request never fails the hook. The patch is re-applied on the
//! next triggering event.

mod client;
mod config;
mod error;
mod events;
mod manifest;
mod patcher;
mod ports;

pub use client::ServiceApi;
pub use config::{NamespaceSource, PatcherConfig, SERVICE_ACCOUNT_NAMESPACE_PATH};
pub use error::{Error, Result};
pub use events::{Dispatcher, EventSource, Hook, HookContext, LifecycleEvent};
pub use manifest::{build_manifest, ManifestParams, APP_NAME_LABEL};
pub use patcher::{PatchOutcome, ServicePatcher};
pub use ports::PortSpec;
