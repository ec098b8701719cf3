mod config;
mod dispatch;
mod manifest;
mod read;
mod reconcile;
mod runtime;

#[cfg(test)]
mod testing;

pub mod models;
pub mod ports;

pub use config::{Resources, StateConfig, StatePrepareError, prepare};
pub use dispatch::{Command, dispatch};
pub use manifest::{ManifestError, load as load_manifest, parse as parse_manifest};
pub use read::{ReadStateError, read};
pub use reconcile::{
    Action, Outcome, Report, STOP_GRACE_SECS, ServiceError, UPDATE_STOP_GRACE_SECS, reconcile,
};
pub use runtime::Runtime;

use dockerboot_oci as oci;
