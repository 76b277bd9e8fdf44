#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
//! Session and credential-gated navigation for the Teller Bank demo
//! clients.
//!
//! The [`session::SessionController`] is the source of truth for
//! identity; storage, the route guard, the navigation gate, and the
//! profile projection are layered around it behind host-provided seams
//! ([`storage::KeyValueStore`], [`navigate::Navigator`]).

use strum::{Display, EnumString};

/// Which backend deployment the crate talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// The staging deployment.
    Staging,
    /// The production deployment.
    Production,
}

pub mod api;
pub mod error;
pub mod gate;
pub mod guard;
pub mod logger;
pub mod navigate;
pub mod profile;
pub mod session;
pub mod storage;
pub mod user;

// private modules
mod http_request;

pub use api::{AuthApi, SessionValidation};
pub use error::TellerKitError;
pub use gate::{GateState, NavigationGate, SubmitOutcome};
pub use guard::{evaluate_route, RouteDecision, RouteGuard};
pub use navigate::{NavigationFlags, Navigator};
pub use profile::ProfileProjection;
pub use session::{RegistrationForm, SessionController, SessionSnapshot, SessionState};
pub use storage::{CredentialVault, KeyValueStore, MemoryStore};
pub use user::UserRecord;
