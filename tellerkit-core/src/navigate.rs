//! Host navigation seam.
//!
//! The crate never performs navigation itself; hosts implement
//! [`Navigator`] and the gate and guard call through it.

/// Presentation hints attached to a navigation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationFlags {
    /// Ask the host to surface its login UI at the destination.
    pub show_login: bool,
}

/// Host-provided navigation backend.
pub trait Navigator: Send + Sync {
    /// Navigates the host UI to `path`.
    fn navigate(&self, path: &str, flags: NavigationFlags);
}
