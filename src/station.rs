// MIT License - Copyright (c) 2026 Peter Wright
// Station client seam

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::mode::GuardMode;

/// The device-and-station client the reconciler talks to.
///
/// Event delivery is not part of the trait: clients hand the reconciler an
/// [`crate::event::EventReceiver`] instead.
pub trait StationClient: Send + Sync {
    /// Read the guard mode the station is currently in.
    fn guard_mode(&self) -> impl Future<Output = Result<GuardMode>> + Send;

    /// Whether the client currently has a connection to the station.
    fn is_connected(&self) -> bool;

    /// Command the station into a guard mode.
    fn set_guard_mode(&self, mode: GuardMode) -> impl Future<Output = Result<()>> + Send;
}

impl<T: StationClient> StationClient for Arc<T> {
    fn guard_mode(&self) -> impl Future<Output = Result<GuardMode>> + Send {
        (**self).guard_mode()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn set_guard_mode(&self, mode: GuardMode) -> impl Future<Output = Result<()>> + Send {
        (**self).set_guard_mode(mode)
    }
}
