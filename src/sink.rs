// MIT License - Copyright (c) 2026 Peter Wright
// Presentation sink seam

use std::future::Future;
use std::sync::Arc;

use crate::mode::PresentationValue;

/// Fault signal on the security system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFault {
    NoFault,
    GeneralFault,
}

impl StatusFault {
    pub fn code(&self) -> u8 {
        match self {
            Self::NoFault => 0,
            Self::GeneralFault => 1,
        }
    }
}

/// The front end that displays station state.
///
/// Pushes are fire-and-forget: implementations log their own delivery errors.
pub trait PresentationSink: Send + Sync {
    fn update_current_state(&self, value: PresentationValue) -> impl Future<Output = ()> + Send;

    fn update_target_state(&self, value: PresentationValue) -> impl Future<Output = ()> + Send;

    fn update_status_fault(&self, fault: StatusFault) -> impl Future<Output = ()> + Send;
}

impl<T: PresentationSink> PresentationSink for Arc<T> {
    fn update_current_state(&self, value: PresentationValue) -> impl Future<Output = ()> + Send {
        (**self).update_current_state(value)
    }

    fn update_target_state(&self, value: PresentationValue) -> impl Future<Output = ()> + Send {
        (**self).update_target_state(value)
    }

    fn update_status_fault(&self, fault: StatusFault) -> impl Future<Output = ()> + Send {
        (**self).update_status_fault(fault)
    }
}
