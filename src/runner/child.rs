//! `.child` accessor (§4.4): immediate access to a child handle, real or
//! virtual, available even before spawn and nulled after Finished.

/// Real processes expose a pid; virtual commands have no OS process, so
/// they expose a marker instead — callers that need a pid specifically
/// (e.g. to signal it directly) get `None` for a virtual command, which is
/// correct: there is nothing to signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildHandle {
    Real { pid: Option<u32> },
    Virtual,
}

impl ChildHandle {
    pub fn pid(&self) -> Option<u32> {
        match self {
            ChildHandle::Real { pid } => *pid,
            ChildHandle::Virtual => None,
        }
    }
}
