use std::fmt;

/// Lifecycle of a hashing context.
///
/// `Created -> Processing -> {Completed, Cancelled, Failed} -> Consumed`. A context can also
/// go straight from any non-consumed state to `Consumed` through cleanup.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    Created    = 0,
    Processing = 1,
    Completed  = 2,
    Cancelled  = 3,
    Failed     = 4,
    Consumed   = 5,
}

impl State {
    pub fn as_raw(self) -> i32 { self as i32 }

    pub fn is_consumed(self) -> bool { self == Self::Consumed }

    pub fn name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Consumed => "consumed",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}
