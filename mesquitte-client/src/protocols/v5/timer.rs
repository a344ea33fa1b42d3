use std::fmt::{self, Display};

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum TimerOp {
    Set,
    Reset,
    Cancel,
}

impl Display for TimerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerOp::Set => write!(f, "set"),
            TimerOp::Reset => write!(f, "reset"),
            TimerOp::Cancel => write!(f, "cancel"),
        }
    }
}

/// Timers the engine asks the application to run on its behalf.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum TimerKind {
    // fires when a PINGREQ is due
    PingreqSend,
    // fires when the PINGRESP did not arrive in time
    PingrespRecv,
}

impl Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerKind::PingreqSend => write!(f, "pingreq_send"),
            TimerKind::PingrespRecv => write!(f, "pingresp_recv"),
        }
    }
}
