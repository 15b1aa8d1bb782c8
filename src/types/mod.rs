//! Core types for the number station

mod mode;
mod sanity;
mod timing;
mod recovery;
mod reason;
mod output;
mod message;

pub use mode::{PossessionMode, ExitCause};
pub use sanity::{SanityState, SanityLevel, shake_intensity};
pub use timing::{SignalKind, MorseTimingEvent, ScheduledSignal};
pub use recovery::{RecoverySymbol, RecoveryProgress, SlotStatus, RECOVERY_CODE_LEN};
pub use reason::ReasonCode;
pub use output::StationOutput;
pub use message::{TransmittedMessage, SessionStats, BROADCAST_CONTACT};
