pub mod clock;
pub mod cooldown;
pub mod handle;
pub mod member;
pub mod presence;
pub mod registry;
pub mod roster;
#[allow(clippy::module_inception)]
pub mod session;

pub use clock::{now_millis, RoundClock, Status, Timestamp};
pub use cooldown::CooldownGate;
pub use handle::{SessionHandle, SessionState};
pub use member::{Member, Outbox};
pub use presence::PresenceTracker;
pub use registry::SessionRegistry;
pub use roster::{HostClaim, PlayerInfo, PlayerView, Roster};
pub use session::{JoinOutcome, Meta, Session, Snapshot};
