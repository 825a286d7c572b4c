//! # Bid fan-in.
//!
//! Every activation batch gets its own [`FanInState`]: one completion flag per
//! bidding service and a [`OnceGuard`] deciding which of "all services are
//! back" and "failsafe elapsed" issues the ad-server refresh.

mod coordinator;
mod guard;
mod state;

pub(crate) use coordinator::BidCoordinator;
pub use guard::OnceGuard;
pub use state::{Batch, Bidder, FanInState, RefreshTrigger};
