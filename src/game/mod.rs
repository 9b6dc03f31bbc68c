//! Game simulation.
//!
//! Everything under here mutates the world only through [`state::World`]
//! methods while the network layer holds the single world lock. The
//! modules are pure with respect to I/O: no sockets, no clocks; the tick
//! receives its time delta from the caller.

pub mod collision;
pub mod map;
pub mod state;
pub mod tick;
