//! Pipeline Systems
//!
//! One system per stage of a timestep, chained in this order:
//! prestige refresh, desire update, aggression source, prestige refresh,
//! aggression spread, decay, expulsion, status update, metrics.
//!
//! Each system is a thin wrapper over a pure function so the stages can be
//! exercised without a `World`.

pub mod decay;
pub mod desire;
pub mod expulsion;
pub mod prestige;
pub mod source;
pub mod spread;
pub mod status;

pub use decay::{apply_decay, decay_aggression};
pub use desire::{apply_desire_update, update_desires};
pub use expulsion::{expel_most_targeted, expel_scapegoat};
pub use prestige::{
    neighbor_mean, refresh_prestige_for_desire, refresh_prestige_for_spread, Prestige,
};
pub use source::{apply_rivalry_source, shared_desire, source_aggression, status_rivalry_increment};
pub use spread::{
    apply_spread, mimetic_pull, perceived_hostility, redistribute, relative_salience,
    salience_ceiling, sharpen, spread_aggression,
};
pub use status::{apply_status_loss, status_rivalry_active, update_status};
