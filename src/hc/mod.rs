//! Hill climbing (HC).
//!
//! Local search over [`State`](crate::state::State) neighborhoods. Three
//! variants share one neighbor generator and one acceptance rule (strict
//! improvement of the total fitness):
//!
//! - classic steepest descent
//! - first-X descent, stopping the scan after `X` improving neighbors
//! - random-restart first-X with a geometrically growing width
//!
//! # References
//!
//! - Russell & Norvig, "Artificial Intelligence: A Modern Approach",
//!   ch. 4.1 (hill climbing and its random-restart variant)

mod config;
mod runner;

pub use config::{HcConfig, HcVariant};
pub use runner::{next_width, rise_factor, start_width, width_schedule, HcResult, HcRunner};
