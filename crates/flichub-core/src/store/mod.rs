// ── Snapshot storage ──
//
// `StateCache` owns the hub snapshot; `refresh` adds the single-flight
// full pull and the link-bound `Refresher` used by the bridge.

mod cache;
mod refresh;

pub use cache::{MergeReport, StateCache};
pub(crate) use refresh::Refresher;
