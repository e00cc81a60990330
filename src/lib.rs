pub mod aggregate;
pub mod app;
pub mod backup;
pub mod config;
pub mod dates;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod navigator;
pub mod period;
pub mod rollup_cache;
pub mod state;
pub mod storage;
pub mod ui;

pub use aggregate::{aggregate, ClubRollup};
pub use app::router;
pub use config::Config;
pub use navigator::{advance, Direction};
pub use period::{resolve, PeriodKind, PeriodSettings, PeriodWindow};
pub use rollup_cache::{should_skip_render, RollupCache};
pub use state::AppState;
pub use storage::load_data;
