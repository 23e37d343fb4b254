//! Courtlens - bail decision analytics by court, judge and charge
//!
//! Courtlens serves a small dashboard over a database of bail decisions.
//! Users pick up to two filters (a court, a judge or a charge), and the
//! results page charts how often each kind of bail decision was made and what
//! it cost, either as raw figures or relative to the overall average.
//!
//! # Quick Start
//!
//! ```no_run
//! use courtlens::{Database, ViewMode};
//! use courtlens::selection::{self, Selection, SelectionKind, Selections};
//!
//! let db = Database::open_at("test.db").unwrap();
//! let picked = Selections::from_pair(
//!     Selection::new(SelectionKind::Court, 3),
//!     Selection::empty(),
//! );
//!
//! // Token for /results?selections=<token>
//! let token = selection::encode(&picked);
//!
//! let rows = db.bail_decisions(&selection::decode(&token).filter(), ViewMode::Comparative).unwrap();
//! for row in rows {
//!     println!("{}: {:.2}x average share", row.kind, row.percentage);
//! }
//! ```
//!
//! # Views
//!
//! | View | Plotted value | Tooltip |
//! |------|---------------|---------|
//! | objective | share of decisions / mean cost | `40.0% \| 8 Bail Decisions` |
//! | comparative | deviation from average, % | `25.0% above average \| 10 Bail Decisions` |
//!
//! # Modules
//!
//! - [`selection`]: search selections and the results token
//! - [`chart`]: chart rows, display transform and tooltip formatting
//! - [`title`]: results page titles
//! - [`resolve`]: entity name lookup and request-keyed lookup state
//! - [`db`]: SQLite storage and aggregate queries
//! - [`auth`]: the authentication boundary
//! - [`serve`] / [`pages`]: HTTP routes and rendered pages

pub mod auth;
pub mod chart;
pub mod config;
pub mod db;
pub mod pages;
pub mod resolve;
pub mod schema;
pub mod selection;
pub mod serve;
pub mod title;

pub use auth::{AuthContext, Authenticator};
pub use chart::{BailDecisionData, ChartSeries, Metric, ValueTransform, ViewMode};
pub use db::{Charge, Database, DbError, ImportData};
pub use resolve::{KeyedSlot, NameLookup, RequestCounter, RequestKey};
pub use selection::{Filter, Selection, SelectionKind, Selections};
pub use title::format_specification_title;

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is re-exported from the crate
    // root and fits together end to end.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let _: ViewMode = ViewMode::Comparative;
        let _: Metric = Metric::AverageCost;
        let _auth = Authenticator::open();
        let _slot: KeyedSlot<RequestKey<i32>, String> = KeyedSlot::new();
        let _ = RequestCounter::new().next(1);
    }

    #[test]
    fn test_token_to_title() {
        let names = resolve::StaticNames::new().with_judge(4, "Hon. Reyes");
        let token = selection::encode(&Selections::from_pair(
            Selection::new(SelectionKind::Judge, 4),
            Selection::new(SelectionKind::Charge, 5),
        ));

        let (court, judge, charge) = selection::decode(&token).filter().ids();
        assert_eq!(
            format_specification_title(court, judge, charge, Some("Theft"), &names),
            "Hon. Reyes | Theft"
        );
    }

    #[test]
    fn test_transform_round_trip() {
        let t = ValueTransform::new(ViewMode::Comparative);
        assert!((t.invert(t.display(1.37)) - 1.37).abs() < 1e-12);
    }
}
