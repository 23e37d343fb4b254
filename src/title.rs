//! Results page titles
//!
//! The title names whatever the results are filtered on, always in the order
//! judge, court, charge, e.g. `Hon. Smith | Municipal Court | Theft`. With no
//! filter the title is `Global`.

use crate::resolve::NameLookup;

pub const GLOBAL_TITLE: &str = "Global";
pub const TITLE_SEPARATOR: &str = " | ";

/// Build the title for the given IDs, where 0 means unspecified.
///
/// `charge_name` is used as-is when the caller already has it. IDs the lookup
/// doesn't know render as `Judge #7` so the filter still shows.
pub fn format_specification_title<L: NameLookup + ?Sized>(
    court: i32,
    judge: i32,
    charge: i32,
    charge_name: Option<&str>,
    lookup: &L,
) -> String {
    if court == 0 && judge == 0 && charge == 0 {
        return GLOBAL_TITLE.to_string();
    }

    let mut parts: Vec<String> = Vec::with_capacity(3);

    if judge != 0 {
        parts.push(lookup.judge_name(judge).unwrap_or_else(|| format!("Judge #{}", judge)));
    }
    if court != 0 {
        parts.push(lookup.court_name(court).unwrap_or_else(|| format!("Court #{}", court)));
    }
    if charge != 0 {
        let name = match charge_name {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => lookup.charge_name(charge).unwrap_or_else(|| format!("Charge #{}", charge)),
        };
        parts.push(name);
    }

    parts.join(TITLE_SEPARATOR)
}
