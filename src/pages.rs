//! Server-rendered dashboard pages
//!
//! Templates live in `src/ui/` and are embedded in the binary. Placeholders
//! look like `{{NAME}}`; everything substituted into them is HTML-escaped
//! here, braces included, so substituted text never forms a placeholder.

use crate::chart::{BailDecisionData, ChartSeries, Metric, ViewMode, SAME_AS_AVERAGE_THRESHOLD};
use crate::db::{Charge, Database, DbError, NamedEntity};
use crate::selection::{self, Selections, MAX_SELECTIONS};
use crate::title::format_specification_title;
use serde::Serialize;
use std::fmt::Write;

const LAYOUT_HTML: &str = include_str!("ui/layout.html");
const LOGIN_HTML: &str = include_str!("ui/login.html");
const SEARCH_HTML: &str = include_str!("ui/search.html");
const RESULTS_HTML: &str = include_str!("ui/results.html");

const SIGN_OUT_NAV: &str = r#"<a href="/logout">Sign out</a>"#;

/// Everything the results page and `/api/results` show for one search
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    pub selections: Selections,
    pub token: String,
    pub title: String,
    pub view: ViewMode,
    pub rows: Vec<BailDecisionData>,
    pub percentage: ChartSeries,
    pub cost: ChartSeries,
}

impl ResultsView {
    pub fn load(db: &Database, selections: Selections, view: ViewMode) -> Result<Self, DbError> {
        let filter = selections.filter();
        let (court, judge, charge) = filter.ids();

        let rows = db.bail_decisions(&filter, view)?;
        let title = format_specification_title(court, judge, charge, None, db);
        let percentage = ChartSeries::build(&rows, Metric::Percentage, view);
        let cost = ChartSeries::build(&rows, Metric::AverageCost, view);

        Ok(Self {
            token: selection::encode(&selections),
            selections,
            title,
            view,
            rows,
            percentage,
            cost,
        })
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, nav: &str, content: &str) -> String {
    LAYOUT_HTML
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{NAV}}", nav)
        .replace("{{CONTENT}}", content)
}

pub fn login_page(failed: bool) -> String {
    let error = if failed {
        r#"<p class="error">Incorrect password.</p>"#
    } else {
        ""
    };
    layout("Sign in", "", &LOGIN_HTML.replace("{{ERROR}}", error))
}

pub fn search_page(courts: &[NamedEntity], judges: &[NamedEntity], charges: &[Charge]) -> String {
    let mut rows = String::new();
    for i in 1..=MAX_SELECTIONS {
        let _ = write!(
            rows,
            r#"<div class="row">
            <select name="type{i}">
                <option value="">Any</option>
                <option value="court">Court</option>
                <option value="judge">Judge</option>
                <option value="charge">Charge</option>
            </select>
            <input type="number" name="value{i}" placeholder="ID">
        </div>"#
        );
    }

    let charge_items: String = charges
        .iter()
        .map(|c| match &c.severity {
            Some(sev) => format!("<li>{}: {} ({})</li>", c.charge_id, escape_html(&c.name), escape_html(sev)),
            None => format!("<li>{}: {}</li>", c.charge_id, escape_html(&c.name)),
        })
        .collect();

    let content = SEARCH_HTML
        .replace("{{SELECTION_ROWS}}", &rows)
        .replace("{{COURTS}}", &entity_items(courts))
        .replace("{{JUDGES}}", &entity_items(judges))
        .replace("{{CHARGES}}", &charge_items);

    layout("Search", SIGN_OUT_NAV, &content)
}

/// Inline failure message for HTML routes
pub fn error_page(message: &str) -> String {
    let content = format!(
        r#"<div class="card"><h2>Something went wrong</h2><p class="error">{}</p><p><a href="/">Back to search</a></p></div>"#,
        escape_html(message)
    );
    layout("Error", SIGN_OUT_NAV, &content)
}

fn entity_items(entities: &[NamedEntity]) -> String {
    entities
        .iter()
        .map(|e| format!("<li>{}: {}</li>", e.id, escape_html(&e.name)))
        .collect()
}

pub fn results_page(results: &ResultsView) -> String {
    let links: String = [ViewMode::Objective, ViewMode::Comparative]
        .iter()
        .map(|mode| {
            let class = if *mode == results.view { r#" class="active""# } else { "" };
            format!(
                r#"<a href="/results?selections={}&amp;view={}"{}>{}</a>"#,
                escape_html(&results.token),
                mode,
                class,
                capitalize(mode.as_str())
            )
        })
        .collect();

    let charts = format!("{}{}", chart_card(&results.percentage), chart_card(&results.cost));

    let content = RESULTS_HTML
        .replace("{{TITLE}}", &escape_html(&results.title))
        .replace("{{VIEW_LINKS}}", &links)
        .replace("{{CHARTS}}", &charts);

    layout(&results.title, SIGN_OUT_NAV, &content)
}

fn chart_card(series: &ChartSeries) -> String {
    let mut html = format!(r#"<div class="card"><h2>{}</h2>"#, escape_html(series.title));

    if series.values.is_empty() {
        html.push_str(r#"<p class="tooltip">No bail decisions match this search.</p>"#);
    } else {
        let max = series.max_magnitude();
        for ((label, value), tooltip) in series.labels.iter().zip(&series.values).zip(&series.tooltips) {
            let width = if max > 0.0 { value.abs() / max * 100.0 } else { 0.0 };
            let class = match series.view {
                ViewMode::Objective => "bar",
                ViewMode::Comparative if value.abs() < SAME_AS_AVERAGE_THRESHOLD => "bar",
                ViewMode::Comparative if *value > 0.0 => "bar above",
                ViewMode::Comparative => "bar below",
            };
            let _ = write!(
                html,
                r#"<div class="bar-row" title="{tip}"><span>{label}</span><div class="bar-track"><div class="{class}" style="width:{width:.1}%"></div></div><span class="tooltip">{tip}</span></div>"#,
                tip = escape_html(tooltip),
                label = escape_html(label),
            );
        }
    }

    html.push_str("</div>");
    html
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::seeded;
    use crate::selection::{Selection, SelectionKind};

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<b>"O'Neil" & co</b>"#), "&lt;b&gt;&quot;O&#39;Neil&quot; &amp; co&lt;/b&gt;");
    }

    #[test]
    fn test_escape_html_braces() {
        assert_eq!(escape_html("{{CONTENT}}"), "&#123;&#123;CONTENT&#125;&#125;");
    }

    #[test]
    fn test_placeholder_names_are_not_expanded() {
        let courts = vec![NamedEntity { id: 1, name: "{{CONTENT}}".into() }];
        let judges = vec![NamedEntity { id: 2, name: "{{CHARGES}}".into() }];
        let html = search_page(&courts, &judges, &[]);
        assert!(!html.contains("{{"));
        assert_eq!(html.matches("<html").count(), 1);
        assert!(html.contains("&#123;&#123;CONTENT&#125;&#125;"));
    }

    #[test]
    fn test_error_page() {
        let html = error_page("Database error <1>");
        assert!(html.contains(r#"<p class="error">Database error &lt;1&gt;</p>"#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_login_page_error() {
        assert!(login_page(true).contains("Incorrect password"));
        assert!(!login_page(false).contains("Incorrect password"));
        assert!(!login_page(false).contains("{{"));
    }

    #[test]
    fn test_search_page_lists_entities() {
        let db = seeded();
        let html = search_page(&db.courts().unwrap(), &db.judges().unwrap(), &db.charges().unwrap());
        assert!(html.contains("Municipal Court"));
        assert!(html.contains("Burglary (F2)"));
        assert!(html.contains(r#"name="type2""#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_results_view_global() {
        let db = seeded();
        let view = ResultsView::load(&db, Selections::default(), ViewMode::Objective).unwrap();
        assert_eq!(view.title, "Global");
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.percentage.labels.len(), 3);
        assert!(view.percentage.tooltips.iter().all(|t| t.ends_with("Bail Decisions")));
    }

    #[test]
    fn test_results_view_zero_cost_rows_keep_counts() {
        // ROR and Denied both average $0.00 globally
        let db = seeded();
        let view = ResultsView::load(&db, Selections::default(), ViewMode::Objective).unwrap();
        for (row, tooltip) in view.rows.iter().zip(&view.cost.tooltips) {
            assert!(
                tooltip.ends_with(&format!("| {} Bail Decisions", row.count)),
                "{} got {}",
                row.kind,
                tooltip
            );
        }
    }

    #[test]
    fn test_results_page_comparative() {
        let db = seeded();
        let selections = Selections::from_pair(
            Selection::new(SelectionKind::Court, 1),
            Selection::new(SelectionKind::Judge, 10),
        );
        let view = ResultsView::load(&db, selections, ViewMode::Comparative).unwrap();
        assert_eq!(view.title, "Hon. Smith | Municipal Court");

        let html = results_page(&view);
        assert!(html.contains("Hon. Smith | Municipal Court"));
        assert!(html.contains("above average"));
        assert!(html.contains(r#"class="active">Comparative"#));
        assert!(html.contains(&view.token));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_results_page_no_matches() {
        let db = seeded();
        let selections = Selections::new(vec![Selection::new(SelectionKind::Court, 99)]).unwrap();
        let view = ResultsView::load(&db, selections, ViewMode::Objective).unwrap();
        assert_eq!(view.title, "Court #99");
        assert!(results_page(&view).contains("No bail decisions match"));
    }
}
