//! Search selections and their URL token
//!
//! A search is described by up to two selections, each naming an entity kind
//! (court, judge or charge) and its ID. The search form turns them into a
//! single token for `/results?selections=<token>`:
//!
//! ```
//! use courtlens::selection::{self, Selection, SelectionKind, Selections};
//!
//! let picked = Selections::from_pair(
//!     Selection::new(SelectionKind::Court, 3),
//!     Selection::empty(),
//! );
//! let token = selection::encode(&picked);
//! assert_eq!(selection::decode(&token), picked);
//! ```
//!
//! The token is JSON encoded with the URL-safe Base64 alphabet. Decoding never
//! fails: anything that isn't a well-formed token becomes the empty selection
//! set, since the value comes straight from a query string.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of selections a search can carry
pub const MAX_SELECTIONS: usize = 2;

/// Entity kind a selection filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    Court,
    Judge,
    Charge,
}

impl SelectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionKind::Court => "court",
            SelectionKind::Judge => "judge",
            SelectionKind::Charge => "charge",
        }
    }
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "court" => Ok(SelectionKind::Court),
            "judge" => Ok(SelectionKind::Judge),
            "charge" => Ok(SelectionKind::Charge),
            other => Err(format!("unknown selection type '{}'", other)),
        }
    }
}

/// One user choice. Either field may be unset while the form is being filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    #[serde(rename = "type", default)]
    pub kind: Option<SelectionKind>,
    #[serde(default)]
    pub value: Option<i32>,
}

impl Selection {
    pub fn new(kind: SelectionKind, value: i32) -> Self {
        Self { kind: Some(kind), value: Some(value) }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Both the kind and the value are set
    pub fn is_valid(&self) -> bool {
        self.kind.is_some() && self.value.is_some()
    }
}

/// Ordered sequence of at most [`MAX_SELECTIONS`] slots. A slot is either a
/// selection or `null` when that row of the form was never touched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Selections(Vec<Option<Selection>>);

impl Selections {
    /// Returns `None` if more than [`MAX_SELECTIONS`] entries are given
    pub fn new(entries: Vec<Selection>) -> Option<Self> {
        Self::from_slots(entries.into_iter().map(Some).collect())
    }

    /// Like [`Selections::new`], but slots may be null
    pub fn from_slots(slots: Vec<Option<Selection>>) -> Option<Self> {
        if slots.len() > MAX_SELECTIONS {
            None
        } else {
            Some(Self(slots))
        }
    }

    /// The two-slot form the search page submits
    pub fn from_pair(first: Selection, second: Selection) -> Self {
        Self(vec![Some(first), Some(second)])
    }

    pub fn as_slice(&self) -> &[Option<Selection>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selections with both fields set, in order
    pub fn valid(&self) -> impl Iterator<Item = &Selection> {
        self.0.iter().flatten().filter(|s| s.is_valid())
    }

    /// Query filter built from the valid selections. A later selection of the
    /// same kind replaces an earlier one.
    pub fn filter(&self) -> Filter {
        let mut filter = Filter::default();
        for s in self.valid() {
            if let (Some(kind), Some(id)) = (s.kind, s.value) {
                match kind {
                    SelectionKind::Court => filter.court = Some(id),
                    SelectionKind::Judge => filter.judge = Some(id),
                    SelectionKind::Charge => filter.charge = Some(id),
                }
            }
        }
        filter
    }
}

/// Optional entity IDs restricting the bail decisions that are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filter {
    pub court: Option<i32>,
    pub judge: Option<i32>,
    pub charge: Option<i32>,
}

impl Filter {
    /// No restriction at all
    pub fn is_global(&self) -> bool {
        self.court.is_none() && self.judge.is_none() && self.charge.is_none()
    }

    /// IDs in title-formatter form, where 0 means unspecified
    pub fn ids(&self) -> (i32, i32, i32) {
        (
            self.court.unwrap_or(0),
            self.judge.unwrap_or(0),
            self.charge.unwrap_or(0),
        )
    }
}

/// Encode selections into a URL-safe token
pub fn encode(selections: &Selections) -> String {
    // Serializing plain enums and integers cannot fail
    let json = serde_json::to_vec(selections).unwrap_or_else(|_| b"[]".to_vec());
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode a token produced by [`encode`].
///
/// Standard-alphabet and padded tokens are accepted too. A `+` that arrived
/// through form decoding as a space is tolerated.
pub fn decode(token: &str) -> Selections {
    try_decode(token).unwrap_or_default()
}

fn try_decode(token: &str) -> Option<Selections> {
    let normalized: String = token
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' | ' ' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes()).ok()?;
    let slots: Vec<Option<Selection>> = serde_json::from_slice(&bytes).ok()?;
    Selections::from_slots(slots)
}
