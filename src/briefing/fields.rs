// src/briefing/fields.rs
//! Extraction of labelled sections (`LABEL:` at line start) from model output.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BriefingField {
    OverallSentiment,
    Confidence,
    Headline,
    MarketOverview,
    KeyMovers,
    SectorHighlights,
    MacroSignals,
    WatchList,
    AgentNotes,
}

impl BriefingField {
    pub const ALL: [BriefingField; 9] = [
        BriefingField::OverallSentiment,
        BriefingField::Confidence,
        BriefingField::Headline,
        BriefingField::MarketOverview,
        BriefingField::KeyMovers,
        BriefingField::SectorHighlights,
        BriefingField::MacroSignals,
        BriefingField::WatchList,
        BriefingField::AgentNotes,
    ];

    /// Multi-line sections, in body order.
    pub const SECTIONS: [BriefingField; 6] = [
        BriefingField::MarketOverview,
        BriefingField::KeyMovers,
        BriefingField::SectorHighlights,
        BriefingField::MacroSignals,
        BriefingField::WatchList,
        BriefingField::AgentNotes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BriefingField::OverallSentiment => "OVERALL_SENTIMENT",
            BriefingField::Confidence => "CONFIDENCE",
            BriefingField::Headline => "HEADLINE",
            BriefingField::MarketOverview => "MARKET_OVERVIEW",
            BriefingField::KeyMovers => "KEY_MOVERS",
            BriefingField::SectorHighlights => "SECTOR_HIGHLIGHTS",
            BriefingField::MacroSignals => "MACRO_SIGNALS",
            BriefingField::WatchList => "WATCH_LIST",
            BriefingField::AgentNotes => "AGENT_NOTES",
        }
    }

    /// Heading used in the briefing markdown body.
    pub fn title(&self) -> &'static str {
        match self {
            BriefingField::OverallSentiment => "Overall Sentiment",
            BriefingField::Confidence => "Confidence",
            BriefingField::Headline => "Headline",
            BriefingField::MarketOverview => "Market Overview",
            BriefingField::KeyMovers => "Key Movers",
            BriefingField::SectorHighlights => "Sector Highlights",
            BriefingField::MacroSignals => "Macro Signals",
            BriefingField::WatchList => "Watch List",
            BriefingField::AgentNotes => "Agent Notes",
        }
    }

    /// JSON key (`market_overview`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            BriefingField::OverallSentiment => "overall_sentiment",
            BriefingField::Confidence => "confidence",
            BriefingField::Headline => "headline",
            BriefingField::MarketOverview => "market_overview",
            BriefingField::KeyMovers => "key_movers",
            BriefingField::SectorHighlights => "sector_highlights",
            BriefingField::MacroSignals => "macro_signals",
            BriefingField::WatchList => "watch_list",
            BriefingField::AgentNotes => "agent_notes",
        }
    }

    pub fn is_single_line(&self) -> bool {
        matches!(
            self,
            BriefingField::OverallSentiment | BriefingField::Confidence | BriefingField::Headline
        )
    }

    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.title().eq_ignore_ascii_case(title.trim()))
    }
}

impl fmt::Display for BriefingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Values found in one model response. Absent labels have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BriefingFields {
    values: BTreeMap<BriefingField, String>,
}

impl BriefingFields {
    pub fn get(&self, field: BriefingField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Present and non-empty.
    pub fn text(&self, field: BriefingField) -> Option<&str> {
        self.get(field).filter(|v| !v.is_empty())
    }

    pub fn headline(&self) -> Option<&str> {
        self.text(BriefingField::Headline)
    }

    pub fn market_overview(&self) -> Option<&str> {
        self.text(BriefingField::MarketOverview)
    }

    pub fn key_movers(&self) -> Option<&str> {
        self.text(BriefingField::KeyMovers)
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.is_empty())
    }

    /// Requested labels that were absent or empty, in prompt order.
    pub fn missing(&self) -> Vec<BriefingField> {
        BriefingField::ALL
            .into_iter()
            .filter(|f| self.text(*f).is_none())
            .collect()
    }
}

fn match_label(line: &str) -> Option<(BriefingField, &str)> {
    BriefingField::ALL.into_iter().find_map(|f| {
        line.strip_prefix(f.label())
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|rest| (f, rest))
    })
}

/// Parse labelled sections out of free-form model output.
///
/// Single-line labels take the rest of their line. Multi-line labels take any
/// text on their own line plus every following line up to the next label.
/// Text before the first label is dropped, and so is text after a
/// single-line label until the next multi-line label opens.
pub fn parse_fields(text: &str) -> BriefingFields {
    let mut values: BTreeMap<BriefingField, String> = BTreeMap::new();
    let mut sections: BTreeMap<BriefingField, Vec<&str>> = BTreeMap::new();
    let mut current: Option<BriefingField> = None;

    for line in text.lines() {
        if let Some((field, rest)) = match_label(line) {
            let value = rest.trim();
            if field.is_single_line() {
                values.insert(field, value.to_string());
                current = None;
            } else {
                let buf = sections.entry(field).or_default();
                buf.clear();
                if !value.is_empty() {
                    buf.push(value);
                }
                current = Some(field);
            }
            continue;
        }
        if let Some(field) = current {
            sections.entry(field).or_default().push(line);
        }
    }

    for (field, lines) in sections {
        values.insert(field, lines.join("\n").trim().to_string());
    }
    BriefingFields { values }
}
