//! Per-company grouping of extraction records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::record::ExtractionRecord;

/// One criticism attributed to a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub citation: String,
    pub criticized_by: String,
}

/// All criticisms of one company, in record order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyGroup {
    pub company: String,
    pub entries: Vec<SummaryEntry>,
}

/// Companies in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub groups: Vec<CompanyGroup>,
}

impl CompanySummary {
    /// Group for `company`, matched exactly.
    pub fn get(&self, company: &str) -> Option<&CompanyGroup> {
        self.groups.iter().find(|g| g.company == company)
    }

    /// Company names in rendering order.
    pub fn companies(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.company.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Result of summarizing a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
    NoCriticisms,
    Groups(CompanySummary),
}

impl SummaryOutcome {
    pub fn summary(&self) -> Option<&CompanySummary> {
        match self {
            SummaryOutcome::NoCriticisms => None,
            SummaryOutcome::Groups(summary) => Some(summary),
        }
    }
}

/// Group records by exact company name, keeping first-seen company order and
/// record order within each company. Records without a company are skipped.
pub fn summarize(records: &[ExtractionRecord]) -> SummaryOutcome {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<CompanyGroup> = Vec::new();

    for record in records {
        if record.company.is_empty() {
            continue;
        }

        let slot = *index.entry(record.company.as_str()).or_insert_with(|| {
            groups.push(CompanyGroup {
                company: record.company.clone(),
                entries: Vec::new(),
            });
            groups.len() - 1
        });

        groups[slot].entries.push(SummaryEntry {
            citation: record.citation.clone(),
            criticized_by: record.criticized_by.clone(),
        });
    }

    if groups.is_empty() {
        SummaryOutcome::NoCriticisms
    } else {
        SummaryOutcome::Groups(CompanySummary { groups })
    }
}
