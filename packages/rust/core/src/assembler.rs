//! Service block assembly.
//!
//! Turns the ordered `category_servicename` identifiers of a request into
//! one scope-of-services text block: services grouped by category in
//! first-seen order, each group introduced by the category's upper-cased
//! display name and followed by the services' clause texts.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use contractgen_clauses::ClauseStore;
use contractgen_shared::ReferenceData;

/// One selected service and its clause text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEntry {
    /// Identifier as submitted, e.g. `it_app_development`.
    pub id: String,
    pub category: String,
    pub service: String,
    /// Clause text, empty when the clause is missing.
    pub clause: String,
}

/// All selected services of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceGroup {
    pub category: String,
    /// Upper-cased category display name.
    pub header: String,
    pub entries: Vec<ServiceEntry>,
}

/// The assembled scope of services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceBlock {
    pub groups: Vec<ServiceGroup>,
    /// Headers and clauses joined by blank lines.
    pub text: String,
}

impl ServiceBlock {
    /// Category headers in block order.
    pub fn headers(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.header.clone()).collect()
    }

    /// Well-formed, de-duplicated identifiers in block order.
    pub fn service_ids(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| g.entries.iter().map(|e| e.id.clone()))
            .collect()
    }
}

/// Split `category_servicename` on the first `_`.
///
/// Returns `None` when there is no separator or either half is empty.
pub fn parse_service_id(id: &str) -> Option<(&str, &str)> {
    let (category, service) = id.trim().split_once('_')?;
    if category.is_empty() || service.is_empty() {
        return None;
    }
    Some((category, service))
}

/// Builds [`ServiceBlock`]s from a clause store.
#[derive(Clone)]
pub struct ServiceBlockAssembler {
    clauses: Arc<dyn ClauseStore>,
    reference: Arc<ReferenceData>,
}

impl ServiceBlockAssembler {
    pub fn new(clauses: Arc<dyn ClauseStore>, reference: Arc<ReferenceData>) -> Self {
        Self { clauses, reference }
    }

    /// Assemble the block for `services`. Malformed identifiers are dropped;
    /// repeats keep their first position.
    #[instrument(skip_all, fields(requested = services.len()))]
    pub fn assemble(&self, services: &[String]) -> ServiceBlock {
        let mut groups: Vec<ServiceGroup> = Vec::new();
        let mut seen = HashSet::new();

        for raw in services {
            let id = raw.trim();
            let Some((category, service)) = parse_service_id(id) else {
                debug!(id, "dropping malformed service identifier");
                continue;
            };
            if !seen.insert(id.to_string()) {
                debug!(id, "dropping repeated service identifier");
                continue;
            }

            let clause = self
                .clauses
                .load_or_empty(&format!("{category}/{service}"))
                .trim_end()
                .to_string();

            let entry = ServiceEntry {
                id: id.to_string(),
                category: category.to_string(),
                service: service.to_string(),
                clause,
            };

            match groups.iter_mut().find(|g| g.category == category) {
                Some(group) => group.entries.push(entry),
                None => groups.push(ServiceGroup {
                    category: category.to_string(),
                    header: self.header_for(category),
                    entries: vec![entry],
                }),
            }
        }

        let text = render_text(&groups);
        debug!(groups = groups.len(), chars = text.len(), "service block assembled");
        ServiceBlock { groups, text }
    }

    fn header_for(&self, category: &str) -> String {
        match self.reference.category(category) {
            Some(c) => c.display_name.to_uppercase(),
            None => category.to_uppercase(),
        }
    }
}

impl std::fmt::Debug for ServiceBlockAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBlockAssembler").finish_non_exhaustive()
    }
}

fn render_text(groups: &[ServiceGroup]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for group in groups {
        parts.push(&group.header);
        parts.extend(
            group
                .entries
                .iter()
                .map(|e| e.clause.as_str())
                .filter(|c| !c.is_empty()),
        );
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use contractgen_clauses::MemoryClauseStore;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn assembler() -> ServiceBlockAssembler {
        let store = MemoryClauseStore::new()
            .with("it/app_development", "App Development:\n- Build the app.\n")
            .with("it/support", "IT Support:\n- Helpdesk.")
            .with("finance/bookkeeping", "Bookkeeping:\n- Ledgers.");
        ServiceBlockAssembler::new(Arc::new(store), Arc::new(ReferenceData::builtin()))
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn groups_in_first_seen_order() {
        let block =
            assembler().assemble(&ids(&["it_app_development", "finance_bookkeeping", "it_support"]));

        let categories: Vec<&str> = block.groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(categories, vec!["it", "finance"]);
        assert_eq!(
            block.service_ids(),
            vec!["it_app_development", "it_support", "finance_bookkeeping"]
        );
        assert_eq!(
            block.text,
            "IT / SOFTWARE\n\nApp Development:\n- Build the app.\n\nIT Support:\n- Helpdesk.\n\n\
             FINANCE & ACCOUNTING\n\nBookkeeping:\n- Ledgers."
        );
    }

    #[test]
    fn malformed_identifiers_are_dropped() {
        let block = assembler().assemble(&ids(&["support", "it_support", "_x", "it_", ""]));
        assert_eq!(block.service_ids(), vec!["it_support"]);
    }

    #[test]
    fn missing_clause_contributes_nothing() {
        let block = assembler().assemble(&ids(&["hr_payroll"]));
        assert_eq!(block.text, "HR & PAYROLL");
        assert_eq!(block.groups[0].entries[0].clause, "");
    }

    #[test]
    fn unknown_category_uses_raw_key() {
        let block = assembler().assemble(&ids(&["legal_review"]));
        assert_eq!(block.headers(), vec!["LEGAL"]);
    }

    #[test]
    fn repeats_keep_first_position() {
        let block = assembler().assemble(&ids(&["it_support", "finance_bookkeeping", "it_support"]));
        assert_eq!(block.service_ids(), vec!["it_support", "finance_bookkeeping"]);
    }

    #[test]
    fn service_name_may_contain_separator() {
        assert_eq!(
            parse_service_id("it_app_development"),
            Some(("it", "app_development"))
        );
    }

    fn service_id() -> impl Strategy<Value = String> {
        prop_oneof![
            "(it|finance|hr|business)_[a-z]{1,8}",
            "[a-z]{1,8}",
        ]
    }

    proptest! {
        #[test]
        fn drops_exactly_the_malformed_and_keeps_order(list in prop::collection::vec(service_id(), 0..12)) {
            let block = assembler().assemble(&list);

            let mut expected: Vec<String> = Vec::new();
            for id in &list {
                if parse_service_id(id).is_some() && !expected.contains(id) {
                    expected.push(id.clone());
                }
            }

            // Within each category the relative order is preserved.
            let produced = block.service_ids();
            prop_assert_eq!(produced.len(), expected.len());
            for group in &block.groups {
                let in_group: Vec<&String> = expected
                    .iter()
                    .filter(|id| id.starts_with(&format!("{}_", group.category)))
                    .collect();
                let got: Vec<&String> = group.entries.iter().map(|e| &e.id).collect();
                prop_assert_eq!(got, in_group);
            }
        }
    }
}
