use crate::document::InlineDocument;
use log::{info, warn};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyCategory {
    #[schemars(description = "Annual report for smaller companies (K2)")]
    IndividualK2,

    #[schemars(description = "Annual report under the main framework (K3)")]
    IndividualK3,

    #[schemars(description = "Consolidated accounts under K3 (K3K)")]
    ConsolidatedK3K,

    AuditReport,

    Certification,

    #[schemars(description = "Certification of adoption for ESEF filings")]
    CertificationEsef,
}

impl TaxonomyCategory {
    /// Path segment used in taxonomy identifiers and entry points.
    pub fn code(&self) -> &'static str {
        match self {
            TaxonomyCategory::IndividualK2 => "k2",
            TaxonomyCategory::IndividualK3 => "k3",
            TaxonomyCategory::ConsolidatedK3K => "k3k",
            TaxonomyCategory::AuditReport => "ar",
            TaxonomyCategory::Certification | TaxonomyCategory::CertificationEsef => "ci",
        }
    }

    pub fn is_consolidated(&self) -> bool {
        matches!(self, TaxonomyCategory::ConsolidatedK3K)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct TaxonomyInfo {
    pub version: String,
    pub category: TaxonomyCategory,
    pub entry_point: String,
    pub archived: bool,
    pub warning: Option<String>,
}

impl TaxonomyInfo {
    /// Registry key, "{category}/{version}".
    pub fn key(&self) -> String {
        format!("{}/{}", self.category.code(), self.version)
    }
}

fn entry(category: TaxonomyCategory, version: &str, entry_point: &str) -> TaxonomyInfo {
    TaxonomyInfo {
        version: version.to_string(),
        category,
        entry_point: entry_point.to_string(),
        archived: false,
        warning: None,
    }
}

fn archived(category: TaxonomyCategory, version: &str, entry_point: &str, label: &str) -> TaxonomyInfo {
    TaxonomyInfo {
        archived: true,
        warning: Some(format!(
            "WARNING: {} {} is archived and has not been accepted for filing since 2023",
            label, version
        )),
        ..entry(category, version, entry_point)
    }
}

static REGISTRY: Lazy<Vec<TaxonomyInfo>> = Lazy::new(|| {
    use TaxonomyCategory::*;
    vec![
        entry(IndividualK2, "2024-09-12", "se/fr/gaap/k2/2024-09-12"),
        entry(IndividualK2, "2021-10-31", "se/fr/gaap/k2/2021-10-31"),
        archived(IndividualK2, "2017-09-30", "se/fr/gaap/k2/2017-09-30", "K2"),
        entry(IndividualK3, "2021-10-31", "se/fr/gaap/k3/2021-10-31"),
        entry(IndividualK3, "2020-12-01", "se/fr/gaap/k3/2020-12-01"),
        archived(IndividualK3, "2018-12-17", "se/fr/gaap/k3/2018-12-17", "K3"),
        entry(ConsolidatedK3K, "2021-10-31", "se/fr/gaap/k3k/2021-10-31"),
        entry(ConsolidatedK3K, "2020-12-01", "se/fr/gaap/k3k/2020-12-01"),
        entry(AuditReport, "2020-12-01", "se/fr/ar/2020-12-01"),
        entry(CertificationEsef, "2022-09-01", "se/fr/ci/2022-09-01"),
        entry(Certification, "2020-12-01", "se/fr/ci/2020-12-01"),
    ]
});

/// Concepts that only appear in consolidated accounts, per group attribute, in priority order.
pub const GROUP_CONCEPTS: &[(&str, &[&str])] = &[
    ("revenue", &["KoncernensNettoomsattning", "NettoomsattningKoncern"]),
    ("operating_result", &["KoncernensRorelseresultat", "RorelseresultatKoncern"]),
    (
        "result_after_financial_items",
        &["KoncernensResultatEfterFinansiellaPoster"],
    ),
    ("net_income", &["KoncernensAretsResultat", "AretsResultatKoncern"]),
    ("goodwill", &["Goodwill", "KoncernmassigGoodwill"]),
    ("equity", &["KoncernensEgetKapital", "EgetKapitalKoncern"]),
    (
        "minority_interest",
        &["MinoritetsandelEgetKapital", "Minoritetsintresse"],
    ),
    ("total_assets", &["KoncernensSummaTillgangar", "TillgangarKoncern"]),
];

/// The curated taxonomy table, in declaration order.
pub fn registry() -> &'static [TaxonomyInfo] {
    &REGISTRY
}

/// Every registered taxonomy the lowercased document text mentions, by registry key (with
/// "/" or "-") or by entry point. A document may declare several at once.
pub fn detect_taxonomies(lowered_source: &str) -> Vec<TaxonomyInfo> {
    let matches: Vec<TaxonomyInfo> = registry()
        .iter()
        .filter(|info| {
            let key = info.key();
            lowered_source.contains(&key)
                || lowered_source.contains(&key.replace('/', "-"))
                || lowered_source.contains(&info.entry_point.to_lowercase())
        })
        .cloned()
        .collect();

    for info in matches.iter().filter(|info| info.archived) {
        warn!("Document uses archived taxonomy {}", info.key());
    }
    info!(
        "Detected taxonomies: {:?}",
        matches.iter().map(TaxonomyInfo::key).collect::<Vec<_>>()
    );

    matches
}

pub fn taxonomy_warnings(matches: &[TaxonomyInfo]) -> Vec<String> {
    matches
        .iter()
        .filter(|info| info.archived)
        .filter_map(|info| info.warning.clone())
        .collect()
}

/// True if a consolidated taxonomy was detected or any group-only concept carries a value.
/// Leans towards false positives: group figures read as individual figures is the worse error.
pub fn is_consolidated(document: &InlineDocument, matches: &[TaxonomyInfo]) -> bool {
    if matches.iter().any(|info| info.category.is_consolidated()) {
        return true;
    }

    GROUP_CONCEPTS
        .iter()
        .flat_map(|(_, concepts)| concepts.iter())
        .any(|concept| document.value(concept, None).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keys_are_unique() {
        let mut keys: Vec<String> = registry().iter().map(TaxonomyInfo::key).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_archived_entry_point_detected_once() {
        let doc = r#"<link:schemaRef xlink:href="http://www.taxonomier.se/se/fr/gaap/k2/2017-09-30/se-k2-type-2017-09-30.xsd"/>"#
            .to_lowercase();
        let matches = detect_taxonomies(&doc);
        let archived: Vec<_> = matches.iter().filter(|m| m.archived).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(archived.len(), 1);
        assert!(archived[0].warning.as_deref().is_some_and(|w| !w.is_empty()));
        assert_eq!(taxonomy_warnings(&matches).len(), 1);
    }

    #[test]
    fn test_dash_form_of_key_matches() {
        let matches = detect_taxonomies("entrypoint: k3k-2021-10-31");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].category, TaxonomyCategory::ConsolidatedK3K);
    }

    #[test]
    fn test_multiple_taxonomies_accumulate() {
        let doc = "se/fr/gaap/k2/2021-10-31 se/fr/ar/2020-12-01 se/fr/ci/2022-09-01";
        let matches = detect_taxonomies(doc);
        let categories: Vec<_> = matches.iter().map(|m| m.category).collect();
        assert_eq!(
            categories,
            vec![
                TaxonomyCategory::IndividualK2,
                TaxonomyCategory::AuditReport,
                TaxonomyCategory::CertificationEsef
            ]
        );
        assert!(taxonomy_warnings(&matches).is_empty());
    }

    #[test]
    fn test_unrecognized_document_yields_no_matches() {
        assert!(detect_taxonomies("<html><body>no identifiers here</body></html>").is_empty());
    }

    #[test]
    fn test_consolidated_by_taxonomy_or_concept() {
        let plain = InlineDocument::from_facts(Vec::new(), "");
        let k3k = detect_taxonomies("se/fr/gaap/k3k/2020-12-01");
        assert!(is_consolidated(&plain, &k3k));
        assert!(!is_consolidated(&plain, &[]));
    }
}
