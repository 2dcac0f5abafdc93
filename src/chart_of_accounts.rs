use crate::document::{FactKind, InlineDocument};
use crate::utils::local_name;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Taxonomy concept to BAS account range. Declaration order decides fuzzy matches.
pub const BAS_ACCOUNT_RANGES: &[(&str, &str)] = &[
    // intangible and tangible fixed assets
    ("ImmateriellaAnlaggningstillgangar", "10xx"),
    ("BalanseradeUtgifterUtvecklingsarbetenLiknande", "1010-1019"),
    ("Goodwill", "1050-1059"),
    ("MateriellaAnlaggningstillgangar", "11xx-12xx"),
    ("ByggnaderMark", "11xx"),
    ("MaskinerAndraTekniskaAnlaggningar", "12xx"),
    ("InventarierVerktygInstallationer", "1220-1229"),
    // financial fixed assets and current assets
    ("FinansiellaAnlaggningstillgangar", "13xx"),
    ("AndelarKoncernforetag", "1310-1319"),
    ("VarulagerMm", "14xx"),
    ("Kundfordringar", "1510-1519"),
    ("KassaBank", "19xx"),
    // equity
    ("Aktiekapital", "2081"),
    ("BalanseratResultat", "2091-2098"),
    ("AretsResultatEgetKapital", "2099"),
    // liabilities
    ("LangfristigaSkulder", "23xx-24xx"),
    ("KortfristigaSkulder", "25xx-29xx"),
    ("Leverantorsskulder", "2440-2449"),
    // income statement
    ("Nettoomsattning", "30xx-37xx"),
    ("OvrigaRorelseintakter", "39xx"),
    ("HandelsvarorKostnader", "40xx-49xx"),
    ("OvrigaExternaKostnader", "50xx-69xx"),
    ("Personalkostnader", "70xx-76xx"),
    (
        "AvskrivningarNedskrivningarMateriellaImmateriellaAnlaggningstillgangar",
        "78xx",
    ),
    ("FinansiellaIntakter", "80xx-82xx"),
    ("FinansiellaKostnader", "83xx-84xx"),
    ("SkattAretsResultat", "89xx"),
];

/// BAS account range for a concept. An exact name match wins; otherwise the first table
/// entry whose key contains the concept or is contained in it (ignoring case).
pub fn bas_account_range(concept: &str) -> Option<&'static str> {
    let name = local_name(concept);

    if let Some((_, range)) = BAS_ACCOUNT_RANGES.iter().find(|(key, _)| *key == name) {
        return Some(range);
    }

    let lowered = name.to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    BAS_ACCOUNT_RANGES
        .iter()
        .find(|(key, _)| {
            let key = key.to_lowercase();
            lowered.contains(&key) || key.contains(&lowered)
        })
        .map(|(_, range)| *range)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct BasMapping {
    pub concept: String,
    pub value: f64,

    #[schemars(description = "BAS account range, e.g. '19xx' or '1510-1519'")]
    pub account_range: String,

    pub context_id: Option<String>,
}

/// Numeric facts of one document placed in the BAS chart. Coverage is partial: facts
/// without a value or without a table entry are left out.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ChartOfAccounts {
    pub mappings: Vec<BasMapping>,
}

impl ChartOfAccounts {
    pub fn from_document(document: &InlineDocument) -> Self {
        let mappings: Vec<BasMapping> = document
            .facts()
            .iter()
            .filter(|fact| fact.kind == FactKind::Numeric)
            .filter_map(|fact| {
                let account_range = bas_account_range(&fact.concept)?;
                let value = fact.numeric_value()?;
                Some(BasMapping {
                    concept: fact.local_name().to_string(),
                    value,
                    account_range: account_range.to_string(),
                    context_id: fact.context_id.clone(),
                })
            })
            .collect();

        debug!("Mapped {} numeric facts to BAS account ranges", mappings.len());

        Self { mappings }
    }

    /// Mappings for a single context, in document order.
    pub fn for_context<'a>(&'a self, context_id: &'a str) -> impl Iterator<Item = &'a BasMapping> + 'a {
        self.mappings
            .iter()
            .filter(move |m| m.context_id.as_deref() == Some(context_id))
    }

    pub fn total_accounts(&self) -> usize {
        self.mappings.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("Account Range,Concept,Context,Value\n");

        for mapping in &self.mappings {
            output.push_str(&format!(
                "{},{},{},{}\n",
                mapping.account_range,
                mapping.concept,
                mapping.context_id.as_deref().unwrap_or(""),
                mapping.value
            ));
        }

        output
    }

    pub fn to_markdown(&self, company_name: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("# BAS Chart of Accounts - {}\n\n", company_name));
        output.push_str("| Account Range | Concept | Context | Value |\n");
        output.push_str("|---|---|---|---|\n");

        for mapping in &self.mappings {
            output.push_str(&format!(
                "| {} | {} | {} | {:.0} |\n",
                mapping.account_range,
                mapping.concept,
                mapping.context_id.as_deref().unwrap_or("-"),
                mapping.value
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> ChartOfAccounts {
        let doc = InlineDocument::parse(
            r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"><body>
                 <ix:nonFraction name="se-gen-base:KassaBank" contextRef="balans0">120 000</ix:nonFraction>
                 <ix:nonFraction name="se-gen-base:KassaBank" contextRef="balans1">80 000</ix:nonFraction>
                 <ix:nonFraction name="se-gen-base:MedelantalAnstallda" contextRef="period0">4</ix:nonFraction>
                 <ix:nonFraction name="se-gen-base:Kundfordringar" contextRef="balans0">n/a</ix:nonFraction>
                 <ix:nonNumeric name="se-gen-base:Nettoomsattning" contextRef="period0">text</ix:nonNumeric>
               </body></html>"#,
        )
        .unwrap();
        ChartOfAccounts::from_document(&doc)
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(bas_account_range("KassaBank"), Some("19xx"));
        assert_eq!(bas_account_range("se-gen-base:Goodwill"), Some("1050-1059"));
        assert_eq!(bas_account_range("ImmateriellaAnlaggningstillgangar"), Some("10xx"));
    }

    #[test]
    fn test_fuzzy_match_both_directions() {
        assert_eq!(bas_account_range("KassaBankExklRedovisningsmedel"), Some("19xx"));
        assert_eq!(bas_account_range("kundfordringar"), Some("1510-1519"));
        assert_eq!(bas_account_range("Leverantor"), Some("2440-2449"));
    }

    #[test]
    fn test_fuzzy_match_takes_first_declared_entry() {
        assert_eq!(bas_account_range("Mark"), Some("11xx"));
        assert_eq!(bas_account_range("Resultat"), Some("2091-2098"));
    }

    #[test]
    fn test_unknown_concept_is_unmapped() {
        assert_eq!(bas_account_range("MedelantalAnstallda"), None);
        assert_eq!(bas_account_range(""), None);
    }

    #[test]
    fn test_from_document_skips_unmapped_and_unreadable() {
        let chart = chart();
        assert_eq!(chart.total_accounts(), 2);
        assert_eq!(chart.mappings[0].account_range, "19xx");
        assert_eq!(chart.mappings[0].value, 120_000.0);
        assert_eq!(chart.for_context("balans1").count(), 1);
    }

    #[test]
    fn test_chart_exports() {
        let chart = chart();
        let csv = chart.to_csv();
        assert!(csv.starts_with("Account Range,Concept,Context,Value\n"));
        assert!(csv.contains("19xx,KassaBank,balans0,120000"));

        let markdown = chart.to_markdown("Exempel AB");
        assert!(markdown.contains("# BAS Chart of Accounts - Exempel AB"));
        assert!(markdown.contains("| 19xx | KassaBank | balans1 | 80000 |"));
    }
}
