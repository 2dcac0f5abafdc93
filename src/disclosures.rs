//! Narrative and signature sections of the report: management report, audit report,
//! certification of adoption and extended-information tagging.

use crate::document::{FactKind, InlineDocument};
use crate::people::signatories;
use crate::schema::SignatoryFamily;
use crate::taxonomy::{TaxonomyCategory, TaxonomyInfo};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Narrative text shorter than this is a heading or label, not content.
const TEXT_BLOCK_MIN_LEN: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ManagementReport {
    pub general_business: Option<String>,
    pub significant_events: Option<String>,
    pub expected_development: Option<String>,
    pub profit_appropriation: Option<String>,
}

impl ManagementReport {
    pub fn is_empty(&self) -> bool {
        self.general_business.is_none()
            && self.significant_events.is_none()
            && self.expected_development.is_none()
            && self.profit_appropriation.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditReportKind {
    #[default]
    Standard,
    Group,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct AuditReport {
    pub auditor_name: Option<String>,
    pub auditor_title: Option<String>,
    pub audit_firm: Option<String>,
    pub opinion_annual_report: Option<String>,
    pub opinion_management: Option<String>,

    #[schemars(description = "Only read when the document carries group accounts")]
    pub opinion_consolidated: Option<String>,

    pub basis_for_opinion: Option<String>,
    pub remarks: Vec<String>,
    pub date: Option<String>,
    pub place: Option<String>,

    #[schemars(description = "True when the report carries no remarks")]
    pub clean: bool,

    pub kind: AuditReportKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Certification {
    pub certification_date: Option<String>,
    pub agm_date: Option<String>,
    pub income_statement_adopted: bool,
    pub balance_sheet_adopted: bool,
    pub group_income_statement_adopted: Option<bool>,
    pub group_balance_sheet_adopted: Option<bool>,
    pub dividend_per_share: Option<f64>,
    pub dividend_total: Option<f64>,
    pub carried_forward: Option<f64>,

    #[schemars(description = "Signing representatives as 'first last'")]
    pub signatories: Vec<String>,

    #[schemars(description = "Filed under the ESEF certification taxonomy")]
    pub esef: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct UndefinedConcept {
    pub concept: String,
    pub value: Option<f64>,
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ChangedHeading {
    pub original: String,
    pub new: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct NoteLink {
    pub concept: String,
    pub note_number: String,
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ExtendedInformation {
    pub undefined_concepts: Vec<UndefinedConcept>,
    pub changed_headings: Vec<ChangedHeading>,
    pub note_links: Vec<NoteLink>,

    #[schemars(description = "False when the filer declares that the report contains untagged information")]
    pub fully_tagged: bool,
}

impl Default for ExtendedInformation {
    fn default() -> Self {
        Self {
            undefined_concepts: Vec::new(),
            changed_headings: Vec::new(),
            note_links: Vec::new(),
            fully_tagged: true,
        }
    }
}

fn first_block(document: &InlineDocument, patterns: &[&str]) -> Option<String> {
    patterns
        .iter()
        .find_map(|pattern| document.text_block(pattern, TEXT_BLOCK_MIN_LEN))
}

pub fn management_report(document: &InlineDocument) -> ManagementReport {
    ManagementReport {
        general_business: first_block(document, &["AllmanUppgiftVerksamhet", "VerksamhetenArt"]),
        significant_events: first_block(
            document,
            &["VasentligaHandelserRakenskapsaret", "VasentligaHandelser"],
        ),
        expected_development: first_block(document, &["ForvantadFramtidaUtveckling"]),
        profit_appropriation: first_block(
            document,
            &["ForslasResultatdisposition", "Resultatdisposition"],
        ),
    }
}

/// Structured audit report, or `None` when neither an auditor name nor a date is tagged.
pub fn audit_report(document: &InlineDocument, consolidated: bool) -> Option<AuditReport> {
    let text = |pattern: &str| document.text(pattern, None);

    let auditor_name = text("UnderskriftRevisionsberattelseRevisorTilltalsnamn").map(|first| {
        match text("UnderskriftRevisionsberattelseRevisorEfternamn") {
            Some(last) => format!("{} {}", first, last),
            None => first,
        }
    });
    let date = text("UnderskriftRevisionsberattelseDatum");

    if auditor_name.is_none() && date.is_none() {
        debug!("No audit report tagged");
        return None;
    }

    let remarks: Vec<String> = document
        .text_block("AnmarkningarRevisionsberattelse", TEXT_BLOCK_MIN_LEN)
        .into_iter()
        .collect();

    let (kind, opinion_consolidated) = if consolidated {
        (
            AuditReportKind::Group,
            first_block(document, &["RevisorsUttalandeOmKoncernredovisningen"]),
        )
    } else {
        (AuditReportKind::Standard, None)
    };

    Some(AuditReport {
        auditor_name,
        auditor_title: text("UnderskriftRevisionsberattelseRevisorTitel"),
        audit_firm: text("UnderskriftRevisionsberattelseRevisionsbolag"),
        opinion_annual_report: first_block(document, &["RevisorsUttalandeOmArsredovisningen"]),
        opinion_management: first_block(document, &["RevisorsUttalandeOmForvaltningen"]),
        opinion_consolidated,
        basis_for_opinion: first_block(document, &["GrundForUttalanden"]),
        clean: remarks.is_empty(),
        remarks,
        date,
        place: text("UnderskriftRevisionsberattelseOrt"),
        kind,
    })
}

/// Certification of adoption, or `None` when neither a certification date nor any
/// signatory is tagged.
pub fn certification(
    document: &InlineDocument,
    consolidated: bool,
    taxonomies: &[TaxonomyInfo],
) -> Option<Certification> {
    let certification_date = document.text("UnderskriftFaststallelseintygDatum", None);
    let signatories: Vec<String> = signatories(document, SignatoryFamily::Certification)
        .iter()
        .map(|person| person.full_name())
        .collect();

    if certification_date.is_none() && signatories.is_empty() {
        debug!("No certification of adoption tagged");
        return None;
    }

    let agm_date = document
        .text("ArsstammaDatum", None)
        .or_else(|| document.text("FastallelseintygDatum", None));
    let adopted = agm_date.is_some();

    Some(Certification {
        certification_date,
        agm_date,
        income_statement_adopted: adopted,
        balance_sheet_adopted: adopted,
        group_income_statement_adopted: consolidated.then_some(adopted),
        group_balance_sheet_adopted: consolidated.then_some(adopted),
        dividend_per_share: document.value("UtdelningPerAktie", None),
        dividend_total: document.value("Utdelning", None),
        carried_forward: document.value("BalanserasINyRakning", None),
        signatories,
        esef: taxonomies
            .iter()
            .any(|info| info.category == TaxonomyCategory::CertificationEsef),
    })
}

pub fn extended_information(document: &InlineDocument) -> ExtendedInformation {
    let undefined_concepts = document
        .find_all("OdefinieratBegrepp", FactKind::Numeric)
        .map(|fact| UndefinedConcept {
            concept: fact.concept.clone(),
            value: fact.numeric_value(),
            context_id: fact.context_id.clone(),
        })
        .collect();

    let changed_headings = document
        .find_all("AndradRubrik", FactKind::Text)
        .filter_map(|fact| {
            let tuple_ref = fact.tuple_ref.as_deref()?;
            let original = document.tuple_member(tuple_ref, "UrsprungligRubrik")?;
            let new = document.tuple_member(tuple_ref, "NyRubrik")?;
            Some(ChangedHeading {
                original: original.text(),
                new: new.text(),
            })
        })
        .collect();

    let note_links = document
        .find_all("Notkoppling", FactKind::Text)
        .map(|fact| NoteLink {
            concept: fact.concept.clone(),
            note_number: fact.text(),
            context_id: fact.context_id.clone(),
        })
        .collect();

    let fully_tagged = !document
        .text("ArsredovisningInnehallNotTaggadInformation", None)
        .is_some_and(|flag| flag.eq_ignore_ascii_case("true"));

    ExtendedInformation {
        undefined_concepts,
        changed_headings,
        note_links,
        fully_tagged,
    }
}
