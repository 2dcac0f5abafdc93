use crate::document::{FactKind, InlineDocument};
use crate::schema::{Person, RoleKind, Roster, SignatoryFamily};
use log::debug;
use std::collections::HashSet;

struct FamilyPatterns {
    family: SignatoryFamily,
    first_name: &'static str,
    last_name: &'static str,
    role: Option<&'static str>,
    default_role: &'static str,
}

/// Scanned in this order; the first occurrence of a duplicate wins.
const FAMILIES: [FamilyPatterns; 3] = [
    FamilyPatterns {
        family: SignatoryFamily::Certification,
        first_name: "UnderskriftFaststallelseintygForetradareTilltalsnamn",
        last_name: "UnderskriftFaststallelseintygForetradareEfternamn",
        role: Some("UnderskriftFaststallelseintygForetradareForetradarroll"),
        default_role: "Representative",
    },
    FamilyPatterns {
        family: SignatoryFamily::Filing,
        first_name: "UnderskriftHandlingTilltalsnamn",
        last_name: "UnderskriftHandlingEfternamn",
        role: None,
        default_role: "Board member",
    },
    FamilyPatterns {
        family: SignatoryFamily::AuditReport,
        first_name: "UnderskriftRevisionsberattelseRevisorTilltalsnamn",
        last_name: "UnderskriftRevisionsberattelseRevisorEfternamn",
        role: Some("UnderskriftRevisionsberattelseRevisorTitel"),
        default_role: "Auditor",
    },
];

/// Signatories of one tag family. The first-name tag anchors each record; last name and
/// role come from siblings sharing its group reference. Without a group reference the
/// secondary fields stay empty and the role falls back to the family default.
pub fn signatories(document: &InlineDocument, family: SignatoryFamily) -> Vec<Person> {
    let Some(patterns) = FAMILIES.iter().find(|p| p.family == family) else {
        return Vec::new();
    };

    document
        .find_all(patterns.first_name, FactKind::Text)
        .filter_map(|anchor| {
            let first_name = anchor.text();
            if first_name.is_empty() {
                return None;
            }

            let (last_name, title) = match anchor.tuple_ref.as_deref() {
                Some(tuple_ref) => {
                    let last_name = document
                        .tuple_member(tuple_ref, patterns.last_name)
                        .map(|f| f.text())
                        .unwrap_or_default();
                    let title = patterns
                        .role
                        .and_then(|pattern| document.tuple_member(tuple_ref, pattern))
                        .map(|f| f.text())
                        .filter(|t| !t.is_empty());
                    (last_name, title)
                }
                None => {
                    debug!("Signatory '{}' has no group reference", first_name);
                    (String::new(), None)
                }
            };

            Some(Person {
                first_name,
                last_name,
                role: title
                    .clone()
                    .unwrap_or_else(|| patterns.default_role.to_string()),
                title,
                family,
            })
        })
        .collect()
}

/// All signatories across the three families, deduplicated on (first name, last name, role).
/// The same name under a different role stays a separate record.
pub fn persons(document: &InlineDocument) -> Vec<Person> {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut result = Vec::new();

    for patterns in &FAMILIES {
        for person in signatories(document, patterns.family) {
            let key = (
                person.first_name.clone(),
                person.last_name.clone(),
                person.role.clone(),
            );
            if seen.insert(key) {
                result.push(person);
            }
        }
    }

    result
}

/// Splits signatories into board, auditors and CEO. A board entry whose role names a CEO
/// is moved out as CEO; a chair goes first on the board. Each name appears at most once
/// per list, keeping the first (most specific) record found.
pub fn roster(document: &InlineDocument) -> Roster {
    let mut roster = Roster::default();
    let mut board_names: HashSet<(String, String)> = HashSet::new();
    let mut auditor_names: HashSet<(String, String)> = HashSet::new();

    for person in persons(document) {
        let name = (person.first_name.clone(), person.last_name.clone());
        match person.role_kind() {
            RoleKind::Auditor => {
                if auditor_names.insert(name) {
                    roster.auditors.push(person);
                }
            }
            RoleKind::Ceo if roster.ceo.is_none() => {
                board_names.insert(name);
                roster.ceo = Some(person);
            }
            RoleKind::Chair => {
                if board_names.insert(name) {
                    roster.board.insert(0, person);
                }
            }
            _ => {
                if board_names.insert(name) {
                    roster.board.push(person);
                }
            }
        }
    }

    debug!(
        "Roster: {} board members, {} auditors, CEO present: {}",
        roster.board.len(),
        roster.auditors.len(),
        roster.ceo.is_some()
    );

    roster
}
