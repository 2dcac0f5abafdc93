//! Inline XBRL document model and fact locator.
//!
//! The document is parsed once into a flat list of [`Fact`]s (every `ix:nonFraction` and
//! `ix:nonNumeric` element, in document order). Lookups match concept names by
//! case-insensitive substring so that namespace prefixes (`se-gen-base:`, `se-cd-base:`)
//! and producer naming variance do not matter. A fact whose local name is exactly the
//! pattern is preferred; otherwise the first fact in document order wins.

use crate::error::Result;
use crate::numeric::{normalize, parse_decimals, NumericHints, Sign};
use crate::schema::PrecisionValue;
use crate::utils::{collapse_whitespace, local_name};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Fact {
    pub concept: String,
    pub kind: FactKind,
    pub context_id: Option<String>,
    pub raw_text: String,

    #[schemars(
        description = "Power-of-ten multiplier. 0 when the attribute is missing; absent when the attribute could not be read, in which case the fact never yields a value."
    )]
    pub scale: Option<i32>,

    pub decimals: Option<i32>,
    pub sign: Sign,
    pub format: String,
    pub unit: Option<String>,

    #[schemars(description = "Group reference linking the members of a composite record")]
    pub tuple_ref: Option<String>,
}

impl Fact {
    pub fn local_name(&self) -> &str {
        local_name(&self.concept)
    }

    pub fn matches(&self, lowered_pattern: &str) -> bool {
        self.concept.to_lowercase().contains(lowered_pattern)
    }

    pub fn hints(&self) -> Option<NumericHints<'_>> {
        Some(NumericHints {
            format: &self.format,
            scale: self.scale?,
            sign: self.sign,
            decimals: self.decimals,
        })
    }

    pub fn numeric_value(&self) -> Option<f64> {
        let hints = self.hints()?;
        let value = normalize(&self.raw_text, &hints);
        if value.is_none() {
            warn!(
                "Could not normalize numeric fact {} = '{}'",
                self.concept, self.raw_text
            );
        }
        value
    }

    pub fn text(&self) -> String {
        collapse_whitespace(&self.raw_text)
    }
}

#[derive(Debug, Clone)]
pub struct InlineDocument {
    facts: Vec<Fact>,
    lowered_source: String,
}

impl InlineDocument {
    /// Parses the document. Failing to read the markup at all is the only hard error the
    /// engine produces.
    pub fn parse(source: &str) -> Result<Self> {
        let mut options = roxmltree::ParsingOptions::default();
        options.allow_dtd = true;
        let tree = roxmltree::Document::parse_with_options(source, options)?;

        let facts: Vec<Fact> = tree
            .descendants()
            .filter(|node| node.is_element())
            .filter_map(|node| {
                let kind = match node.tag_name().name().to_ascii_lowercase().as_str() {
                    "nonfraction" => FactKind::Numeric,
                    "nonnumeric" => FactKind::Text,
                    _ => return None,
                };
                extract_fact(node, kind)
            })
            .collect();

        info!("Parsed inline document with {} tagged facts", facts.len());

        Ok(Self {
            facts,
            lowered_source: source.to_lowercase(),
        })
    }

    pub fn from_facts(facts: Vec<Fact>, source: &str) -> Self {
        Self {
            facts,
            lowered_source: source.to_lowercase(),
        }
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// The full markup, lowercased, for identifier scans.
    pub fn lowered_source(&self) -> &str {
        &self.lowered_source
    }

    /// First fact whose local name equals `pattern` (ignoring case), else the first whose
    /// concept contains it. Either way restricted to `kind` and, if given, the context.
    ///
    /// An exact local-name match wins even when it appears later in the document than a
    /// substring match: `Tillgangar` resolves to `se-gen-base:Tillgangar` rather than an
    /// earlier `se-gen-base:Omsattningstillgangar`. Without an exact match the lookup is
    /// plain document order.
    pub fn find(&self, pattern: &str, context: Option<&str>, kind: FactKind) -> Option<&Fact> {
        let lowered = pattern.to_lowercase();
        let mut candidates = self.facts.iter().filter(|fact| {
            fact.kind == kind
                && fact.matches(&lowered)
                && context.map_or(true, |ctx| fact.context_id.as_deref() == Some(ctx))
        });
        let first = candidates.next();
        let found = match first {
            Some(fact) if !fact.local_name().eq_ignore_ascii_case(pattern) => candidates
                .find(|fact| fact.local_name().eq_ignore_ascii_case(pattern))
                .or(first),
            other => other,
        };
        if found.is_none() {
            debug!("No {:?} fact matching '{}' in context {:?}", kind, pattern, context);
        }
        found
    }

    pub fn find_all<'a>(&'a self, pattern: &str, kind: FactKind) -> impl Iterator<Item = &'a Fact> + 'a {
        let lowered = pattern.to_lowercase();
        self.facts
            .iter()
            .filter(move |fact| fact.kind == kind && fact.matches(&lowered))
    }

    /// Numeric value of the first matching fact. Malformed text reads as absent.
    pub fn value(&self, pattern: &str, context: Option<&str>) -> Option<f64> {
        self.find(pattern, context, FactKind::Numeric)?.numeric_value()
    }

    /// Trimmed text of the first matching text fact; empty text reads as absent.
    pub fn text(&self, pattern: &str, context: Option<&str>) -> Option<String> {
        let text = self.find(pattern, context, FactKind::Text)?.text();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// First matching text fact whose content is longer than `min_len` characters.
    pub fn text_block(&self, pattern: &str, min_len: usize) -> Option<String> {
        self.find_all(pattern, FactKind::Text)
            .map(Fact::text)
            .find(|text| text.chars().count() > min_len)
    }

    pub fn value_with_precision(&self, pattern: &str, context: Option<&str>) -> Option<PrecisionValue> {
        let fact = self.find(pattern, context, FactKind::Numeric)?;
        let value = fact.numeric_value()?;
        Some(PrecisionValue {
            value,
            decimals: fact.decimals,
            scale: fact.scale.unwrap_or(0),
            unit: fact.unit.clone().unwrap_or_else(|| "SEK".to_string()),
            sign: fact.sign,
            format: fact.format.clone(),
        })
    }

    /// Sibling text fact of a composite record: same group reference, concept matching `pattern`.
    pub fn tuple_member(&self, tuple_ref: &str, pattern: &str) -> Option<&Fact> {
        let lowered = pattern.to_lowercase();
        self.facts.iter().find(|fact| {
            fact.kind == FactKind::Text
                && fact.tuple_ref.as_deref() == Some(tuple_ref)
                && fact.matches(&lowered)
        })
    }
}

fn extract_fact(node: roxmltree::Node, kind: FactKind) -> Option<Fact> {
    let concept = attribute(node, "name")?.trim().to_string();
    if concept.is_empty() {
        return None;
    }

    let scale = match attribute(node, "scale") {
        None => Some(0),
        Some(raw) => match raw.trim().parse::<i32>() {
            Ok(scale) => Some(scale),
            Err(_) => {
                warn!("Unreadable scale '{}' on {}", raw, concept);
                None
            }
        },
    };

    Some(Fact {
        kind,
        context_id: attribute(node, "contextref").map(str::to_string),
        raw_text: collect_text(node),
        scale,
        decimals: parse_decimals(attribute(node, "decimals")),
        sign: Sign::from_attribute(attribute(node, "sign")),
        format: attribute(node, "format").unwrap_or_default().to_string(),
        unit: attribute(node, "unitref").map(str::to_string),
        tuple_ref: attribute(node, "tupleref").map(str::to_string),
        concept,
    })
}

// attribute names are matched case-insensitively: HTML-serialized producers lowercase them
fn attribute<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.name().eq_ignore_ascii_case(name))
        .map(|attr| attr.value())
}

fn collect_text(node: roxmltree::Node) -> String {
    let mut text = String::new();
    push_text(node, &mut text);
    text
}

fn push_text(node: roxmltree::Node, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            if let Some(t) = child.text() {
                out.push_str(t);
            }
        } else if child.is_element() {
            if child.tag_name().name().eq_ignore_ascii_case("exclude") {
                continue;
            }
            if is_block_element(child) && !out.is_empty() {
                out.push(' ');
            }
            push_text(child, out);
        }
    }
}

fn is_block_element(node: roxmltree::Node) -> bool {
    matches!(
        node.tag_name().name().to_ascii_lowercase().as_str(),
        "p" | "div" | "br" | "li" | "tr" | "td" | "h1" | "h2" | "h3" | "h4"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"
      xmlns:se-gen-base="http://www.taxonomier.se/se/fr/gen-base/2021-10-31">
  <body>
    <ix:nonNumeric name="se-cd-base:ForetagetsNamn" contextRef="period0">  Exempel AB </ix:nonNumeric>
    <ix:nonFraction name="se-gen-base:Nettoomsattning" contextRef="period0" unitRef="SEK" decimals="INF" scale="3" format="ixt:numspacecomma">1 250</ix:nonFraction>
    <ix:nonFraction name="se-gen-base:Nettoomsattning" contextRef="period1" unitRef="SEK" decimals="-3" scale="3" format="ixt:numspacecomma">1 000</ix:nonFraction>
    <ix:nonFraction name="se-gen-base:AretsResultat" contextRef="period0" unitRef="SEK" sign="-" format="ixt:numspacecomma">12 000</ix:nonFraction>
    <ix:nonFraction name="se-gen-base:Kundfordringar" contextRef="balans0" unitRef="SEK" scale="x">5</ix:nonFraction>
    <ix:nonFraction name="se-gen-base:Varulager" contextRef="balans0" unitRef="SEK">okänt</ix:nonFraction>
    <ix:nonNumeric name="se-gen-base:AllmanUppgiftVerksamhet" contextRef="period0"><p>Bolaget bedriver konsultverksamhet.</p><p>Verksamheten bedrivs i Stockholm.</p><ix:exclude>Sida 2</ix:exclude></ix:nonNumeric>
  </body>
</html>"#;

    #[test]
    fn test_parse_collects_facts_in_order() {
        let doc = InlineDocument::parse(DOC).unwrap();
        assert_eq!(doc.facts().len(), 7);
        assert_eq!(doc.facts()[1].local_name(), "Nettoomsattning");
        assert_eq!(doc.facts()[1].decimals, None);
        assert_eq!(doc.facts()[2].decimals, Some(-3));
    }

    #[test]
    fn test_value_matches_substring_and_context() {
        let doc = InlineDocument::parse(DOC).unwrap();
        assert_eq!(doc.value("nettoomsattning", Some("period0")), Some(1_250_000.0));
        assert_eq!(doc.value("Nettoomsattning", Some("period1")), Some(1_000_000.0));
        assert_eq!(doc.value("Nettoomsattning", None), Some(1_250_000.0));
        assert_eq!(doc.value("Nettoomsattning", Some("period7")), None);
        assert_eq!(doc.value("Personalkostnader", None), None);
    }

    #[test]
    fn test_exact_local_name_preferred_over_earlier_substring() {
        let doc = InlineDocument::parse(
            r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"><body>
                 <ix:nonFraction name="se-gen-base:Omsattningstillgangar" contextRef="balans0">400</ix:nonFraction>
                 <ix:nonFraction name="se-gen-base:Tillgangar" contextRef="balans0">900</ix:nonFraction>
               </body></html>"#,
        )
        .unwrap();
        assert_eq!(doc.value("Tillgangar", Some("balans0")), Some(900.0));
        assert_eq!(doc.value("tillgangar", Some("balans0")), Some(900.0));
        assert_eq!(doc.value("Omsattning", Some("balans0")), Some(400.0));
    }

    #[test]
    fn test_sign_attribute_applied() {
        let doc = InlineDocument::parse(DOC).unwrap();
        assert_eq!(doc.value("AretsResultat", Some("period0")), Some(-12_000.0));
    }

    #[test]
    fn test_unreadable_values_are_absent() {
        let doc = InlineDocument::parse(DOC).unwrap();
        assert_eq!(doc.value("Kundfordringar", Some("balans0")), None);
        assert_eq!(doc.value("Varulager", Some("balans0")), None);
    }

    #[test]
    fn test_text_is_trimmed() {
        let doc = InlineDocument::parse(DOC).unwrap();
        assert_eq!(doc.text("ForetagetsNamn", None), Some("Exempel AB".to_string()));
    }

    #[test]
    fn test_text_block_skips_excluded_content() {
        let doc = InlineDocument::parse(DOC).unwrap();
        let block = doc.text_block("AllmanUppgiftVerksamhet", 50).unwrap();
        assert_eq!(
            block,
            "Bolaget bedriver konsultverksamhet. Verksamheten bedrivs i Stockholm."
        );
        assert!(doc.text_block("AllmanUppgiftVerksamhet", 500).is_none());
    }

    #[test]
    fn test_value_with_precision() {
        let doc = InlineDocument::parse(DOC).unwrap();
        let exact = doc.value_with_precision("Nettoomsattning", Some("period0")).unwrap();
        assert_eq!(exact.value, 1_250_000.0);
        assert_eq!(exact.decimals, None);
        assert_eq!(exact.scale, 3);
        assert_eq!(exact.unit, "SEK");
        assert_eq!(exact.precision_label(), "exact");

        let rounded = doc.value_with_precision("Nettoomsattning", Some("period1")).unwrap();
        assert_eq!(rounded.precision_label(), "-3 decimals");
    }

    #[test]
    fn test_malformed_markup_is_an_error() {
        let result = InlineDocument::parse("<html><body><ix:nonFraction name=\"x\">1</body>");
        assert!(result.is_err());
    }
}
