// Listing title segmentation into brand, model and version
use crate::catalog::{BrandModels, Catalog};
use crate::model::{
    ParseMethod, ParsedTitle, CONFIDENCE_BRAND_ONLY, CONFIDENCE_EXACT, CONFIDENCE_HEURISTIC,
};
use crate::normalizer::{normalize, normalize_with_offsets, starts_with_word, NormalizedText};
use serde::Deserialize;

/// Knobs for the positional fallback used when no catalog brand matches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeuristicRules {
    /// Read "Model 3"-style titles as a two-word model: an alphabetic word
    /// followed by an alphanumeric word starting with a digit.
    pub pair_numeric_model: bool,
    /// When non-empty, only these lead words (normalized) may start such a pair.
    pub pair_lead_words: Vec<String>,
}

impl Default for HeuristicRules {
    fn default() -> Self {
        Self {
            pair_numeric_model: true,
            pair_lead_words: Vec::new(),
        }
    }
}

impl HeuristicRules {
    fn is_numeric_pair(&self, lead: &str, number: &str) -> bool {
        if !self.pair_numeric_model {
            return false;
        }
        let lead_ok = !lead.is_empty() && lead.chars().all(char::is_alphabetic);
        let number_ok = number.chars().next().is_some_and(|c| c.is_ascii_digit())
            && number.chars().all(char::is_alphanumeric);
        if !(lead_ok && number_ok) {
            return false;
        }
        self.pair_lead_words.is_empty()
            || self
                .pair_lead_words
                .iter()
                .any(|w| normalize(w) == normalize(lead))
    }
}

/// Splits listing titles using a reference catalog.
#[derive(Debug, Clone, Default)]
pub struct TitleParser {
    rules: HeuristicRules,
}

impl TitleParser {
    pub fn new(rules: HeuristicRules) -> Self {
        Self { rules }
    }

    /// Parses a title. Never fails: unknown titles fall through to the
    /// positional heuristic with lower confidence.
    pub fn parse(&self, title: &str, catalog: &Catalog) -> ParsedTitle {
        if title.trim().is_empty() {
            return ParsedTitle::empty();
        }

        let norm = normalize_with_offsets(title);
        if let Some((brand_key, brand)) = match_brand(norm.as_str(), catalog) {
            return match_model(title, &norm, brand_key, brand);
        }

        self.parse_heuristic(title)
    }

    fn parse_heuristic(&self, title: &str) -> ParsedTitle {
        let words: Vec<&str> = title.split_whitespace().collect();
        let Some((&brand, rest)) = words.split_first() else {
            return ParsedTitle::empty();
        };

        let (model, rest) = match rest {
            [] => (None, rest),
            [lead, number, tail @ ..] if self.rules.is_numeric_pair(lead, number) => {
                (Some(format!("{lead} {number}")), tail)
            }
            [single, tail @ ..] => (Some(single.to_string()), tail),
        };

        ParsedTitle {
            brand: Some(brand.to_string()),
            model,
            version: non_empty(&rest.join(" ")),
            confidence: CONFIDENCE_HEURISTIC,
            method: ParseMethod::Heuristic,
        }
    }
}

/// Parses with the default heuristic rules.
pub fn parse(title: &str, catalog: &Catalog) -> ParsedTitle {
    TitleParser::default().parse(title, catalog)
}

fn match_brand<'c>(text: &str, catalog: &'c Catalog) -> Option<(&'c str, &'c BrandModels)> {
    catalog
        .brand_keys()
        .iter()
        .find(|key| starts_with_word(text, key))
        .and_then(|key| catalog.brand(key).map(|b| (key.as_str(), b)))
}

fn match_model(title: &str, norm: &NormalizedText, brand_key: &str, brand: &BrandModels) -> ParsedTitle {
    let text = norm.as_str();
    let remainder = text[brand_key.len()..].trim_start();
    let remainder_at = text.len() - remainder.len();

    if remainder.is_empty() {
        return ParsedTitle {
            brand: Some(brand.display.clone()),
            model: None,
            version: None,
            confidence: CONFIDENCE_EXACT,
            method: ParseMethod::DbBrandOnly,
        };
    }

    if let Some(entry) = brand
        .entries
        .iter()
        .find(|e| starts_with_word(remainder, &e.model_key))
    {
        let end = norm.source_end(remainder_at + entry.model_key.len());
        return ParsedTitle {
            brand: Some(brand.display.clone()),
            model: Some(entry.model.clone()),
            version: non_empty(&title[end..]),
            confidence: CONFIDENCE_EXACT,
            method: ParseMethod::DbExact,
        };
    }

    // Unknown model: take the first word after the brand as it was written.
    let rest = title[norm.source_end(brand_key.len())..]
        .trim_start_matches(|c: char| !c.is_alphanumeric());
    let mut parts = rest.splitn(2, char::is_whitespace);
    let model = parts.next().and_then(non_empty);
    let version = parts.next().and_then(non_empty);

    ParsedTitle {
        brand: Some(brand.display.clone()),
        model,
        version,
        confidence: CONFIDENCE_BRAND_ONLY,
        method: ParseMethod::DbBrandOnly,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
