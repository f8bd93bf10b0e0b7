use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::validators::{is_plausible_bust, is_plausible_length};

/// Garment attributes pulled out of an utterance before id/price matching.
///
/// Every matched span is removed from the working text, so a bust of 40
/// can never be re-read later as item 40 or a 40-baht price.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeSet {
    /// Bust measurement, "40" or a range like "40-44"
    pub bust: Option<String>,
    /// Garment length
    pub length: Option<String>,
    /// Letter size (S/M/L/XL/...)
    pub size_letter: Option<String>,
    /// Fabric name as spoken
    pub fabric: Option<String>,
}

impl AttributeSet {
    pub fn is_empty(&self) -> bool {
        self.bust.is_none()
            && self.length.is_none()
            && self.size_letter.is_none()
            && self.fabric.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AttributeExtraction {
    pub attributes: AttributeSet,
    /// Input text with all matched attribute spans removed
    pub remaining: String,
}

static BUST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:รอบอก|หน้าผ้า|อก)\s*(?:ได้|ถึง|ประมาณ)?\s*(\d{2,3}(?:\.\d+)?)(?:\s*-\s*(\d{2,3}(?:\.\d+)?))?")
        .unwrap()
});

static LENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:ความยาว|ยาว)\s*(?:ได้|ถึง|ประมาณ)?\s*(\d{1,2}(?:\.\d+)?)(?:\s*-\s*(\d{1,2}(?:\.\d+)?))?")
        .unwrap()
});

static SIZE_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(XXL|4XL|3XL|2XL|XL|XS|S|M|L)\b").unwrap());

/// Thai phonetic size words → letter sizes, longest first.
const SIZE_WORDS: &[(&str, &str)] = &[
    ("สองเอ็กซ์แอล", "2XL"),
    ("สามเอ็กซ์แอล", "3XL"),
    ("สี่เอ็กซ์แอล", "4XL"),
    ("สองเอ็กแอล", "2XL"),
    ("สามเอ็กแอล", "3XL"),
    ("สี่เอ็กแอล", "4XL"),
    ("ทูเอ็กแอล", "2XL"),
    ("ทรีเอ็กแอล", "3XL"),
    ("เอ็กซ์แอล", "XL"),
    ("เอ็กแอล", "XL"),
    ("ฟรีไซส์", "Free Size"),
    ("โอเวอร์ไซส์", "Oversize"),
    ("แอล", "L"),
    ("เอ็ม", "M"),
    ("เอส", "S"),
];

static FABRIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ผ้าเด้ง|ชีฟอง|โพลีเอสเตอร์|โพลี่|ไนลอน|เรยอน|คอตตอน|ลินิน|ไหมพรม|ซาติน|กำมะหยี่")
        .unwrap()
});

pub struct AttributeExtractor;

impl AttributeExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> AttributeExtraction {
        let mut attributes = AttributeSet::default();
        let mut working = text.to_string();

        if let Some((value, next)) = take_measurement(&BUST, &working, is_plausible_bust) {
            attributes.bust = Some(value);
            working = next;
        }

        if let Some((value, next)) = take_measurement(&LENGTH, &working, is_plausible_length) {
            attributes.length = Some(value);
            working = next;
        }

        // Thai phonetic size words first (longest match), then latin letters
        for (word, size) in SIZE_WORDS {
            if let Some(pos) = working.find(word) {
                attributes.size_letter = Some((*size).to_string());
                working.replace_range(pos..pos + word.len(), " ");
                break;
            }
        }
        if attributes.size_letter.is_none() {
            if let Some(m) = SIZE_LETTER.find(&working) {
                attributes.size_letter = Some(working[m.range()].to_uppercase());
                working.replace_range(m.range(), " ");
            }
        }

        if let Some(m) = FABRIC.find(&working) {
            attributes.fabric = Some(working[m.range()].to_string());
            working.replace_range(m.range(), " ");
        }

        AttributeExtraction {
            attributes,
            remaining: collapse(&working),
        }
    }
}

impl Default for AttributeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Match a keyword-anchored measurement, validate the captured number(s)
/// against the plausibility predicate, and consume the span on success.
/// An out-of-range number means "not an attribute" and the text is left
/// untouched for the later extractors.
fn take_measurement(
    pattern: &Regex,
    text: &str,
    plausible: fn(f32) -> bool,
) -> Option<(String, String)> {
    let caps = pattern.captures(text)?;
    let first: f32 = caps.get(1)?.as_str().parse().ok()?;
    if !plausible(first) {
        return None;
    }

    let value = match caps.get(2) {
        Some(second) => {
            let high: f32 = second.as_str().parse().ok()?;
            if !plausible(high) {
                return None;
            }
            format!("{}-{}", caps.get(1)?.as_str(), second.as_str())
        }
        None => caps.get(1)?.as_str().to_string(),
    };

    let full = caps.get(0)?;
    let mut next = text.to_string();
    next.replace_range(full.range(), " ");
    Some((value, next))
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
