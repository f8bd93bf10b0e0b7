use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Spoken Thai numbers → digits, longest phrase first so partial phrases
/// ("เก้าสิบ") never fire before their longer forms ("เก้าสิบเก้า").
const SPOKEN_NUMBERS: &[(&str, &str)] = &[
    ("ร้อยเก้าสิบเก้า", "199"),
    ("ร้อยเก้าสิบ", "190"),
    ("ร้อยห้าสิบ", "150"),
    ("ร้อยยี่สิบ", "120"),
    ("หนึ่งร้อย", "100"),
    ("ร้อยนึง", "100"),
    ("ร้อยบาท", "100"),
    ("สองร้อย", "200"),
    ("สามร้อย", "300"),
    ("สี่ร้อย", "400"),
    ("ห้าร้อย", "500"),
    ("เก้าสิบเก้า", "99"),
    ("เก้าสิบ", "90"),
    ("แปดสิบ", "80"),
    ("เจ็ดสิบ", "70"),
    ("หกสิบ", "60"),
    ("ห้าสิบ", "50"),
    ("สี่สิบ", "40"),
    ("สามสิบ", "30"),
    ("ยี่สิบ", "20"),
];

/// Common mis-transcriptions and synonyms → canonical keywords.
///
/// Canonical forms must never appear as a key, otherwise a second pass
/// would keep rewriting and break idempotence.
const KEYWORD_CORRECTIONS: &[(&str, &str)] = &[
    ("หมายเลข", "เบอร์"),
    ("นัมเบอร์", "เบอร์"),
    ("เบอ ", "เบอร์ "),
    ("ลาคา", "ราคา"),
    ("ราคะ", "ราคา"),
    ("ไซต์", "ไซส์"),
    ("ซื้อของ", "รับ"),
    ("เท่าไร", "เท่าไหร่"),
    ("ทไหร", "เท่าไหร่"),
];

/// Shipping/payment boilerplate and defect-count phrases. These carry
/// numbers that must never be read as an item id or a price.
static NOISE_WITH_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:ค่าส่ง|โอน|ปลายทาง|ทั้งหมด|เหลืออีก|กระดุม|ตำหนิ|สำรอง)\s*\d+").unwrap()
});

/// Politeness particles and filler that add no signal.
static NOISE_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ลูกค้า|นะคะ|นะครับ|ครับ|ค่ะ|จ้า|จ้ะ").unwrap());

/// Emoji and pictograph ranges, replaced with a space before matching.
static EMOJI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{2700}-\u{27BF}\u{E000}-\u{F8FF}\u{1F000}-\u{1FAFF}\u{2600}-\u{26FF}]").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Cleans a raw chat or STT utterance into a stable, matchable form.
///
/// The pass order is fixed: Thai numerals, spoken numbers, keyword
/// corrections, noise stripping, digit-run merging, whitespace collapse.
/// `normalize` is idempotent; running it on its own output is a no-op.
pub struct Normalizer {
    corrections: Vec<(String, String)>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            corrections: KEYWORD_CORRECTIONS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Extra shop-specific corrections on top of the built-in table.
    pub fn with_corrections(extra: &HashMap<String, String>) -> Self {
        let mut normalizer = Self::new();
        for (from, to) in extra {
            normalizer.corrections.push((from.clone(), to.clone()));
        }
        normalizer
    }

    pub fn normalize(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }

        // Thai numerals → Arabic digits, separators → spaces, emoji out
        let mut text: String = raw
            .chars()
            .map(|c| match c {
                '๐'..='๙' => char::from_u32('0' as u32 + (c as u32 - '๐' as u32)).unwrap_or(c),
                '=' | '/' => ' ',
                _ => c,
            })
            .collect();
        text = EMOJI.replace_all(&text, " ").into_owned();

        // Spoken numbers, longest phrase first
        for (word, digits) in SPOKEN_NUMBERS {
            if text.contains(word) {
                text = text.replace(word, &format!(" {} ", digits));
            }
        }

        // Keyword standardization
        for (from, to) in &self.corrections {
            if text.contains(from.as_str()) {
                text = text.replace(from.as_str(), to);
            }
        }

        // Noise stripping: numbered boilerplate first, then bare particles
        text = NOISE_WITH_NUMBER.replace_all(&text, " ").into_owned();
        text = NOISE_WORDS.replace_all(&text, " ").into_owned();

        // Merge runs of spoken single digits ("5 0" → "50"). Multi-digit
        // tokens are left alone so number pairs like "53 80" survive.
        let merged = merge_digit_runs(&text);

        WHITESPACE.replace_all(&merged, " ").trim().to_string()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_digit_runs(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut run = String::new();

    for token in text.split_whitespace() {
        let single_digit = token.len() == 1 && token.chars().all(|c| c.is_ascii_digit());
        if single_digit {
            run.push_str(token);
        } else {
            if !run.is_empty() {
                out.push(std::mem::take(&mut run));
            }
            out.push(token.to_string());
        }
    }
    if !run.is_empty() {
        out.push(run);
    }

    out.join(" ")
}
