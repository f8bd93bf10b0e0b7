use once_cell::sync::Lazy;
use regex::Regex;

use super::validators::{IdPolicy, PricePolicy};

/// Intent classification hint from keyword anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentHint {
    Cancel,
    Shipping,
    Question,
    Buy,
}

/// Best-effort anchored extraction. `remaining` is the text with every
/// successful match consumed, handed on to the implicit resolver.
#[derive(Debug, Clone)]
pub struct AnchorResult {
    pub intent: Option<IntentHint>,
    pub item_id: Option<u32>,
    pub price: Option<u32>,
    pub remaining: String,
}

// Cancel works in both orders: "ยกเลิก 46" and "46 ยกเลิก".
static CANCEL_KEYWORD_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:cc|cancel|ยกเลิก|ไม่เอา|ปล่อย|หลุด|ลบ|เคลียร์|ล้าง)\s*(\d+)").unwrap()
});
static CANCEL_NUMBER_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:cc|cancel|ยกเลิก|ไม่เอา)").unwrap()
});

static SHIPPING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"พร้อมส่ง|สรุปยอด|ส่งของ|คิดเงิน|แจ้งส่ง").unwrap());

static QUESTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"อก|เอว|ยาว|เท่าไหร่|กี่บาท|แบบไหน|ผ้า|สี|ตำหนิ|ไหม|หรอ|หรือยัง|ว่างมั้ย").unwrap()
});

static ITEM_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:รายการที่|รหัส|เบอร์|ตัวที่|no\.?|cf|เอฟ|จอง|รับ|เอา|f)\s*(\d+)").unwrap()
});

static PRICE_KEYWORD_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:ราคา|เอาไป|จัดไป|ขาย|ตัวละ|เหลือ|แค่)\s*(\d+)").unwrap()
});
static PRICE_UNIT_AFTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:บาท|฿|\.-)").unwrap());

static FREEBIE: Lazy<Regex> = Lazy::new(|| Regex::new(r"ฟรี|แถม").unwrap());

/// Keyword-anchored extraction, evaluated in fixed priority order.
///
/// Cancel short-circuits everything; shipping and question short-circuit
/// the numeric extraction; id and price are matched independently, first
/// match wins per field.
pub struct AnchorExtractor {
    id_policy: IdPolicy,
    price_policy: PricePolicy,
}

impl AnchorExtractor {
    pub fn new(id_policy: IdPolicy, price_policy: PricePolicy) -> Self {
        Self {
            id_policy,
            price_policy,
        }
    }

    pub fn extract(&self, text: &str) -> AnchorResult {
        let mut working = text.to_string();

        // 1. Cancel beats everything, either word order
        for pattern in [&*CANCEL_KEYWORD_FIRST, &*CANCEL_NUMBER_FIRST] {
            if let Some(caps) = pattern.captures(&working) {
                if let Some(id) = parse_u32(caps.get(1).map(|m| m.as_str())) {
                    if self.id_policy.is_valid(id) {
                        return AnchorResult {
                            intent: Some(IntentHint::Cancel),
                            item_id: Some(id),
                            price: None,
                            remaining: String::new(),
                        };
                    }
                }
            }
        }

        // 2. Shipping notice
        if SHIPPING.is_match(&working) {
            return AnchorResult {
                intent: Some(IntentHint::Shipping),
                item_id: None,
                price: None,
                remaining: String::new(),
            };
        }

        // 3. Question words suppress a buy unless an explicit id anchor is
        // present ("เบอร์ 5 อกเท่าไหร่" still asks about item 5)
        let has_question = QUESTION.is_match(&working);

        // 4. Explicitly anchored item id
        let mut item_id = None;
        if let Some(caps) = ITEM_ID.captures(&working) {
            if let Some(id) = parse_u32(caps.get(1).map(|m| m.as_str())) {
                if self.id_policy.is_valid(id) {
                    item_id = Some(id);
                    let range = caps.get(0).map(|m| m.range());
                    if let Some(range) = range {
                        working.replace_range(range, " ");
                    }
                }
            }
        }

        if has_question && item_id.is_none() {
            return AnchorResult {
                intent: Some(IntentHint::Question),
                item_id: None,
                price: None,
                remaining: String::new(),
            };
        }

        // 5. Explicitly anchored price
        let mut price = None;
        for pattern in [&*PRICE_KEYWORD_FIRST, &*PRICE_UNIT_AFTER] {
            if price.is_some() {
                break;
            }
            if let Some(caps) = pattern.captures(&working) {
                if let Some(value) = parse_u32(caps.get(1).map(|m| m.as_str())) {
                    if self.price_policy.is_valid(value) {
                        price = Some(value);
                        let range = caps.get(0).map(|m| m.range());
                        if let Some(range) = range {
                            working.replace_range(range, " ");
                        }
                    }
                }
            }
        }

        // 6. Freebie marker means price zero
        if price.is_none() {
            if let Some(m) = FREEBIE.find(&working) {
                price = Some(0);
                working.replace_range(m.range(), " ");
            }
        }

        AnchorResult {
            intent: if item_id.is_some() {
                Some(IntentHint::Buy)
            } else {
                None
            },
            item_id,
            price,
            remaining: working.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

fn parse_u32(text: Option<&str>) -> Option<u32> {
    text?.parse().ok()
}
