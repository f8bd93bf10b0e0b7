use chrono::Utc;
use livesale::pipeline::{
    ActionKind, AttributeExtractor, IdPolicy, IntentRouter, Normalizer, PricePolicy,
};
use livesale::session::Utterance;

fn utterance(text: &str, name: &str, uid: &str, is_admin: bool) -> Utterance {
    Utterance {
        id: format!("msg-{}", uid),
        speaker_name: name.to_string(),
        speaker_uid: uid.to_string(),
        is_admin,
        text: text.to_string(),
        received_at: Utc::now(),
    }
}

fn router() -> IntentRouter {
    IntentRouter::new(IdPolicy::default(), PricePolicy::default(), None)
}

// ============================================================================
// Normalizer
// ============================================================================

#[test]
fn normalize_converts_thai_numerals() {
    let normalizer = Normalizer::new();
    assert_eq!(normalizer.normalize("รับ ๕๓"), "รับ 53");
}

#[test]
fn normalize_expands_spoken_numbers() {
    let normalizer = Normalizer::new();
    assert_eq!(normalizer.normalize("ห้าสิบ"), "50");
    assert_eq!(normalizer.normalize("ร้อยเก้าสิบเก้า"), "199");
}

#[test]
fn normalize_merges_single_digit_runs_only() {
    let normalizer = Normalizer::new();
    // STT splits "43" into spoken digits
    assert_eq!(normalizer.normalize("รับ 4 3"), "รับ 43");
    // but a pair of multi-digit numbers must survive as a pair
    assert_eq!(normalizer.normalize("53 80"), "53 80");
}

#[test]
fn normalize_strips_numbered_noise() {
    let normalizer = Normalizer::new();
    // Shipping fee is boilerplate, never an id or price
    assert_eq!(normalizer.normalize("ค่าส่ง 50 ครับ"), "");
}

#[test]
fn normalize_strips_particles_and_emoji() {
    let normalizer = Normalizer::new();
    assert_eq!(normalizer.normalize("รับ 12 นะคะ 🙏"), "รับ 12");
}

#[test]
fn normalize_corrects_common_mistranscriptions() {
    let normalizer = Normalizer::new();
    assert_eq!(normalizer.normalize("หมายเลข 7"), "เบอร์ 7");
}

#[test]
fn normalize_is_idempotent() {
    let normalizer = Normalizer::new();
    for raw in [
        "เบอ 5 ค่ะ 😀",
        "รับ ๕๓ ห้าสิบบาท",
        "อก 40 ยาว 25 รับ 15",
        "ค่าส่ง 50 โอน 200",
        "12 45 90 คุณสมชาย",
    ] {
        let once = normalizer.normalize(raw);
        let twice = normalizer.normalize(&once);
        assert_eq!(once, twice, "normalize must be idempotent for {:?}", raw);
    }
}

#[test]
fn normalize_applies_shop_specific_corrections() {
    let mut extra = std::collections::HashMap::new();
    extra.insert("กดรับ".to_string(), "รับ".to_string());
    let normalizer = Normalizer::with_corrections(&extra);
    assert_eq!(normalizer.normalize("กดรับ 12"), "รับ 12");
}

#[test]
fn normalize_empty_input() {
    let normalizer = Normalizer::new();
    assert_eq!(normalizer.normalize("   "), "");
}

// ============================================================================
// Attribute extraction
// ============================================================================

#[test]
fn attributes_consume_their_spans() {
    let extractor = AttributeExtractor::new();
    let result = extractor.extract("อก 40 ยาว 25 รับ 15");

    assert_eq!(result.attributes.bust.as_deref(), Some("40"));
    assert_eq!(result.attributes.length.as_deref(), Some("25"));
    // the measurement numbers are gone, only the claim is left
    assert_eq!(result.remaining, "รับ 15");
}

#[test]
fn attributes_reject_implausible_measurements() {
    let extractor = AttributeExtractor::new();
    // 999 is no bust; the text stays untouched for the later stages
    let result = extractor.extract("อก 999");
    assert_eq!(result.attributes.bust, None);
    assert_eq!(result.remaining, "อก 999");
}

#[test]
fn attributes_capture_ranges_and_sizes() {
    let extractor = AttributeExtractor::new();
    let result = extractor.extract("อก 40-44 ผ้าเด้ง ไซส์ XL");

    assert_eq!(result.attributes.bust.as_deref(), Some("40-44"));
    assert_eq!(result.attributes.size_letter.as_deref(), Some("XL"));
    assert_eq!(result.attributes.fabric.as_deref(), Some("ผ้าเด้ง"));
}

#[test]
fn attributes_map_thai_phonetic_sizes() {
    let extractor = AttributeExtractor::new();
    let result = extractor.extract("เอ็กซ์แอล สวยมาก");
    assert_eq!(result.attributes.size_letter.as_deref(), Some("XL"));
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn anchored_buy_resolves_id_and_price() {
    let routed = router()
        .route(&utterance("รับ 46 ราคา 150", "Malee", "u1", false), "Malee")
        .await;

    assert_eq!(routed.actions.len(), 1);
    let action = &routed.actions[0];
    assert_eq!(action.kind, ActionKind::Buy);
    assert_eq!(action.item_id, Some(46));
    assert_eq!(action.price, Some(150));
    assert_eq!(action.method, "anchor");
}

#[tokio::test]
async fn cancel_wins_over_buy_keywords() {
    let routed = router()
        .route(&utterance("รับ 46 ไม่เอา", "Malee", "u1", false), "Malee")
        .await;

    assert_eq!(routed.actions.len(), 1);
    assert_eq!(routed.actions[0].kind, ActionKind::Cancel);
    assert_eq!(routed.actions[0].item_id, Some(46));
}

#[tokio::test]
async fn glued_digits_split_into_id_and_price() {
    let routed = router()
        .route(&utterance("4350", "Malee", "u1", false), "Malee")
        .await;

    let action = &routed.actions[0];
    assert_eq!(action.kind, ActionKind::Buy);
    assert_eq!(action.item_id, Some(43));
    assert_eq!(action.price, Some(50));
    assert_eq!(action.method, "digit-split");
}

#[tokio::test]
async fn glued_digits_with_invalid_price_stay_an_id() {
    // 43 / 01 fails price validation, so "4301" is not split; it is also
    // too large to be an item id by itself, so the message is ignored
    let routed = router()
        .route(&utterance("4301", "Malee", "u1", false), "Malee")
        .await;
    assert_eq!(routed.actions[0].kind, ActionKind::Ignore);
}

#[tokio::test]
async fn bare_number_pair_reads_as_id_then_price() {
    let routed = router()
        .route(&utterance("53 80", "Malee", "u1", false), "Malee")
        .await;

    let action = &routed.actions[0];
    assert_eq!(action.kind, ActionKind::Buy);
    assert_eq!(action.item_id, Some(53));
    assert_eq!(action.price, Some(80));
    assert_eq!(action.method, "implicit-pair");
}

#[tokio::test]
async fn question_without_id_is_not_a_buy() {
    let routed = router()
        .route(&utterance("อกเท่าไหร่", "Malee", "u1", false), "Malee")
        .await;
    assert_eq!(routed.actions[0].kind, ActionKind::Question);
}

#[tokio::test]
async fn shipping_notice_short_circuits() {
    let routed = router()
        .route(&utterance("พร้อมส่งค่ะ", "Malee", "u1", false), "Malee")
        .await;
    assert_eq!(routed.actions[0].kind, ActionKind::Shipping);
}

#[tokio::test]
async fn freebie_marker_means_price_zero() {
    let routed = router()
        .route(&utterance("รับ 7 แถม", "Malee", "u1", false), "Malee")
        .await;

    assert_eq!(routed.actions[0].item_id, Some(7));
    assert_eq!(routed.actions[0].price, Some(0));
}

#[tokio::test]
async fn multi_claim_expands_with_proxy_owner() {
    let routed = router()
        .route(
            &utterance("12 45 90 คุณสมชาย", "Admin", "admin-1", true),
            "Admin",
        )
        .await;

    assert_eq!(routed.actions.len(), 3);
    let ids: Vec<_> = routed.actions.iter().map(|a| a.item_id).collect();
    assert_eq!(ids, vec![Some(12), Some(45), Some(90)]);
    for action in &routed.actions {
        assert_eq!(action.kind, ActionKind::Buy);
        assert_eq!(action.owner_name, "คุณสมชาย");
        assert_eq!(action.method, "multi-claim");
    }
    // one proxy identity shared across the whole batch
    assert_eq!(routed.actions[0].owner_uid, routed.actions[1].owner_uid);
    assert!(routed.actions[0].owner_uid.starts_with("proxy-"));
}

#[tokio::test]
async fn cancel_keyword_beats_the_multi_claim_shape() {
    // "12 45 ยกเลิก" is a release, not a booking for a buyer named ยกเลิก
    let routed = router()
        .route(&utterance("12 45 ยกเลิก", "Malee", "u1", false), "Malee")
        .await;

    assert_eq!(routed.actions.len(), 1);
    assert_eq!(routed.actions[0].kind, ActionKind::Cancel);
    assert_eq!(routed.actions[0].item_id, Some(45));
}

#[tokio::test]
async fn shipping_keyword_beats_the_multi_claim_shape() {
    let routed = router()
        .route(&utterance("12 45 พร้อมส่ง", "Malee", "u1", false), "Malee")
        .await;

    assert_eq!(routed.actions.len(), 1);
    assert_eq!(routed.actions[0].kind, ActionKind::Shipping);
}

#[tokio::test]
async fn multi_claim_from_buyer_keeps_their_identity() {
    let routed = router()
        .route(&utterance("12 45 21", "Malee", "u1", false), "Malee")
        .await;

    assert_eq!(routed.actions.len(), 3);
    for action in &routed.actions {
        assert_eq!(action.owner_name, "Malee");
        assert_eq!(action.owner_uid, "u1");
    }
}

#[tokio::test]
async fn admin_claim_with_trailing_name_books_for_proxy() {
    let routed = router()
        .route(
            &utterance("รับ 46 คุณนก", "Admin", "admin-1", true),
            "Admin",
        )
        .await;

    let action = &routed.actions[0];
    assert_eq!(action.item_id, Some(46));
    assert_eq!(action.owner_name, "คุณนก");
    assert!(action.owner_uid.starts_with("proxy-"));
}

#[tokio::test]
async fn chatter_resolves_to_ignore() {
    let routed = router()
        .route(&utterance("สวัสดีตอนเย็น", "Malee", "u1", false), "Malee")
        .await;
    assert_eq!(routed.actions[0].kind, ActionKind::Ignore);
}

#[tokio::test]
async fn out_of_range_id_is_ignored() {
    let routed = router()
        .route(&utterance("รับ 5000", "Malee", "u1", false), "Malee")
        .await;
    assert_eq!(routed.actions[0].kind, ActionKind::Ignore);
}
