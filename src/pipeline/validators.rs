use serde::Deserialize;

/// Valid item id range for the current shop.
///
/// Item ids are small positive integers printed on the garment tags. The
/// upper bound is a hard sanity limit, distinct from the session's live
/// stock size (which grows as the seller introduces new items).
#[derive(Debug, Clone, Deserialize)]
pub struct IdPolicy {
    /// Largest item id that can ever be plausible (default: 1000)
    pub max_item_id: u32,
}

impl Default for IdPolicy {
    fn default() -> Self {
        Self { max_item_id: 1000 }
    }
}

impl IdPolicy {
    pub fn is_valid(&self, n: u32) -> bool {
        n >= 1 && n <= self.max_item_id
    }
}

/// Price plausibility policy.
///
/// Live-commerce prices follow shop conventions: round numbers, a few
/// psychological price points, zero for freebies. Everything here is tuned
/// to one shop's habits and deliberately configurable.
#[derive(Debug, Clone, Deserialize)]
pub struct PricePolicy {
    /// Minimum non-zero price (default: 10)
    pub min: u32,
    /// Maximum price (default: 5000)
    pub max: u32,
    /// Accepted last digits for in-range prices (default: 0 and 9)
    pub allowed_last_digits: Vec<u32>,
    /// Common non-round price points accepted regardless of last digit
    pub whitelist: Vec<u32>,
}

impl Default for PricePolicy {
    fn default() -> Self {
        Self {
            min: 10,
            max: 5000,
            allowed_last_digits: vec![0, 9],
            whitelist: vec![55, 65, 75, 85, 95, 120, 150, 250, 290, 350, 390, 450, 490],
        }
    }
}

impl PricePolicy {
    pub fn is_valid(&self, n: u32) -> bool {
        if n == 0 {
            return true; // freebie
        }
        if n < self.min || n > self.max {
            return false;
        }
        self.allowed_last_digits.contains(&(n % 10)) || self.whitelist.contains(&n)
    }
}

/// Plausible bust measurement in inches.
pub fn is_plausible_bust(n: f32) -> bool {
    (30.0..=70.0).contains(&n)
}

/// Plausible garment length in inches.
pub fn is_plausible_length(n: f32) -> bool {
    (15.0..=60.0).contains(&n)
}
