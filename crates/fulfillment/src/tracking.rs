//! Carrier tracking numbers and tracking URL templates.

use chrono::Utc;
use uuid::Uuid;

/// Known carriers: (lowercase name, tracking prefix, URL template).
const CARRIERS: [(&str, &str, &str); 4] = [
    (
        "fedex",
        "FDX",
        "https://www.fedex.com/fedextrack/?trknbr={tracking}",
    ),
    ("ups", "1Z", "https://www.ups.com/track?tracknum={tracking}"),
    (
        "dhl",
        "DHL",
        "https://www.dhl.com/en/express/tracking.html?AWB={tracking}",
    ),
    (
        "usps",
        "USPS",
        "https://tools.usps.com/go/TrackConfirmAction?tLabels={tracking}",
    ),
];

/// Fallback prefix for carriers without a known one.
const DEFAULT_PREFIX: &str = "TRK";

fn prefix_for(carrier: &str) -> &'static str {
    let carrier = carrier.to_lowercase();
    CARRIERS
        .iter()
        .find(|(name, _, _)| *name == carrier)
        .map(|(_, prefix, _)| *prefix)
        .unwrap_or(DEFAULT_PREFIX)
}

/// Generates a tracking number: `{PREFIX}{8-digit epoch tail}{4-char random}`.
pub fn generate_tracking_number(carrier: &str) -> String {
    let epoch_tail = Utc::now().timestamp().rem_euclid(100_000_000);
    let random: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(4)
        .collect::<String>()
        .to_uppercase();
    format!("{}{epoch_tail:08}{random}", prefix_for(carrier))
}

/// Derives a tracking URL from the static per-carrier template.
///
/// Carrier names are matched case-insensitively; unknown carriers yield
/// `None`, which is not an error.
pub fn tracking_url(carrier: &str, tracking_number: &str) -> Option<String> {
    let carrier = carrier.to_lowercase();
    CARRIERS
        .iter()
        .find(|(name, _, _)| *name == carrier)
        .map(|(_, _, template)| template.replace("{tracking}", tracking_number))
}
