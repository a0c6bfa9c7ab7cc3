//! Currency code normalization
//!
//! Research payloads come from an untrusted text generator, so the currency
//! field arrives as anything from a clean ISO code to "Yen", "$", or "N/A".
//! `normalize` funnels all of that to one ISO 4217 code through an ordered
//! pipeline where the first match wins. The function is pure, deterministic,
//! and idempotent.

use tracing::debug;

use crate::domain::CostItem;

/// Default currency when nothing else can be inferred
pub const DEFAULT_CURRENCY: &str = "USD";

/// Known-valid ISO 4217 codes
const VALID_CODES: &[&str] = &[
    "AED", "AFN", "ALL", "AMD", "ANG", "AOA", "ARS", "AUD", "AWG", "AZN", "BAM", "BBD", "BDT", "BGN", "BHD", "BIF",
    "BMD", "BND", "BOB", "BRL", "BSD", "BTN", "BWP", "BYN", "BZD", "CAD", "CDF", "CHF", "CLP", "CNY", "COP", "CRC",
    "CUP", "CVE", "CZK", "DJF", "DKK", "DOP", "DZD", "EGP", "ERN", "ETB", "EUR", "FJD", "FKP", "GBP", "GEL", "GHS",
    "GIP", "GMD", "GNF", "GTQ", "GYD", "HKD", "HNL", "HRK", "HTG", "HUF", "IDR", "ILS", "INR", "IQD", "IRR", "ISK",
    "JMD", "JOD", "JPY", "KES", "KGS", "KHR", "KMF", "KRW", "KWD", "KYD", "KZT", "LAK", "LBP", "LKR", "LRD", "LSL",
    "LYD", "MAD", "MDL", "MGA", "MKD", "MMK", "MNT", "MOP", "MRU", "MUR", "MVR", "MWK", "MXN", "MYR", "MZN", "NAD",
    "NGN", "NIO", "NOK", "NPR", "NZD", "OMR", "PAB", "PEN", "PGK", "PHP", "PKR", "PLN", "PYG", "QAR", "RON", "RSD",
    "RUB", "RWF", "SAR", "SBD", "SCR", "SDG", "SEK", "SGD", "SHP", "SLE", "SOS", "SRD", "SSP", "STN", "SVC", "SYP",
    "SZL", "THB", "TJS", "TMT", "TND", "TOP", "TRY", "TTD", "TWD", "TZS", "UAH", "UGX", "USD", "UYU", "UZS", "VES",
    "VND", "VUV", "WST", "XAF", "XCD", "XOF", "XPF", "YER", "ZAR", "ZMW", "ZWL",
];

/// Markers the generator emits when it has no currency at all
const INVALID_MARKERS: &[&str] = &["N/A", "NA", "NULL", "NONE", "-", "--", "UNKNOWN"];

/// Plural, informal, and symbol spellings mapped to their ISO code
fn correction(code: &str) -> Option<&'static str> {
    let corrected = match code {
        "DOLLAR" | "DOLLARS" | "US DOLLAR" | "US DOLLARS" | "USD$" | "$" => "USD",
        "EURO" | "EUROS" | "€" => "EUR",
        "POUND" | "POUNDS" | "POUND STERLING" | "STERLING" | "£" => "GBP",
        "YEN" | "JAPANESE YEN" | "¥" => "JPY",
        "RUPEE" | "RUPEES" | "INDIAN RUPEE" | "₹" => "INR",
        "WON" | "KOREAN WON" | "₩" => "KRW",
        "YUAN" | "RMB" | "RENMINBI" => "CNY",
        "FRANC" | "FRANCS" | "SWISS FRANC" => "CHF",
        "PESO" | "PESOS" | "MEXICAN PESO" => "MXN",
        "REAL" | "REAIS" | "BRAZILIAN REAL" => "BRL",
        "BAHT" | "THAI BAHT" | "฿" => "THB",
        "DONG" | "VIETNAMESE DONG" | "₫" => "VND",
        "RINGGIT" => "MYR",
        "RUPIAH" => "IDR",
        "ZLOTY" => "PLN",
        "KRONA" | "SWEDISH KRONA" => "SEK",
        "KRONE" | "NORWEGIAN KRONE" => "NOK",
        "DIRHAM" => "AED",
        "RAND" => "ZAR",
        "LIRA" | "TURKISH LIRA" | "₺" => "TRY",
        _ => return None,
    };
    Some(corrected)
}

/// Lowercased country (or "City, Country" fragment) to currency
const COUNTRY_CURRENCIES: &[(&str, &str)] = &[
    ("argentina", "ARS"),
    ("australia", "AUD"),
    ("austria", "EUR"),
    ("belgium", "EUR"),
    ("brazil", "BRL"),
    ("cambodia", "KHR"),
    ("canada", "CAD"),
    ("chile", "CLP"),
    ("china", "CNY"),
    ("colombia", "COP"),
    ("croatia", "EUR"),
    ("czech republic", "CZK"),
    ("czechia", "CZK"),
    ("denmark", "DKK"),
    ("egypt", "EGP"),
    ("finland", "EUR"),
    ("france", "EUR"),
    ("germany", "EUR"),
    ("greece", "EUR"),
    ("hong kong", "HKD"),
    ("hungary", "HUF"),
    ("iceland", "ISK"),
    ("india", "INR"),
    ("indonesia", "IDR"),
    ("ireland", "EUR"),
    ("israel", "ILS"),
    ("italy", "EUR"),
    ("japan", "JPY"),
    ("kenya", "KES"),
    ("laos", "LAK"),
    ("malaysia", "MYR"),
    ("mexico", "MXN"),
    ("morocco", "MAD"),
    ("netherlands", "EUR"),
    ("new zealand", "NZD"),
    ("norway", "NOK"),
    ("peru", "PEN"),
    ("philippines", "PHP"),
    ("poland", "PLN"),
    ("portugal", "EUR"),
    ("singapore", "SGD"),
    ("south africa", "ZAR"),
    ("south korea", "KRW"),
    ("korea", "KRW"),
    ("spain", "EUR"),
    ("sweden", "SEK"),
    ("switzerland", "CHF"),
    ("taiwan", "TWD"),
    ("thailand", "THB"),
    ("turkey", "TRY"),
    ("united arab emirates", "AED"),
    ("uae", "AED"),
    ("united kingdom", "GBP"),
    ("uk", "GBP"),
    ("england", "GBP"),
    ("scotland", "GBP"),
    ("united states", "USD"),
    ("usa", "USD"),
    ("vietnam", "VND"),
];

/// Check membership in the known-valid ISO table
pub fn is_valid_code(code: &str) -> bool {
    VALID_CODES.contains(&code)
}

/// Infer a currency from a country string: exact table match first, then
/// any table key appearing as a substring ("Tokyo, Japan" matches "japan")
fn infer_from_country(country: &str) -> Option<&'static str> {
    let country = country.trim().to_lowercase();
    if country.is_empty() {
        return None;
    }

    if let Some((_, code)) = COUNTRY_CURRENCIES.iter().find(|(name, _)| *name == country) {
        return Some(code);
    }

    COUNTRY_CURRENCIES
        .iter()
        .find(|(name, _)| country.contains(name))
        .map(|(_, code)| *code)
}

/// Normalize a currency code to ISO 4217, first match wins
///
/// A bare three-letter alphabetic code outside the valid table passes
/// through unchanged: well-formed but unrecognized beats guessing.
pub fn normalize(code: &str, country: Option<&str>, default: &str) -> String {
    let trimmed = code.trim();

    if trimmed.is_empty() {
        if let Some(inferred) = country.and_then(infer_from_country) {
            debug!(country = ?country, inferred, "normalize: empty code, inferred from country");
            return inferred.to_string();
        }
        return default.to_string();
    }

    let upper = trimmed.to_uppercase();

    if is_valid_code(&upper) {
        return upper;
    }

    if INVALID_MARKERS.contains(&upper.as_str()) {
        debug!(code, default, "normalize: invalid marker");
        return default.to_string();
    }

    if let Some(corrected) = correction(&upper) {
        debug!(code, corrected, "normalize: correction table hit");
        return corrected.to_string();
    }

    if let Some(inferred) = country.and_then(infer_from_country) {
        debug!(code, country = ?country, inferred, "normalize: inferred from country");
        return inferred.to_string();
    }

    if upper.len() == 3 && upper.chars().all(|c| c.is_ascii_alphabetic()) {
        debug!(code = %upper, "normalize: unrecognized well-formed code passed through");
        return upper;
    }

    debug!(code, default, "normalize: unresolvable, using default");
    default.to_string()
}

/// Normalize an item's currency in place, annotating the repair
///
/// The annotation only appears when the value actually changed: silent
/// mutation of persisted data is not allowed.
pub fn validate_cost_item(item: &mut CostItem, country_hint: Option<&str>) {
    let normalized = normalize(&item.currency, country_hint, DEFAULT_CURRENCY);
    if normalized != item.currency {
        debug!(from = %item.currency, to = %normalized, item = %item.id, "validate_cost_item: currency corrected");
        item.original_currency = Some(std::mem::replace(&mut item.currency, normalized));
        item.currency_auto_corrected = Some(true);
    }
}
