//! Field normalization for raw feed entries.
//!
//! Everything here is total: malformed input is absorbed into a fallback
//! value (`"N/A"`, the raw date string, `"unknown"`) instead of an error.

use chrono::{NaiveDateTime, Weekday};

use crate::feeds::{FeedSource, RawEntry};
use crate::repository::NewArticle;

/// Storage format for timestamps that could be parsed.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// RFC-822 style stamp as emitted by most RSS feeds, minus the weekday
/// prefix and the zone name.
const FEED_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// Placeholder for a missing title, link or date.
pub const MISSING: &str = "N/A";

pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Parse `"<weekday>, <day> <month> <year> <h>:<m>:<s> <zone-name>"` into
/// `"YYYY-MM-DD HH:MM:SS"`.
///
/// The weekday must be a weekday name but need not match the date. The zone
/// must be a name such as `GMT` or `EST`; it is dropped, not applied. Any
/// other shape, including numeric offsets like `+0000` or surrounding
/// whitespace, comes back unchanged.
pub fn parse_date(raw: &str) -> String {
    parse_feed_date(raw)
        .map(|dt| dt.format(CANONICAL_DATE_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_feed_date(raw: &str) -> Option<NaiveDateTime> {
    let (weekday, rest) = raw.split_once(',')?;
    weekday.parse::<Weekday>().ok()?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let (stamp, zone) = rest.trim_start().rsplit_once(' ')?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp.trim_end(), FEED_DATE_FORMAT).ok()
}

/// Best-guess language code for `text`, or `"unknown"`.
pub fn detect_language(text: &str) -> String {
    if !text.chars().any(char::is_alphabetic) {
        return UNKNOWN_LANGUAGE.to_string();
    }

    match whatlang::detect(text) {
        Some(info) => iso_639_1(info.lang().code()).to_string(),
        None => UNKNOWN_LANGUAGE.to_string(),
    }
}

/// Two-letter code for the languages the detector knows; three-letter code
/// otherwise.
fn iso_639_1(code: &'static str) -> &'static str {
    match code {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "nb",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        other => other,
    }
}

/// Summary, else description, else the first content block, else `""`.
pub fn select_summary(entry: &RawEntry) -> String {
    non_empty(entry.summary.as_deref())
        .or_else(|| non_empty(entry.description.as_deref()))
        .or_else(|| entry.content.first().map(String::as_str))
        .unwrap_or_default()
        .to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Shape one raw entry into an insert candidate for `source`.
pub fn normalize_entry(source: &FeedSource, entry: &RawEntry) -> NewArticle {
    let title = entry.title.clone().unwrap_or_else(|| MISSING.to_string());
    let summary = select_summary(entry);
    let url = entry.link.clone().unwrap_or_else(|| MISSING.to_string());
    let published = parse_date(entry.published.as_deref().unwrap_or(MISSING));
    let language = detect_language(&format!("{} {}", title, summary));

    NewArticle {
        title,
        published,
        source: source.name.clone(),
        country: source.country.clone(),
        summary,
        url,
        language,
    }
}
