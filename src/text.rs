//! Diacritic-insensitive matching and highlight markup
//!
//! Vietnamese place names carry stacked diacritics ("Đà Lạt", "Hồ Hoàn Kiếm").
//! Matching folds both sides to plain ASCII-ish lowercase so "da lat" finds
//! "Đà Lạt", while the highlight itself wraps the literal, un-normalized text
//! typed by the user.

use regex::RegexBuilder;
use unicode_normalization::UnicodeNormalization;

/// Opening tag wrapped around the matched fragment
pub const EMPHASIS_OPEN: &str = r#"<strong class="text-primary">"#;
/// Closing tag wrapped around the matched fragment
pub const EMPHASIS_CLOSE: &str = "</strong>";

/// Strip combining marks (U+0300..=U+036F) after canonical decomposition and
/// map `đ`/`Đ` to `d`/`D`.
///
/// ```
/// use tripsearch::text::remove_accents;
///
/// assert_eq!(remove_accents("Đà Lạt"), "Da Lat");
/// ```
pub fn remove_accents(s: &str) -> String {
    s.nfd()
        .filter(|c| !('\u{0300}'..='\u{036F}').contains(c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect()
}

/// Lowercase then strip accents
pub fn fold(s: &str) -> String {
    remove_accents(&s.to_lowercase())
}

/// Whether `query` occurs in `candidate` once both are folded
pub fn matches_normalized(candidate: &str, query: &str) -> bool {
    fold(candidate).contains(&fold(query))
}

/// Wrap the first case-insensitive literal occurrence of `query` in `name`.
///
/// The normalized comparison gates the attempt; when the folded texts share
/// the substring but the literal query does not appear (e.g. "da lat" vs
/// "Đà Lạt"), the name comes back unchanged.
pub fn highlight(name: &str, query: &str) -> String {
    if query.is_empty() || !matches_normalized(name, query) {
        return name.to_string();
    }

    let re = match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re,
        Err(e) => {
            tracing::debug!("Highlight pattern rejected for {:?}: {}", query, e);
            return name.to_string();
        }
    };

    re.replacen(name, 1, |caps: &regex::Captures| {
        format!("{}{}{}", EMPHASIS_OPEN, &caps[0], EMPHASIS_CLOSE)
    })
    .into_owned()
}
