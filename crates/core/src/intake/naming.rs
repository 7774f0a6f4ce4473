//! Name normalization and sequence-based reference numbers.

/// Trims a person's name and title-cases every word.
///
/// A letter is upper-cased when it follows a non-letter, so
/// `"o'neil-smith"` becomes `"O'Neil-Smith"`. Inner runs of whitespace are kept.
#[must_use]
pub fn normalize_person_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_is_letter = false;

    for ch in raw.trim().chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }

    out
}

/// Formats a zero-padded reference such as `NID00001` or `RFQ0042`.
#[must_use]
pub fn format_reference(prefix: &str, width: usize, number: u64) -> String {
    format!("{prefix}{number:0width$}")
}
