use crate::models::Language;

/// Strips a UTF-8 BOM if the text starts with one. Pasted or uploaded text
/// from Windows editors often carries it.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

pub fn download_file_name(source: Language, target: Language) -> String {
    format!("translation_{source}_to_{target}.txt")
}
