//! Keystroke handling for numeric inputs.

/// Apply one typed character to the current text of a number field.
///
/// A lone `"0"` is replaced by the next digit instead of growing a leading
/// zero. Only one decimal point and a leading minus sign are accepted; every
/// other character is ignored.
pub fn apply_keystroke(current: &str, key: char) -> String {
    if key.is_ascii_digit() {
        if current == "0" {
            return key.to_string();
        }
        if current == "-0" {
            return format!("-{}", key);
        }
        return format!("{}{}", current, key);
    }

    match key {
        '.' if !current.contains('.') => {
            if current.is_empty() || current == "-" {
                format!("{}0.", current)
            } else {
                format!("{}.", current)
            }
        }
        '-' if current.is_empty() => "-".to_string(),
        _ => current.to_string(),
    }
}

/// Normalize pasted or programmatic text as if it had been typed.
pub fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .fold(String::new(), |acc, key| apply_keystroke(&acc, key))
}
