/// Canonical dialable form for the notifier: country code plus number, digits only.
///
/// Ten-digit local numbers get the India prefix; anything else is returned as
/// bare digits on a best-effort basis. An empty result means "no phone".
pub fn normalize(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 && !digits.starts_with('0') {
        return format!("91{}", digits);
    }
    digits
}
