//! Settings key names and flag encoding.

/// Shared license key for both add-ons.
pub const LICENSE_KEY: &str = "license_key";

/// Sanitized server label.
pub const SERVER_NAME: &str = "server_name";

/// Linked account id (empty string when not linked).
pub const ACCOUNT_ID: &str = "account_id";

/// Prefix for per-runtime variant flags.
pub const VARIANT_PREFIX: &str = "php_versions_";

/// Value written for a set flag.
pub const FLAG_TRUE: &str = "true";

/// Build the flag key for a runtime version label.
///
/// Separator characters are dropped so `"8.1"` and `"81"` map to the same
/// key, `php_versions_81`.
pub fn variant_flag_key(version: &str) -> String {
    format!("{}{}", VARIANT_PREFIX, strip_separators(version))
}

/// Remove everything but ASCII alphanumerics from a version label.
pub fn strip_separators(version: &str) -> String {
    version.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Interpret a stored flag value.
///
/// Older installs wrote `"1"`; this crate writes `"true"`.
pub fn is_truthy(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1") | Some("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_key_strips_dots() {
        assert_eq!(variant_flag_key("8.1"), "php_versions_81");
        assert_eq!(variant_flag_key("81"), "php_versions_81");
    }

    #[test]
    fn variant_key_strips_other_separators() {
        assert_eq!(variant_flag_key("7.4-fpm"), "php_versions_74fpm");
    }

    #[test]
    fn truthy_values() {
        assert!(is_truthy(Some("1")));
        assert!(is_truthy(Some("true")));
        assert!(!is_truthy(Some("")));
        assert!(!is_truthy(Some("0")));
        assert!(!is_truthy(Some("false")));
        assert!(!is_truthy(None));
    }
}
