//! Safe file names for user-supplied input

/// Reduce a user-supplied name to `[A-Za-z0-9._-]`, whitespace becomes `_`.
///
/// Path separators are dropped so the result never escapes its directory.
/// Returns an empty string when nothing usable remains.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();

    cleaned.trim_start_matches(['.', '_']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_kept() {
        assert_eq!(secure_filename("license.jpg"), "license.jpg");
    }

    #[test]
    fn test_directories_dropped() {
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename(r"C:\scans\challan 01.pdf"), "challan_01.pdf");
    }

    #[test]
    fn test_hidden_and_unicode() {
        assert_eq!(secure_filename(".bashrc"), "bashrc");
        assert_eq!(secure_filename("चालान.png"), "png");
        assert_eq!(secure_filename("///"), "");
    }
}
