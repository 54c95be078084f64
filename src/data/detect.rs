/// Column labels (lower-case) that are taken to hold full names.
pub const NAME_KEYWORDS: &[&str] = &["nama", "name"];

/// Return the first column whose trimmed, lower-cased label is a name keyword.
///
/// `None` means the caller has to ask the user to pick the column by hand.
pub fn find_name_column<S: AsRef<str>>(columns: &[S]) -> Option<&str> {
    columns
        .iter()
        .map(AsRef::<str>::as_ref)
        .find(|col| {
            let key = col.trim().to_lowercase();
            NAME_KEYWORDS.contains(&key.as_str())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_exact_keyword_case_insensitively() {
        assert_eq!(find_name_column(&["ID", "Name", "Score"]), Some("Name"));
        assert_eq!(find_name_column(&["NAMA", "Kota"]), Some("NAMA"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(find_name_column(&["ID", "  nama "]), Some("  nama "));
    }

    #[test]
    fn partial_matches_do_not_count() {
        assert_eq!(find_name_column(&["ID", "Full_Name", "Score"]), None);
        assert_eq!(find_name_column::<&str>(&[]), None);
    }

    #[test]
    fn first_match_in_column_order_wins() {
        assert_eq!(find_name_column(&["Name", "Nama"]), Some("Name"));
    }
}
