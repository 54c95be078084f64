use std::fmt;

/// Canonical gender categories shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// User-facing label.
    pub fn display_label(self) -> &'static str {
        match self {
            Gender::Male => "Laki-laki",
            Gender::Female => "Perempuan",
        }
    }

    /// Parse a label that is either a raw model code or already canonical.
    pub fn from_label(label: &str) -> Option<Gender> {
        match label {
            "M" | "Laki-laki" => Some(Gender::Male),
            "F" | "Perempuan" => Some(Gender::Female),
            _ => None,
        }
    }

    /// Parse only the canonical display form.
    pub fn from_display_label(label: &str) -> Option<Gender> {
        Gender::ALL.into_iter().find(|g| g.display_label() == label)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_label())
    }
}

/// Map a raw model label onto the display vocabulary.
///
/// `"M"` and `"F"` become their canonical forms; every other value, including
/// the canonical forms themselves, passes through unchanged.
pub fn normalize_label(raw: &str) -> String {
    match Gender::from_label(raw) {
        Some(g) => g.display_label().to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_codes_map_to_display_labels() {
        let raw = ["M", "F", "M", "X"];
        let normalized: Vec<String> = raw.iter().map(|r| normalize_label(r)).collect();
        assert_eq!(normalized, ["Laki-laki", "Perempuan", "Laki-laki", "X"]);
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["M", "F", "X", "", "m", "Laki-laki", "Perempuan"] {
            let once = normalize_label(raw);
            assert_eq!(normalize_label(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn lowercase_codes_are_not_recognised() {
        assert_eq!(normalize_label("m"), "m");
        assert_eq!(Gender::from_display_label("M"), None);
    }
}
