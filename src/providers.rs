const PROVIDERS: &[(&str, &str)] = &[
    ("AWS", "Amazon Web Services"),
    ("AZURE", "Microsoft Azure"),
    ("GCP", "Google Cloud Platform"),
    ("ESSENTIALS", "Essential Icons"),
    ("DEV", "Development Tools"),
    ("INFRA", "Infrastructure"),
    ("TECH", "Technology"),
    ("SOCIAL", "Social Media"),
    ("EMOTIONS", "Emojis"),
];

/// Maps provider codes (`AWS`) to display names (`Amazon Web Services`) and back.
#[derive(Debug, Clone)]
pub struct ProviderTable {
    entries: Vec<(String, String)>,
}

impl Default for ProviderTable {
    fn default() -> Self {
        Self::new(PROVIDERS.iter().map(|(code, name)| (code.to_string(), name.to_string())))
    }
}

impl ProviderTable {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(code, name)| (code.to_uppercase(), name))
                .collect(),
        }
    }

    /// Display name for a code; unknown codes are title-cased (`FOO` → `Foo`).
    pub fn full_name(&self, code: &str) -> String {
        let upper = code.to_uppercase();
        self.entries
            .iter()
            .find(|(c, _)| *c == upper)
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| title_case(&code.to_lowercase()))
    }

    /// Output directory key for a display name; unknown names are lowercased.
    pub fn key(&self, full_name: &str) -> String {
        self.entries
            .iter()
            .find(|(_, name)| name == full_name)
            .map(|(code, _)| code.to_lowercase())
            .unwrap_or_else(|| full_name.to_lowercase())
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if at_word_start && ch.is_alphanumeric() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !(ch.is_alphanumeric() || ch == '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        let t = ProviderTable::default();
        assert_eq!(t.full_name("AWS"), "Amazon Web Services");
        assert_eq!(t.full_name("aws"), "Amazon Web Services");
        assert_eq!(t.full_name("EMOTIONS"), "Emojis");
        assert_eq!(t.key("Amazon Web Services"), "aws");
        assert_eq!(t.key("Emojis"), "emotions");
    }

    #[test]
    fn unknown_codes_fall_back() {
        let t = ProviderTable::default();
        assert_eq!(t.full_name("KUBERNETES"), "Kubernetes");
        assert_eq!(t.full_name("open-source"), "Open-Source");
        assert_eq!(t.full_name("FOO_BAR"), "Foo_bar");
        assert_eq!(t.full_name("my tools"), "My Tools");
        assert_eq!(t.key("Kubernetes"), "kubernetes");
    }

    #[test]
    fn round_trip_for_table_entries() {
        let t = ProviderTable::default();
        for (code, _) in PROVIDERS {
            assert_eq!(t.key(&t.full_name(code)), code.to_lowercase());
        }
    }
}
