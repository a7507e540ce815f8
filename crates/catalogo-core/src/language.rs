//! Language names as they appear in the catalog `Idioma` column

/// Map a user-typed language name to the spelling used by the catalog.
///
/// Accepts the accented, unaccented and capitalised-unaccented forms.
/// Unknown names are passed through trimmed.
pub fn canonical_language(name: &str) -> String {
    let name = name.trim();
    let canonical = match name {
        "alemán" | "aleman" | "Aleman" => "Alemán",
        "catalán" | "catalan" | "Catalan" => "Catalán",
        "español" | "espanol" | "Espanol" => "Español",
        "esperanto" => "Esperanto",
        "euskera" => "Euskera",
        "francés" | "frances" | "Frances" => "Francés",
        "gallego" => "Gallego",
        "inglés" | "ingles" | "Ingles" => "Inglés",
        "italiano" => "Italiano",
        "portugués" | "portugues" | "Portugues" => "Portugués",
        other => other,
    };
    canonical.to_string()
}

/// Allow-list of canonical language names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageFilter {
    names: Vec<String>,
}

impl LanguageFilter {
    /// Build from raw names. Returns `None` when nothing non-empty remains,
    /// meaning "no filtering".
    pub fn new<S: AsRef<str>>(names: &[S]) -> Option<Self> {
        let names: Vec<String> = names
            .iter()
            .map(|n| n.as_ref().trim())
            .filter(|n| !n.is_empty())
            .map(canonical_language)
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(Self { names })
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Exact match against the trimmed field value.
    pub fn allows(&self, language: &str) -> bool {
        let language = language.trim();
        self.names.iter().any(|n| n == language)
    }

    /// Case-insensitive substring match: any allowed name contained in the field.
    pub fn appears_in(&self, language: &str) -> bool {
        let language = language.to_lowercase();
        self.names
            .iter()
            .any(|n| language.contains(&n.to_lowercase()))
    }
}
