use shared::domain::Species;

pub const EXCERPT_CHARS: usize = 150;
const ELLIPSIS: &str = "...";

/// What a card shows before the detail dialog is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSummary {
    pub image: Option<String>,
    pub title: String,
    pub scientific_name: String,
    pub excerpt: String,
}

impl CardSummary {
    pub fn of(species: &Species) -> Self {
        Self {
            image: species.image.clone(),
            title: display_name(species).to_string(),
            scientific_name: species.scientific_name.clone(),
            excerpt: excerpt(species.description.as_deref()),
        }
    }
}

/// Common name when there is one, otherwise the scientific name.
pub fn display_name(species: &Species) -> &str {
    species
        .common_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(&species.scientific_name)
}

/// Shortens a description to at most [`EXCERPT_CHARS`] characters plus an
/// ellipsis. Counts characters, not bytes.
pub fn excerpt(description: Option<&str>) -> String {
    let Some(text) = description.map(str::trim) else {
        return String::new();
    };
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", text[..cut].trim_end()),
        None => text.to_string(),
    }
}
