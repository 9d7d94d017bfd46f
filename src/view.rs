//! Filtering and card projection for the working collection.

use crate::model::Record;
use std::fmt;

pub const EMPTY_PLACEHOLDER: &str = "No matches. Try a different search.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Edit,
    Share,
    Delete,
}

impl fmt::Display for CardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardAction::Edit => write!(f, "Edit"),
            CardAction::Share => write!(f, "Share"),
            CardAction::Delete => write!(f, "Delete"),
        }
    }
}

pub const ALL_ACTIONS: &[CardAction] = &[CardAction::Edit, CardAction::Share, CardAction::Delete];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdultBlock {
    pub name: String,
    pub extra: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub title: String,
    pub badges: Vec<String>,
    pub ingredients: Vec<String>,
    pub method: Vec<String>,
    pub note: Option<String>,
    pub adult: Option<AdultBlock>,
    pub actions: Vec<CardAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grid {
    Cards(Vec<Card>),
    Empty(&'static str),
}

/// Case-insensitive substring match against name, notes and ingredients.
pub fn matches(record: &Record, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    let hay = format!(
        "{} {} {}",
        record.name,
        record.notes,
        record.ingredients.join(" ")
    )
    .to_lowercase();
    hay.contains(&q)
}

/// Records matching `query`, in collection order. `show_adult` never
/// removes records; it only affects rendering.
pub fn visible<'a>(collection: &'a [Record], query: &str, _show_adult: bool) -> Vec<&'a Record> {
    collection.iter().filter(|r| matches(r, query)).collect()
}

pub fn render_card(record: &Record, show_adult: bool, actions: &[CardAction]) -> Card {
    Card {
        id: record.id.clone(),
        title: record.name.clone(),
        badges: record.tags.clone(),
        ingredients: record.ingredients.clone(),
        method: record.method.clone(),
        note: (!record.notes.is_empty()).then(|| record.notes.clone()),
        adult: record
            .adult_variant
            .as_ref()
            .filter(|_| show_adult)
            .map(|av| AdultBlock {
                name: av.name.clone(),
                extra: av.extra.join(", "),
                note: av.note.clone(),
            }),
        actions: actions.to_vec(),
    }
}

pub fn render(collection: &[Record], query: &str, show_adult: bool, actions: &[CardAction]) -> Grid {
    let cards: Vec<Card> = visible(collection, query, show_adult)
        .into_iter()
        .map(|r| render_card(r, show_adult, actions))
        .collect();
    if cards.is_empty() {
        Grid::Empty(EMPTY_PLACEHOLDER)
    } else {
        Grid::Cards(cards)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}  ({})", self.title, self.id)?;
        if !self.badges.is_empty() {
            let badges: Vec<String> = self.badges.iter().map(|b| format!("[{b}]")).collect();
            writeln!(f, "  {}", badges.join(" "))?;
        }
        writeln!(f, "  Ingredients")?;
        for item in &self.ingredients {
            writeln!(f, "    - {item}")?;
        }
        writeln!(f, "  Method")?;
        for (n, step) in self.method.iter().enumerate() {
            writeln!(f, "    {}. {step}", n + 1)?;
        }
        if let Some(note) = &self.note {
            writeln!(f, "  Note: {note}")?;
        }
        if let Some(adult) = &self.adult {
            writeln!(f, "  Adult Variant")?;
            writeln!(f, "    {}: {}", adult.name, adult.extra)?;
            if !adult.note.is_empty() {
                writeln!(f, "    {}", adult.note)?;
            }
        }
        if !self.actions.is_empty() {
            let actions: Vec<String> = self.actions.iter().map(|a| a.to_string()).collect();
            writeln!(f, "  [{}]", actions.join("] ["))?;
        }
        Ok(())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grid::Empty(placeholder) => writeln!(f, "{placeholder}"),
            Grid::Cards(cards) => {
                for (n, card) in cards.iter().enumerate() {
                    if n > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{card}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AdultVariant;

    fn record(id: &str, name: &str, notes: &str, ingredients: &[&str]) -> Record {
        let mut r = Record::new(id, name);
        r.notes = notes.to_string();
        r.ingredients = ingredients.iter().map(|s| s.to_string()).collect();
        r.method = vec!["Stir".to_string()];
        r
    }

    fn spiced() -> Record {
        let mut r = record("spiced", "Dirty Dr Pepper", "", &["Dr Pepper"]);
        r.adult_variant = Some(AdultVariant {
            name: "Dirty Dr Pepper — Spiced".to_string(),
            extra: vec!["1 oz bourbon".to_string(), "bitters".to_string()],
            note: "Stir, don't shake".to_string(),
        });
        r
    }

    #[test]
    fn filter_is_case_insensitive() {
        let collection = vec![
            record("a", "Cola Float", "", &["cola"]),
            record("b", "Root Beer", "", &["root beer"]),
        ];
        let hits = visible(&collection, "COLA", false);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Cola Float");
    }

    #[test]
    fn empty_or_blank_query_matches_everything() {
        let collection = vec![record("a", "A", "", &[]), record("b", "B", "", &[])];
        assert_eq!(visible(&collection, "", false).len(), 2);
        assert_eq!(visible(&collection, "   ", true).len(), 2);
    }

    #[test]
    fn query_is_trimmed() {
        let collection = vec![record("a", "Cola Float", "", &[])];
        assert_eq!(visible(&collection, "  float  ", false).len(), 1);
    }

    #[test]
    fn filter_searches_notes_and_ingredients() {
        let collection = vec![
            record("a", "Alpha", "best with pebble ice", &[]),
            record("b", "Bravo", "", &["Coconut syrup"]),
            record("c", "Charlie", "", &["lime"]),
        ];
        let ids: Vec<&str> = visible(&collection, "pebble", false).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
        let ids: Vec<&str> = visible(&collection, "coconut", false).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn show_adult_does_not_filter() {
        let collection = vec![spiced(), record("plain", "Plain", "", &[])];
        assert_eq!(visible(&collection, "", false).len(), 2);
        assert_eq!(visible(&collection, "", true).len(), 2);
    }

    #[test]
    fn adult_block_follows_flag() {
        let rec = spiced();
        assert!(render_card(&rec, false, ALL_ACTIONS).adult.is_none());
        let adult = render_card(&rec, true, ALL_ACTIONS).adult.unwrap();
        assert_eq!(adult.extra, "1 oz bourbon, bitters");
        assert_eq!(adult.note, "Stir, don't shake");
    }

    #[test]
    fn no_adult_block_without_variant() {
        let rec = record("plain", "Plain", "", &[]);
        assert!(render_card(&rec, true, ALL_ACTIONS).adult.is_none());
    }

    #[test]
    fn note_block_only_when_notes_present() {
        assert!(render_card(&record("a", "A", "", &[]), false, &[]).note.is_none());
        let card = render_card(&record("a", "A", "Serve cold", &[]), false, &[]);
        assert_eq!(card.note.as_deref(), Some("Serve cold"));
    }

    #[test]
    fn card_keeps_order_of_lists() {
        let mut rec = record("a", "A", "", &["one", "two", "three"]);
        rec.tags = vec!["z".to_string(), "a".to_string()];
        rec.method = vec!["first".to_string(), "second".to_string()];
        let card = render_card(&rec, false, ALL_ACTIONS);
        assert_eq!(card.badges, vec!["z", "a"]);
        assert_eq!(card.ingredients, vec!["one", "two", "three"]);
        assert_eq!(card.method, vec!["first", "second"]);
        assert_eq!(card.actions, ALL_ACTIONS.to_vec());
    }

    #[test]
    fn empty_result_renders_placeholder() {
        let collection = vec![record("a", "Cola Float", "", &[])];
        assert_eq!(render(&collection, "horchata", false, ALL_ACTIONS), Grid::Empty(EMPTY_PLACEHOLDER));
        let text = render(&[], "", false, ALL_ACTIONS).to_string();
        assert!(text.contains("No matches"), "{text}");
    }

    #[test]
    fn text_rendering_includes_sections() {
        let text = render_card(&spiced(), true, ALL_ACTIONS).to_string();
        assert!(text.contains("Dirty Dr Pepper  (spiced)"), "{text}");
        assert!(text.contains("Ingredients"), "{text}");
        assert!(text.contains("1. Stir"), "{text}");
        assert!(text.contains("Adult Variant"), "{text}");
        assert!(text.contains("[Edit] [Share] [Delete]"), "{text}");

        let text = render_card(&spiced(), false, &[]).to_string();
        assert!(!text.contains("Adult Variant"), "{text}");
        assert!(!text.contains("[Edit]"), "{text}");
    }
}
