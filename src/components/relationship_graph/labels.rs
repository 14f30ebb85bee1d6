//! Directional label resolution for relationship edges.
//!
//! Relationships are stored once with a forward and a reverse label. Which of
//! the two is shown, and which way the drawn arrow points, depends on whose
//! perspective the current selection puts the viewer in.

use super::types::{PersonId, RelationshipRecord};

/// Nouns whose plural does not follow the suffix rules.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
	("child", "children"),
	("person", "people"),
	("man", "men"),
	("woman", "women"),
	("wife", "wives"),
];

const IN_LAW_SUFFIX: &str = "-in-law";

/// An edge as it should be drawn for one selection state.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeView<'a> {
	pub from: &'a PersonId,
	pub to: &'a PersonId,
	pub label: Option<String>,
}

/// Resolves direction and label of `edge` from the perspective of `selected`.
pub fn resolve_edge<'a>(edge: &'a RelationshipRecord, selected: Option<&PersonId>) -> EdgeView<'a> {
	let stored = |label| EdgeView {
		from: &edge.source_id,
		to: &edge.target_id,
		label,
	};

	match selected {
		None => stored(combined_label(&edge.forward_label, &edge.reverse_label)),
		Some(id) if id == &edge.source_id => stored(non_blank(&edge.forward_label)),
		Some(id) if id == &edge.target_id => EdgeView {
			from: &edge.target_id,
			to: &edge.source_id,
			label: non_blank(&edge.reverse_label),
		},
		Some(_) => stored(None),
	}
}

/// The label text alone; see [`resolve_edge`].
pub fn resolve_label(edge: &RelationshipRecord, selected: Option<&PersonId>) -> Option<String> {
	resolve_edge(edge, selected).label
}

fn non_blank(label: &str) -> Option<String> {
	let label = label.trim();
	(!label.is_empty()).then(|| label.to_owned())
}

/// Label shown when nobody is selected: a plural for symmetric relationships,
/// otherwise both perspectives side by side.
fn combined_label(forward: &str, reverse: &str) -> Option<String> {
	match (non_blank(forward), non_blank(reverse)) {
		(Some(forward), Some(reverse)) if forward.to_lowercase() == reverse.to_lowercase() => {
			Some(pluralize(&forward))
		}
		(Some(forward), Some(reverse)) => Some(format!("{forward} / {reverse}")),
		(Some(only), None) | (None, Some(only)) => Some(only),
		(None, None) => None,
	}
}

/// Pluralizes a relationship label by its head noun.
///
/// The head noun is the last word, or the word before an `-in-law` suffix.
/// A trailing parenthetical qualifier is carried over untouched.
pub fn pluralize(label: &str) -> String {
	let label = label.trim();
	let (head, qualifier) = match label.rfind(" (") {
		Some(at) if label.ends_with(')') => label.split_at(at),
		_ => (label, ""),
	};

	// ASCII folding keeps byte offsets valid for slicing `head`.
	let (prefix, noun, suffix) = match head.to_ascii_lowercase().find(IN_LAW_SUFFIX) {
		Some(at) if at > 0 => ("", &head[..at], &head[at..]),
		_ => match head.rfind(' ') {
			Some(at) => (&head[..=at], &head[at + 1..], ""),
			None => ("", head, ""),
		},
	};

	format!("{prefix}{}{suffix}{qualifier}", pluralize_word(noun))
}

fn pluralize_word(word: &str) -> String {
	if word.is_empty() {
		return String::new();
	}

	// Irregulars match on the last hyphen segment so "Ex-Wife" becomes "Ex-Wives".
	let (lead, segment) = match word.rfind('-') {
		Some(at) => word.split_at(at + 1),
		None => ("", word),
	};
	let lower = segment.to_lowercase();
	if let Some((_, plural)) = IRREGULAR_PLURALS.iter().find(|(singular, _)| *singular == lower) {
		return format!("{lead}{}", match_capitalization(segment, plural));
	}

	if ["s", "x", "z", "ch", "sh"].iter().any(|end| lower.ends_with(end)) {
		return format!("{word}es");
	}

	let mut chars = lower.chars().rev();
	if let (Some('y'), Some(before)) = (chars.next(), chars.next()) {
		if !"aeiou".contains(before) {
			return format!("{}ies", &word[..word.len() - 1]);
		}
	}

	format!("{word}s")
}

fn match_capitalization(original: &str, replacement: &str) -> String {
	let capitalized = original.chars().next().is_some_and(char::is_uppercase);
	let mut chars = replacement.chars();
	match chars.next() {
		Some(first) if capitalized => first.to_uppercase().chain(chars).collect(),
		_ => replacement.to_owned(),
	}
}
