//! Reciprocal label derivation for the relationship vocabulary.

use super::types::{RelationshipCategory, RelationshipRecord, Sex};

/// Reverse label used when a label has no defined inverse.
pub const DEFAULT_RECIPROCAL: &str = "Acquaintance";

const SYMMETRIC_LABELS: &[&str] = &[
	"Friend",
	"Best Friend",
	"Childhood Friend",
	"Acquaintance",
	"Neighbor",
	"Roommate",
	"Enemy",
	"Rival",
	"Ex-Partner",
	"Ex-Spouse",
	"Classmate",
	"Colleague",
	"Partner",
	"Partner (Business)",
];

/// Base inverse of a label, before sex-specific resolution.
fn base_inverse(label: &str) -> Option<&'static str> {
	if let Some(symmetric) = SYMMETRIC_LABELS.iter().copied().find(|l| *l == label) {
		return Some(symmetric);
	}
	let inverse = match label {
		"Husband" => "Wife",
		"Wife" => "Husband",
		"Fiancé" => "Fiancée",
		"Fiancée" => "Fiancé",
		"Father-in-law" | "Mother-in-law" => "Son-in-law",
		"Father" | "Mother" => "Child",
		"Son" | "Daughter" => "Parent",
		"Brother" | "Sister" => "Sibling",
		"Boss" | "Manager" => "Subordinate",
		"Subordinate" => "Boss",
		"Mentor" => "Mentee",
		"Mentee" => "Mentor",
		"Teacher" => "Student",
		"Student" => "Teacher",
		"Client" => "Vendor",
		"Vendor" => "Client",
		_ => return None,
	};
	Some(inverse)
}

/// The inverse of `label`, seen from the other end of the relationship.
///
/// `holder_sex` is the sex of the person the returned label describes and
/// resolves the generational and sibling bases into gendered terms. Labels
/// with no defined inverse get [`DEFAULT_RECIPROCAL`].
pub fn reciprocal_label(label: &str, holder_sex: Sex) -> &'static str {
	match (base_inverse(label.trim()), holder_sex) {
		(None, _) => DEFAULT_RECIPROCAL,
		(Some("Child"), Sex::Male) => "Son",
		(Some("Child"), Sex::Female) => "Daughter",
		(Some("Child"), Sex::Other) => "Son/Daughter",
		(Some("Parent"), Sex::Male) => "Father",
		(Some("Parent"), Sex::Female) => "Mother",
		(Some("Sibling"), Sex::Male) => "Brother",
		(Some("Sibling"), Sex::Female) => "Sister",
		(Some(inverse), _) => inverse,
	}
}

impl RelationshipRecord {
	/// Builds a record whose reverse label is derived from `forward_label`.
	///
	/// The forward label names what the target is to the source, so the
	/// reverse label describes the source and is gendered by `source_sex`.
	pub fn reciprocal(
		source: impl Into<String>,
		target: impl Into<String>,
		category: RelationshipCategory,
		forward_label: &str,
		source_sex: Sex,
	) -> Self {
		let reverse = reciprocal_label(forward_label, source_sex);
		Self::new(source, target, category, forward_label, reverse)
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("Husband", Sex::Other, "Wife")]
	#[case("Father", Sex::Male, "Son")]
	#[case("Mother", Sex::Female, "Daughter")]
	#[case("Father", Sex::Other, "Son/Daughter")]
	#[case("Son", Sex::Female, "Mother")]
	#[case("Daughter", Sex::Other, "Parent")]
	#[case("Brother", Sex::Male, "Brother")]
	#[case("Sister", Sex::Other, "Sibling")]
	#[case("Mentor", Sex::Male, "Mentee")]
	#[case("Best Friend", Sex::Female, "Best Friend")]
	#[case("Gym Buddy", Sex::Male, "Acquaintance")]
	#[case("Cousin", Sex::Female, "Acquaintance")]
	fn reciprocal_labels(#[case] label: &str, #[case] holder_sex: Sex, #[case] expected: &str) {
		assert_eq!(reciprocal_label(label, holder_sex), expected);
	}

	#[test]
	fn reciprocal_record_fills_reverse_label() {
		let record = RelationshipRecord::reciprocal(
			"a",
			"b",
			RelationshipCategory::Professional,
			"Boss",
			Sex::Female,
		);
		assert_eq!(record.forward_label, "Boss");
		assert_eq!(record.reverse_label, "Subordinate");
	}
}
