//! # Labeled Enumerations
//!
//! A [`LabeledEnum`] is the value domain of a state column: an ordered list
//! of named members, each with a value and an optional [`Label`], plus named
//! groups of member values for membership tests.
//!
//! ```text
//! DRAFT      = 0  "Draft"
//! PENDING    = 1  ("pending", "Pending")
//! PUBLISHED  = 2  ("published", "Published")
//! UNPUBLISHED = {DRAFT, PENDING}
//! ```
//!
//! ## Validation
//!
//! [`LabeledEnumBuilder::build()`] rejects, regardless of declaration order:
//! - a symbol declared twice (members and groups share one namespace),
//! - a value shared by two members,
//! - a group that is empty or references a value no member declares.
//!
//! ## Declarative Form
//!
//! [`EnumDefinition`] is the serde form. Groups there reference members by
//! symbol name:
//!
//! ```yaml
//! members:
//!   - { name: DRAFT, value: 0, label: Draft }
//!   - { name: PUBLISHED, value: 2, label: { name: published, title: Published } }
//! groups:
//!   LIVE: [PUBLISHED]
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoastError, EnumError};
use crate::label::{Label, NameTitle};
use crate::value::StateValue;

// ─── Members ─────────────────────────────────────────────────────────

/// One named value of a [`LabeledEnum`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember<V> {
    /// Symbol name, conventionally uppercase (`DRAFT`).
    pub name: String,
    /// The stored value.
    pub value: V,
    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
}

#[derive(Debug, Clone)]
struct EnumGroup<V> {
    name: String,
    values: BTreeSet<V>,
}

// ─── LabeledEnum ─────────────────────────────────────────────────────

/// An ordered, validated enumeration of labeled state values.
///
/// Immutable once built. Lookups by value are constant time; declaration
/// order is preserved for iteration.
#[derive(Debug, Clone)]
pub struct LabeledEnum<V: StateValue> {
    members: Vec<EnumMember<V>>,
    groups: Vec<EnumGroup<V>>,
    by_value: HashMap<V, usize>,
}

impl<V: StateValue> LabeledEnum<V> {
    /// Start declaring an enumeration.
    pub fn builder() -> LabeledEnumBuilder<V> {
        LabeledEnumBuilder::new()
    }

    /// Parse an [`EnumDefinition`] from YAML and build it.
    pub fn from_yaml(source: &str) -> Result<Self, CoastError>
    where
        V: DeserializeOwned,
    {
        EnumDefinition::from_yaml(source)?.build()
    }

    /// Parse an [`EnumDefinition`] from JSON and build it.
    pub fn from_json(source: &str) -> Result<Self, CoastError>
    where
        V: DeserializeOwned,
    {
        EnumDefinition::from_json(source)?.build()
    }

    /// The label for a value, if the value is a member and has a label.
    pub fn get(&self, value: &V) -> Option<&Label> {
        self.member(value).and_then(|m| m.label.as_ref())
    }

    /// The member declaring `value`.
    pub fn member(&self, value: &V) -> Option<&EnumMember<V>> {
        self.by_value.get(value).map(|&i| &self.members[i])
    }

    /// Whether `value` is declared by a member (groups excluded).
    pub fn contains(&self, value: &V) -> bool {
        self.by_value.contains_key(value)
    }

    /// All member values in declaration order.
    pub fn keys(&self) -> Vec<V> {
        self.members.iter().map(|m| m.value).collect()
    }

    /// Labels of all members that carry one, in declaration order.
    pub fn labels(&self) -> Vec<&Label> {
        self.members.iter().filter_map(|m| m.label.as_ref()).collect()
    }

    /// `(value, label)` pairs in declaration order.
    pub fn items(&self) -> impl Iterator<Item = (V, Option<&Label>)> + '_ {
        self.members.iter().map(|m| (m.value, m.label.as_ref()))
    }

    /// The value whose [`NameTitle`] label has the given machine name.
    pub fn value_for(&self, name: &str) -> Option<V> {
        self.members
            .iter()
            .find(|m| {
                m.label
                    .as_ref()
                    .and_then(Label::name)
                    .is_some_and(|n| n == name)
            })
            .map(|m| m.value)
    }

    /// All [`NameTitle`] labels in declaration order.
    pub fn nametitles(&self) -> Vec<&NameTitle> {
        self.members
            .iter()
            .filter_map(|m| m.label.as_ref().and_then(Label::as_name_title))
            .collect()
    }

    /// The value of a member symbol.
    pub fn value_of(&self, symbol: &str) -> Option<V> {
        self.members
            .iter()
            .find(|m| m.name == symbol)
            .map(|m| m.value)
    }

    /// The symbol declaring `value`.
    pub fn name_of(&self, value: &V) -> Option<&str> {
        self.member(value).map(|m| m.name.as_str())
    }

    /// The values of a group symbol.
    pub fn group(&self, symbol: &str) -> Option<&BTreeSet<V>> {
        self.groups
            .iter()
            .find(|g| g.name == symbol)
            .map(|g| &g.values)
    }

    /// All members in declaration order.
    pub fn members(&self) -> &[EnumMember<V>] {
        &self.members
    }

    /// All groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &BTreeSet<V>)> + '_ {
        self.groups.iter().map(|g| (g.name.as_str(), &g.values))
    }

    /// Number of members (groups excluded).
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Collects members and groups; validation happens in [`build()`](Self::build).
#[derive(Debug, Clone)]
pub struct LabeledEnumBuilder<V> {
    members: Vec<EnumMember<V>>,
    groups: Vec<EnumGroup<V>>,
    unresolved: Option<EnumError>,
}

impl<V: StateValue> Default for LabeledEnumBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: StateValue> LabeledEnumBuilder<V> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            groups: Vec::new(),
            unresolved: None,
        }
    }

    /// Declare a member with a label.
    pub fn member(mut self, name: impl Into<String>, value: V, label: impl Into<Label>) -> Self {
        self.members.push(EnumMember {
            name: name.into(),
            value,
            label: Some(label.into()),
        });
        self
    }

    /// Declare a member without a label.
    pub fn unlabeled(mut self, name: impl Into<String>, value: V) -> Self {
        self.members.push(EnumMember {
            name: name.into(),
            value,
            label: None,
        });
        self
    }

    /// Declare a group of member values.
    pub fn group(mut self, name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        self.groups.push(EnumGroup {
            name: name.into(),
            values: values.into_iter().collect(),
        });
        self
    }

    /// Declare a group by member symbol names.
    ///
    /// Names are resolved against members declared so far; an unknown name
    /// is reported by [`build()`](Self::build).
    pub fn group_of<S: AsRef<str>>(
        mut self,
        name: impl Into<String>,
        symbols: impl IntoIterator<Item = S>,
    ) -> Self {
        let name = name.into();
        let mut values = BTreeSet::new();
        for symbol in symbols {
            let symbol = symbol.as_ref();
            match self.members.iter().find(|m| m.name == symbol) {
                Some(m) => {
                    values.insert(m.value);
                }
                None => {
                    if self.unresolved.is_none() {
                        self.unresolved = Some(EnumError::UndefinedGroupMember {
                            group: name.clone(),
                            member: format!("{symbol:?}"),
                        });
                    }
                }
            }
        }
        self.groups.push(EnumGroup { name, values });
        self
    }

    /// Validate and freeze the enumeration.
    pub fn build(self) -> Result<LabeledEnum<V>, EnumError> {
        if let Some(err) = self.unresolved {
            return Err(err);
        }

        let mut names: HashMap<&str, ()> = HashMap::new();
        let mut by_value: HashMap<V, usize> = HashMap::new();

        for (i, member) in self.members.iter().enumerate() {
            check_name(&member.name)?;
            if names.insert(&member.name, ()).is_some() {
                return Err(EnumError::DuplicateName {
                    name: member.name.clone(),
                });
            }
            if let Some(&first) = by_value.get(&member.value) {
                return Err(EnumError::DuplicateValue {
                    value: format!("{:?}", member.value),
                    first: self.members[first].name.clone(),
                    second: member.name.clone(),
                });
            }
            by_value.insert(member.value, i);
        }

        for group in &self.groups {
            check_name(&group.name)?;
            if names.insert(&group.name, ()).is_some() {
                return Err(EnumError::DuplicateName {
                    name: group.name.clone(),
                });
            }
            if group.values.is_empty() {
                return Err(EnumError::EmptyGroup {
                    group: group.name.clone(),
                });
            }
            if let Some(missing) = group.values.iter().find(|v| !by_value.contains_key(v)) {
                return Err(EnumError::UndefinedGroupMember {
                    group: group.name.clone(),
                    member: format!("{missing:?}"),
                });
            }
        }

        Ok(LabeledEnum {
            members: self.members,
            groups: self.groups,
            by_value,
        })
    }
}

fn check_name(name: &str) -> Result<(), EnumError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(EnumError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

// ─── Declarative Definition ──────────────────────────────────────────

/// Serde form of a [`LabeledEnum`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDefinition<V> {
    /// Members in declaration order.
    pub members: Vec<EnumMember<V>>,
    /// Groups, each a list of member symbol names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, Vec<String>>,
}

impl<V: StateValue + DeserializeOwned> EnumDefinition<V> {
    pub fn from_yaml(source: &str) -> Result<Self, CoastError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json(source: &str) -> Result<Self, CoastError> {
        Ok(serde_json::from_str(source)?)
    }
}

impl<V: StateValue> EnumDefinition<V> {
    /// Resolve group symbols and validate.
    pub fn build(self) -> Result<LabeledEnum<V>, CoastError> {
        let mut builder = LabeledEnumBuilder {
            members: self.members,
            groups: Vec::new(),
            unresolved: None,
        };
        for (name, symbols) in self.groups {
            builder = builder.group_of(name, symbols);
        }
        Ok(builder.build()?)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn post_states() -> LabeledEnum<i32> {
        LabeledEnum::builder()
            .member("DRAFT", 0, "Draft")
            .member("PENDING", 1, ("pending", "Pending"))
            .member("PUBLISHED", 2, ("published", "Published"))
            .group("UNPUBLISHED", [0, 1])
            .build()
            .unwrap()
    }

    // ── Lookup tests ─────────────────────────────────────────────────

    #[test]
    fn test_label_lookup_by_value() {
        let states = post_states();
        assert_eq!(states.get(&0), Some(&Label::from("Draft")));
        assert_eq!(states.get(&2).map(Label::title), Some("Published"));
        assert_eq!(states.get(&4), None);
    }

    #[test]
    fn test_keys_preserve_declaration_order() {
        let states = LabeledEnum::builder()
            .member("FIRST", 1, "First")
            .member("THIRD", 3, "Third")
            .member("SECOND", 2, "Second")
            .build()
            .unwrap();
        assert_eq!(states.keys(), vec![1, 3, 2]);
        let titles: Vec<&str> = states.labels().into_iter().map(Label::title).collect();
        assert_eq!(titles, vec!["First", "Third", "Second"]);
    }

    #[test]
    fn test_value_for_name_title() {
        let states = post_states();
        assert_eq!(states.value_for("pending"), Some(1));
        assert_eq!(states.value_for("published"), Some(2));
        // Plain-text labels have no machine name.
        assert_eq!(states.value_for("Draft"), None);
        assert_eq!(states.nametitles().len(), 2);
    }

    #[test]
    fn test_symbol_lookup() {
        let states = post_states();
        assert_eq!(states.value_of("PENDING"), Some(1));
        assert_eq!(states.name_of(&2), Some("PUBLISHED"));
        assert_eq!(states.value_of("UNPUBLISHED"), None);
        let group = states.group("UNPUBLISHED").unwrap();
        assert!(group.contains(&0));
        assert!(!group.contains(&2));
    }

    #[test]
    fn test_groups_are_not_members() {
        let states = post_states();
        assert_eq!(states.len(), 3);
        assert!(states.contains(&1));
        assert!(!states.contains(&9));
        assert_eq!(states.groups().count(), 1);
    }

    #[test]
    fn test_non_integer_values() {
        let rsvp = LabeledEnum::builder()
            .member("RSVP_Y", 'Y', "Yes")
            .member("RSVP_M", 'M', "Maybe")
            .member("RSVP_U", 'U', "Unknown")
            .group_of("UNCERTAIN", ["RSVP_M", "RSVP_U"])
            .build()
            .unwrap();
        let uncertain = rsvp.group("UNCERTAIN").unwrap();
        assert!(uncertain.contains(&'M'));
        assert!(!uncertain.contains(&'Y'));
    }

    // ── Validation tests ─────────────────────────────────────────────

    #[test]
    fn test_duplicate_value_rejected() {
        let result = LabeledEnum::builder()
            .member("DRAFT", 0, "Draft")
            .member("SKETCH", 0, "Sketch")
            .build();
        assert_eq!(
            result.unwrap_err(),
            EnumError::DuplicateValue {
                value: "0".into(),
                first: "DRAFT".into(),
                second: "SKETCH".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = LabeledEnum::builder()
            .member("DRAFT", 0, "Draft")
            .member("DRAFT", 1, "Draft again")
            .build();
        assert!(matches!(result, Err(EnumError::DuplicateName { .. })));
    }

    #[test]
    fn test_group_name_clashing_with_member_rejected() {
        let result = LabeledEnum::builder()
            .member("DRAFT", 0, "Draft")
            .group("DRAFT", [0])
            .build();
        assert!(matches!(result, Err(EnumError::DuplicateName { .. })));
    }

    #[test]
    fn test_group_with_undefined_value_rejected() {
        let result = LabeledEnum::builder()
            .member("DRAFT", 0, "Draft")
            .group("LIVE", [0, 5])
            .build();
        assert_eq!(
            result.unwrap_err(),
            EnumError::UndefinedGroupMember {
                group: "LIVE".into(),
                member: "5".into(),
            }
        );
    }

    #[test]
    fn test_group_with_undefined_symbol_rejected() {
        let result = LabeledEnum::builder()
            .member("DRAFT", 0, "Draft")
            .group_of("LIVE", ["PUBLISHED"])
            .build();
        assert!(matches!(
            result,
            Err(EnumError::UndefinedGroupMember { .. })
        ));
    }

    #[test]
    fn test_empty_group_rejected() {
        let result = LabeledEnum::builder()
            .member("DRAFT", 0, "Draft")
            .group("NOTHING", Vec::<i32>::new())
            .build();
        assert!(matches!(result, Err(EnumError::EmptyGroup { .. })));
    }

    #[test]
    fn test_blank_symbol_rejected() {
        let result = LabeledEnum::builder().member("", 0, "Draft").build();
        assert!(matches!(result, Err(EnumError::InvalidName { .. })));
    }

    // ── Definition tests ─────────────────────────────────────────────

    #[test]
    fn test_from_yaml() {
        let states: LabeledEnum<i32> = LabeledEnum::from_yaml(
            r#"
members:
  - { name: DRAFT, value: 0, label: Draft }
  - { name: PENDING, value: 1, label: { name: pending, title: Pending } }
  - { name: PUBLISHED, value: 2 }
groups:
  UNPUBLISHED: [DRAFT, PENDING]
"#,
        )
        .unwrap();
        assert_eq!(states.keys(), vec![0, 1, 2]);
        assert_eq!(states.value_for("pending"), Some(1));
        assert_eq!(states.get(&2), None);
        assert_eq!(states.group("UNPUBLISHED").unwrap().len(), 2);
    }

    #[test]
    fn test_from_json_duplicate_value() {
        let result: Result<LabeledEnum<i32>, _> = LabeledEnum::from_json(
            r#"{"members": [{"name": "A", "value": 1}, {"name": "B", "value": 1}]}"#,
        );
        assert!(matches!(
            result,
            Err(CoastError::Enum(EnumError::DuplicateValue { .. }))
        ));
    }

    #[test]
    fn test_from_yaml_malformed() {
        let result: Result<LabeledEnum<i32>, _> = LabeledEnum::from_yaml("members: 12");
        assert!(matches!(result, Err(CoastError::Parse(_))));
    }
}
