//! Which item properties are expression-capable, and in which pass.
//!
//! Two tables are merged when resolving a node: the default per-component
//! rules, and the per-repeating-group rules. Row-scoped rules are skipped in
//! the whole-tree pass and evaluated once per row with that row's first child
//! as evaluation context, because per-row flags must see the row's specific
//! data, not the group's generic context.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKey {
    Hidden,
    Required,
    ReadOnly,
    TextResourceBindings,
    HiddenRow,
    AlertOnDelete,
    EditButton,
    DeleteButton,
    SaveButton,
    SaveAndNextButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyRule {
    pub key: PropertyKey,
    /// Evaluated once per repeating row (pass 2) instead of once per node.
    pub per_row: bool,
}

const fn rule(key: PropertyKey, per_row: bool) -> PropertyRule {
    PropertyRule { key, per_row }
}

/// Default rules, applying to every component.
pub const COMPONENT_RULES: &[PropertyRule] = &[
    rule(PropertyKey::Hidden, false),
    rule(PropertyKey::Required, false),
    rule(PropertyKey::ReadOnly, false),
    rule(PropertyKey::TextResourceBindings, false),
];

/// Additional rules for repeating-group containers.
pub const REPEATING_GROUP_RULES: &[PropertyRule] = &[
    rule(PropertyKey::HiddenRow, true),
    rule(PropertyKey::AlertOnDelete, true),
    rule(PropertyKey::EditButton, true),
    rule(PropertyKey::DeleteButton, true),
    rule(PropertyKey::SaveButton, true),
    rule(PropertyKey::SaveAndNextButton, true),
    rule(PropertyKey::TextResourceBindings, true),
];

/// The merged rule set for one node.
pub fn rules_for(is_repeating_group: bool) -> impl Iterator<Item = PropertyRule> {
    COMPONENT_RULES.iter().copied().chain(
        is_repeating_group
            .then_some(REPEATING_GROUP_RULES)
            .unwrap_or_default()
            .iter()
            .copied(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_rules_have_no_row_scope() {
        assert!(rules_for(false).all(|r| !r.per_row));
    }

    #[test]
    fn group_rules_extend_component_rules() {
        let merged: Vec<_> = rules_for(true).collect();
        assert!(merged.iter().any(|r| r.key == PropertyKey::Hidden && !r.per_row));
        assert!(merged.iter().any(|r| r.key == PropertyKey::HiddenRow && r.per_row));
        assert!(
            merged
                .iter()
                .any(|r| r.key == PropertyKey::TextResourceBindings && r.per_row)
        );
    }
}
