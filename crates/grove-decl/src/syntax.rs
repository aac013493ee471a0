//! Instance Syntax
//!
//! Name folding rules from the SGML declaration. The reference concrete
//! syntax folds general names (element types, attribute names, IDs,
//! notations) to upper case and leaves entity names alone.

use std::collections::HashMap;

/// Character substitution table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionTable {
    map: HashMap<char, char>,
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// ASCII lower case to upper case
    pub fn upper_case() -> Self {
        let mut table = Self::new();
        for c in 'a'..='z' {
            table.add(c, c.to_ascii_uppercase());
        }
        table
    }

    /// Map `from` to `to`
    pub fn add(&mut self, from: char, to: char) {
        if from == to {
            self.map.remove(&from);
        } else {
            self.map.insert(from, to);
        }
    }

    #[inline]
    pub fn subst(&self, c: char) -> char {
        self.map.get(&c).copied().unwrap_or(c)
    }

    /// Apply the table to every character of `name`
    pub fn normalize(&self, name: &str) -> String {
        name.chars().map(|c| self.subst(c)).collect()
    }

    pub fn is_identity(&self) -> bool {
        self.map.is_empty()
    }
}

/// Substitution tables of the instance syntax
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Syntax {
    general: Option<SubstitutionTable>,
    entity: Option<SubstitutionTable>,
}

impl Syntax {
    /// No folding at all
    pub fn new() -> Self {
        Self::default()
    }

    /// NAMECASE GENERAL YES ENTITY NO
    pub fn reference() -> Self {
        Self {
            general: Some(SubstitutionTable::upper_case()),
            entity: None,
        }
    }

    pub fn with_general(mut self, table: SubstitutionTable) -> Self {
        self.general = Some(table);
        self
    }

    pub fn with_entity(mut self, table: SubstitutionTable) -> Self {
        self.entity = Some(table);
        self
    }

    pub fn general_substitution(&self) -> Option<&SubstitutionTable> {
        self.general.as_ref()
    }

    pub fn entity_substitution(&self) -> Option<&SubstitutionTable> {
        self.entity.as_ref()
    }

    /// Fold a general name (element type, attribute, ID, notation)
    pub fn normalize_general(&self, name: &str) -> String {
        match &self.general {
            Some(table) => table.normalize(name),
            None => name.to_owned(),
        }
    }

    /// Fold an entity name
    pub fn normalize_entity(&self, name: &str) -> String {
        match &self.entity {
            Some(table) => table.normalize(name),
            None => name.to_owned(),
        }
    }
}
