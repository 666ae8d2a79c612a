//! Source slots, their aliases and lambda scopes.

use std::collections::HashSet;
use std::sync::Arc;

use crate::schema::TableInfo;

/// Index of a row source inside one compilation.
pub(crate) type SlotId = usize;

/// Column name of a derived table that projects a single value.
pub(crate) const VALUE_COLUMN: &str = "value";

#[derive(Debug)]
enum SlotKind {
    Table(Arc<TableInfo>),
    Derived { columns: Vec<String>, scalar: bool },
}

#[derive(Debug)]
struct Slot {
    kind: SlotKind,
    alias: Option<String>,
    bare: bool,
}

/// Per-compilation alias table.
///
/// Every table or derived table that appears in a statement gets a slot.
/// The alias of a slot is taken from the first lambda parameter bound to it
/// and made unique across the whole compilation, subqueries included.
#[derive(Debug, Default)]
pub(crate) struct AliasCache {
    slots: Vec<Slot>,
    used: HashSet<String>,
}

impl AliasCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a table. A bare table is written without an alias and
    /// qualified by the last segment of its name.
    pub(crate) fn add_table(&mut self, info: Arc<TableInfo>, bare: bool) -> SlotId {
        let alias = bare.then(|| {
            let short = info.name().rsplit('.').next().unwrap_or_default().to_string();
            self.used.insert(short.clone());
            short
        });
        self.slots.push(Slot {
            kind: SlotKind::Table(info),
            alias,
            bare,
        });
        self.slots.len() - 1
    }

    pub(crate) fn add_derived(&mut self, columns: Vec<String>, scalar: bool) -> SlotId {
        self.slots.push(Slot {
            kind: SlotKind::Derived { columns, scalar },
            alias: None,
            bare: false,
        });
        self.slots.len() - 1
    }

    /// Seeds the alias of `slot` from a lambda parameter name.
    pub(crate) fn bind(&mut self, slot: SlotId, param: &str) {
        if self.slots[slot].alias.is_none() {
            let alias = self.unique(param);
            self.slots[slot].alias = Some(alias);
        }
    }

    /// Returns the alias of `slot`, assigning a default one if no lambda
    /// ever named it.
    pub(crate) fn alias(&mut self, slot: SlotId) -> String {
        if let Some(alias) = &self.slots[slot].alias {
            return alias.clone();
        }
        let seed = match &self.slots[slot].kind {
            SlotKind::Table(info) => info
                .name()
                .rsplit('.')
                .next()
                .and_then(|n| n.chars().find(char::is_ascii_alphabetic))
                .map_or_else(|| "t".to_string(), |c| c.to_ascii_lowercase().to_string()),
            SlotKind::Derived { .. } => "t".to_string(),
        };
        let alias = self.unique(&seed);
        self.slots[slot].alias = Some(alias.clone());
        alias
    }

    fn unique(&mut self, seed: &str) -> String {
        let mut candidate = seed.to_string();
        let mut n = 0;
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{seed}{n}");
        }
        self.used.insert(candidate.clone());
        candidate
    }

    pub(crate) fn is_bare(&self, slot: SlotId) -> bool {
        self.slots[slot].bare
    }

    pub(crate) fn table(&self, slot: SlotId) -> Option<&Arc<TableInfo>> {
        match &self.slots[slot].kind {
            SlotKind::Table(info) => Some(info),
            SlotKind::Derived { .. } => None,
        }
    }

    /// Returns the column names of a derived slot.
    pub(crate) fn derived_columns(&self, slot: SlotId) -> Option<&[String]> {
        match &self.slots[slot].kind {
            SlotKind::Derived { columns, .. } => Some(columns),
            SlotKind::Table(_) => None,
        }
    }

    /// Returns whether a derived slot projects a single unnamed value.
    pub(crate) fn is_scalar(&self, slot: SlotId) -> bool {
        matches!(self.slots[slot].kind, SlotKind::Derived { scalar: true, .. })
    }
}

/// The shape of the value a lambda parameter stands for.
#[derive(Debug, Clone)]
pub(crate) enum Row {
    /// A row of a table or derived table.
    Source(SlotId),
    /// Rows of several sources combined by a join result selector.
    Joined(Vec<(String, Row)>),
    /// A projection: member name to compiled SQL.
    Projected(Vec<(String, String)>),
    /// A single compiled value.
    Scalar(String),
    /// A group: its key and the shape of its elements.
    Grouped { key: Box<Row>, element: Box<Row> },
}

/// Lambda parameters visible at one point of the tree, innermost last.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    bindings: Vec<(String, Row)>,
}

impl Scope {
    pub(crate) fn with(&self, param: &str, row: Row) -> Self {
        let mut next = self.clone();
        next.bindings.push((param.to_string(), row));
        next
    }

    pub(crate) fn get(&self, param: &str) -> Option<&Row> {
        self.bindings
            .iter()
            .rev()
            .find(|(name, _)| name == param)
            .map(|(_, row)| row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> Arc<TableInfo> {
        Arc::new(TableInfo::builder(name).field("id").build())
    }

    #[test]
    fn test_alias_from_first_binding() {
        let mut cache = AliasCache::new();
        let slot = cache.add_table(info("users"), false);
        cache.bind(slot, "u");
        cache.bind(slot, "v");
        assert_eq!(cache.alias(slot), "u");
    }

    #[test]
    fn test_aliases_are_unique() {
        let mut cache = AliasCache::new();
        let a = cache.add_table(info("users"), false);
        let b = cache.add_table(info("users"), false);
        cache.bind(a, "x");
        cache.bind(b, "x");
        assert_eq!(cache.alias(a), "x");
        assert_eq!(cache.alias(b), "x1");
    }

    #[test]
    fn test_default_aliases() {
        let mut cache = AliasCache::new();
        let table = cache.add_table(info("sales.orders"), false);
        let derived = cache.add_derived(vec!["id".into()], false);
        assert_eq!(cache.alias(table), "o");
        assert_eq!(cache.alias(derived), "t");
    }

    #[test]
    fn test_bare_table_uses_short_name() {
        let mut cache = AliasCache::new();
        let slot = cache.add_table(info("sales.orders"), true);
        cache.bind(slot, "o");
        assert!(cache.is_bare(slot));
        assert_eq!(cache.alias(slot), "orders");
    }

    #[test]
    fn test_scope_shadows_outer_binding() {
        let scope = Scope::default()
            .with("x", Row::Scalar("a".into()))
            .with("x", Row::Scalar("b".into()));
        assert!(matches!(scope.get("x"), Some(Row::Scalar(s)) if s == "b"));
        assert!(scope.get("y").is_none());
    }
}
