//! Table metadata for entity types.
//!
//! The compiler never inspects Rust structs. Every entity type describes its
//! table once through [`Entity::table_info`] and the description is cached
//! for the lifetime of the process by [`TableRegistry`].
//!
//! ```rust
//! use oxide_query::schema::{Entity, TableInfo};
//! use oxide_query::SqlValue;
//!
//! struct User;
//!
//! impl Entity for User {
//!     fn table_info() -> TableInfo {
//!         TableInfo::builder("users")
//!             .key("id", "id")
//!             .column("name", "user_name")
//!             .read_only("created", "created_at")
//!             .token("version", "row_version", || SqlValue::Int(1))
//!             .build()
//!     }
//! }
//!
//! let info = User::table_info();
//! assert_eq!(info.column("name"), Some("user_name"));
//! assert!(info.writable_column("created").is_none());
//! ```

use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use oxide_canon::{Result, SqlError, SqlValue};
use tracing::debug;

/// Produces the value of an auto-value column.
pub type TokenFactory = Arc<dyn Fn() -> SqlValue + Send + Sync>;

/// Table metadata of one entity type.
///
/// Field names are the names used in query expressions; column names are the
/// names used in SQL. Both maps keep declaration order.
#[derive(Clone)]
pub struct TableInfo {
    name: String,
    keys: Vec<String>,
    read_onlys: Vec<String>,
    tokens: Vec<(String, TokenFactory)>,
    read_writes: Vec<(String, String)>,
    read_or_writes: Vec<(String, String)>,
}

impl TableInfo {
    /// Starts describing the table `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TableInfoBuilder {
        TableInfoBuilder {
            info: Self {
                name: name.into(),
                keys: Vec::new(),
                read_onlys: Vec::new(),
                tokens: Vec::new(),
                read_writes: Vec::new(),
                read_or_writes: Vec::new(),
            },
        }
    }

    /// Returns the table name, possibly schema-qualified.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the key fields.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns the fields that can be read but never written.
    #[must_use]
    pub fn read_onlys(&self) -> &[String] {
        &self.read_onlys
    }

    /// Iterates over the auto-value fields.
    pub fn tokens(&self) -> impl Iterator<Item = (&str, &TokenFactory)> {
        self.tokens.iter().map(|(f, t)| (f.as_str(), t))
    }

    /// Iterates over `(field, column)` pairs of writable fields.
    pub fn read_writes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.read_writes.iter().map(|(f, c)| (f.as_str(), c.as_str()))
    }

    /// Iterates over `(field, column)` pairs of every readable field.
    pub fn read_or_writes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.read_or_writes
            .iter()
            .map(|(f, c)| (f.as_str(), c.as_str()))
    }

    /// Returns the column of a readable field.
    #[must_use]
    pub fn column(&self, field: &str) -> Option<&str> {
        lookup(&self.read_or_writes, field)
    }

    /// Returns the column of a writable field.
    #[must_use]
    pub fn writable_column(&self, field: &str) -> Option<&str> {
        lookup(&self.read_writes, field)
    }

    /// Returns the value factory of an auto-value field.
    #[must_use]
    pub fn token(&self, field: &str) -> Option<&TokenFactory> {
        self.tokens.iter().find(|(f, _)| f == field).map(|(_, t)| t)
    }

    /// Returns the number of readable fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.read_or_writes.len()
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], field: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(f, _)| f == field)
        .map(|(_, c)| c.as_str())
}

impl fmt::Debug for TableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableInfo")
            .field("name", &self.name)
            .field("keys", &self.keys)
            .field("read_onlys", &self.read_onlys)
            .field(
                "tokens",
                &self.tokens.iter().map(|(f, _)| f).collect::<Vec<_>>(),
            )
            .field("read_writes", &self.read_writes)
            .field("read_or_writes", &self.read_or_writes)
            .finish()
    }
}

/// Builder for [`TableInfo`].
#[derive(Debug)]
pub struct TableInfoBuilder {
    info: TableInfo,
}

impl TableInfoBuilder {
    /// Declares a readable and writable field.
    #[must_use]
    pub fn column(mut self, field: &str, column: &str) -> Self {
        self.push_readable(field, column);
        self.info
            .read_writes
            .push((field.to_string(), column.to_string()));
        self
    }

    /// Declares a readable and writable field whose column has the same name.
    #[must_use]
    pub fn field(self, field: &str) -> Self {
        self.column(field, field)
    }

    /// Declares a writable key field.
    #[must_use]
    pub fn key(mut self, field: &str, column: &str) -> Self {
        self.info.keys.push(field.to_string());
        self.column(field, column)
    }

    /// Declares a key generated by the database, such as an identity column.
    #[must_use]
    pub fn generated_key(mut self, field: &str, column: &str) -> Self {
        self.info.keys.push(field.to_string());
        self.read_only(field, column)
    }

    /// Declares a field that can be read but never written.
    #[must_use]
    pub fn read_only(mut self, field: &str, column: &str) -> Self {
        self.push_readable(field, column);
        self.info.read_onlys.push(field.to_string());
        self
    }

    /// Declares an auto-value field. Inserts and updates that do not assign
    /// it get a fresh value from `factory`.
    #[must_use]
    pub fn token<F>(mut self, field: &str, column: &str, factory: F) -> Self
    where
        F: Fn() -> SqlValue + Send + Sync + 'static,
    {
        self.info
            .tokens
            .push((field.to_string(), Arc::new(factory)));
        self.column(field, column)
    }

    fn push_readable(&mut self, field: &str, column: &str) {
        self.info
            .read_or_writes
            .push((field.to_string(), column.to_string()));
    }

    /// Finishes the description.
    #[must_use]
    pub fn build(self) -> TableInfo {
        self.info
    }
}

/// A type mapped to a table.
pub trait Entity: 'static {
    /// Describes the table. Called once per process by [`TableRegistry`].
    fn table_info() -> TableInfo;
}

/// A type-erased handle on an [`Entity`] type.
#[derive(Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
    describe: fn() -> TableInfo,
}

impl EntityType {
    /// Returns the handle of `T`.
    #[must_use]
    pub fn of<T: Entity>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            describe: T::table_info,
        }
    }

    /// Returns the Rust type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type identifier.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Builds the table description without caching it.
    #[must_use]
    pub fn describe(&self) -> TableInfo {
        (self.describe)()
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityType").field(&self.name).finish()
    }
}

/// Resolves entity types to table metadata.
pub trait TableResolver: Send + Sync {
    /// Returns the metadata of `entity`.
    fn resolve(&self, entity: &EntityType) -> Result<Arc<TableInfo>>;
}

/// Process-wide metadata cache.
///
/// Each entity type is described at most once per registry; entries are
/// never replaced after they are populated.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: DashMap<TypeId, Arc<TableInfo>>,
}

static GLOBAL: LazyLock<TableRegistry> = LazyLock::new(TableRegistry::new);

impl TableRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
        }
    }

    /// Returns the process-wide registry.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Returns the number of cached entity types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableResolver for TableRegistry {
    fn resolve(&self, entity: &EntityType) -> Result<Arc<TableInfo>> {
        if let Some(info) = self.tables.get(&entity.id()) {
            return Ok(Arc::clone(info.value()));
        }
        let info = entity.describe();
        if info.name().trim().is_empty() {
            return Err(SqlError::type_access(format!(
                "`{}` does not name a table",
                entity.name()
            )));
        }
        if info.field_count() == 0 {
            return Err(SqlError::type_access(format!(
                "`{}` declares no readable fields",
                entity.name()
            )));
        }
        let entry = self
            .tables
            .entry(entity.id())
            .or_insert_with(|| {
                debug!(entity = entity.name(), table = info.name(), "registered table");
                Arc::new(info)
            });
        Ok(Arc::clone(entry.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order;

    impl Entity for Order {
        fn table_info() -> TableInfo {
            TableInfo::builder("sales.orders")
                .generated_key("id", "order_id")
                .field("total")
                .token("stamp", "row_stamp", || SqlValue::Int(7))
                .build()
        }
    }

    struct Nameless;

    impl Entity for Nameless {
        fn table_info() -> TableInfo {
            TableInfo::builder("").field("a").build()
        }
    }

    #[test]
    fn test_field_maps_keep_order() {
        let info = Order::table_info();
        assert_eq!(
            info.read_or_writes().collect::<Vec<_>>(),
            vec![("id", "order_id"), ("total", "total"), ("stamp", "row_stamp")]
        );
        assert_eq!(
            info.read_writes().map(|(f, _)| f).collect::<Vec<_>>(),
            vec!["total", "stamp"]
        );
        assert_eq!(info.keys(), ["id"]);
        assert_eq!(info.read_onlys(), ["id"]);
    }

    #[test]
    fn test_token_factory() {
        let info = Order::table_info();
        let factory = info.token("stamp").unwrap();
        assert_eq!(factory(), SqlValue::Int(7));
        assert!(info.token("total").is_none());
    }

    #[test]
    fn test_registry_caches_per_type() {
        let registry = TableRegistry::new();
        let a = registry.resolve(&EntityType::of::<Order>()).unwrap();
        let b = registry.resolve(&EntityType::of::<Order>()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn error_entity_without_table() {
        let err = TableRegistry::new()
            .resolve(&EntityType::of::<Nameless>())
            .unwrap_err();
        assert!(matches!(err, SqlError::TypeAccess(_)));
    }

    #[test]
    fn test_entity_type_identity() {
        assert_eq!(EntityType::of::<Order>(), EntityType::of::<Order>());
        assert_ne!(EntityType::of::<Order>(), EntityType::of::<Nameless>());
    }
}
