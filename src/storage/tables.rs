use redb::TableDefinition;

/// Link mappings: token -> public object URL
pub const LINKS: TableDefinition<&str, &str> = TableDefinition::new("links");
