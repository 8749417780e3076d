/// Options that control how inspection behaves.
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Schemas to inspect; `None` means every non-system schema.
    pub schemas: Option<Vec<String>>,
    /// Restrict base tables to these names.
    pub tables: Option<Vec<String>>,
    pub include_system_schemas: bool,
    /// Inspect enum types and link the columns using them.
    pub include_types: bool,
    pub include_comments: bool,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            schemas: None,
            tables: None,
            include_system_schemas: false,
            include_types: true,
            include_comments: true,
        }
    }
}
