//! In-memory catalog: catalogs, databases, named objects and modules.
//!
//! Objects are keyed by their fully qualified `catalog.database.name`.
//! Partially qualified names resolve against the current catalog and
//! database.

use std::collections::{BTreeMap, BTreeSet};

use sqlcli_core::ObjectKind;

use crate::{GatewayError, GatewayResult};

pub const DEFAULT_CATALOG: &str = "default_catalog";
pub const DEFAULT_DATABASE: &str = "default_database";
pub const CORE_MODULE: &str = "core";

/// A registered table, view or function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogObject {
    pub kind: ObjectKind,
    /// The statement that created the object.
    pub ddl: String,
}

#[derive(Debug, Clone)]
struct Module {
    name: String,
    used: bool,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    current_catalog: String,
    current_database: String,
    catalogs: BTreeSet<String>,
    /// `catalog.database`
    databases: BTreeSet<String>,
    objects: BTreeMap<String, CatalogObject>,
    /// Load order; resolution order of used modules.
    modules: Vec<Module>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

fn object_label(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Table => "table",
        ObjectKind::View => "view",
        ObjectKind::Function => "function",
        ObjectKind::Database => "database",
        ObjectKind::Catalog => "catalog",
    }
}

/// Strip identifier quotes from each part of a dotted name.
fn name_parts(name: &str) -> Vec<String> {
    name.split('.')
        .map(|part| part.trim().trim_matches('`').trim_matches('"').to_string())
        .collect()
}

impl Catalog {
    pub fn new() -> Self {
        let mut catalogs = BTreeSet::new();
        catalogs.insert(DEFAULT_CATALOG.to_string());
        let mut databases = BTreeSet::new();
        databases.insert(format!("{}.{}", DEFAULT_CATALOG, DEFAULT_DATABASE));
        Self {
            current_catalog: DEFAULT_CATALOG.to_string(),
            current_database: DEFAULT_DATABASE.to_string(),
            catalogs,
            databases,
            objects: BTreeMap::new(),
            modules: vec![Module {
                name: CORE_MODULE.to_string(),
                used: true,
            }],
        }
    }

    pub fn current_catalog(&self) -> &str {
        &self.current_catalog
    }

    pub fn current_database(&self) -> &str {
        &self.current_database
    }

    // ==================== NAME RESOLUTION ====================

    /// Resolve an object name to `catalog.database.name`.
    pub fn qualify(&self, name: &str) -> String {
        let parts = name_parts(name);
        match parts.as_slice() {
            [object] => format!(
                "{}.{}.{}",
                self.current_catalog, self.current_database, object
            ),
            [database, object] => format!("{}.{}.{}", self.current_catalog, database, object),
            _ => parts.join("."),
        }
    }

    /// Resolve a database name to `catalog.database`.
    pub fn qualify_database(&self, name: &str) -> String {
        let parts = name_parts(name);
        match parts.as_slice() {
            [database] => format!("{}.{}", self.current_catalog, database),
            _ => parts.join("."),
        }
    }

    // ==================== OBJECTS ====================

    pub fn get(&self, name: &str) -> Option<&CatalogObject> {
        self.objects.get(&self.qualify(name))
    }

    /// Register a table, view or function. Returns `false` when an object of
    /// that name already existed and `if_not_exists` allowed skipping it.
    pub fn create_object(
        &mut self,
        kind: ObjectKind,
        name: &str,
        ddl: &str,
        if_not_exists: bool,
    ) -> GatewayResult<bool> {
        let qualified = self.qualify(name);
        let database = qualified
            .rsplit_once('.')
            .map(|(db, _)| db.to_string())
            .unwrap_or_default();
        if !self.databases.contains(&database) {
            return Err(GatewayError::object_not_found("database", database));
        }
        if self.objects.contains_key(&qualified) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(GatewayError::object_exists(object_label(kind), qualified));
        }
        self.objects.insert(
            qualified,
            CatalogObject {
                kind,
                ddl: ddl.to_string(),
            },
        );
        Ok(true)
    }

    pub fn drop_object(&mut self, kind: ObjectKind, name: &str, if_exists: bool) -> GatewayResult<()> {
        let qualified = self.qualify(name);
        match self.objects.get(&qualified) {
            Some(object) if object.kind == kind => {
                self.objects.remove(&qualified);
                Ok(())
            }
            _ if if_exists => Ok(()),
            _ => Err(GatewayError::object_not_found(object_label(kind), qualified)),
        }
    }

    /// Check that an object of `kind` exists.
    pub fn require_object(&self, kind: ObjectKind, name: &str) -> GatewayResult<&CatalogObject> {
        let qualified = self.qualify(name);
        match self.objects.get(&qualified) {
            Some(object) if object.kind == kind => Ok(object),
            _ => Err(GatewayError::object_not_found(object_label(kind), qualified)),
        }
    }

    /// Unqualified names of the objects of `kind` in the current database.
    pub fn list_objects(&self, kind: ObjectKind) -> Vec<String> {
        let prefix = format!("{}.{}.", self.current_catalog, self.current_database);
        self.objects
            .iter()
            .filter(|(_, object)| object.kind == kind)
            .filter_map(|(name, _)| name.strip_prefix(&prefix))
            .map(str::to_string)
            .collect()
    }

    // ==================== CATALOGS & DATABASES ====================

    pub fn create_catalog(&mut self, name: &str, if_not_exists: bool) -> GatewayResult<()> {
        let name = name_parts(name).join(".");
        if self.catalogs.contains(&name) {
            if if_not_exists {
                return Ok(());
            }
            return Err(GatewayError::object_exists("catalog", name));
        }
        self.databases.insert(format!("{}.{}", name, DEFAULT_DATABASE));
        self.catalogs.insert(name);
        Ok(())
    }

    pub fn drop_catalog(&mut self, name: &str, if_exists: bool) -> GatewayResult<()> {
        let name = name_parts(name).join(".");
        if name == self.current_catalog {
            return Err(GatewayError::sql_execution(format!(
                "cannot drop catalog '{}' as it is currently in use",
                name
            )));
        }
        if !self.catalogs.remove(&name) {
            if if_exists {
                return Ok(());
            }
            return Err(GatewayError::object_not_found("catalog", name));
        }
        let prefix = format!("{}.", name);
        self.databases.retain(|db| !db.starts_with(&prefix));
        self.objects.retain(|object, _| !object.starts_with(&prefix));
        Ok(())
    }

    pub fn create_database(&mut self, name: &str, if_not_exists: bool) -> GatewayResult<()> {
        let qualified = self.qualify_database(name);
        let catalog = qualified.split('.').next().unwrap_or_default().to_string();
        if !self.catalogs.contains(&catalog) {
            return Err(GatewayError::object_not_found("catalog", catalog));
        }
        if !self.databases.insert(qualified.clone()) && !if_not_exists {
            return Err(GatewayError::object_exists("database", qualified));
        }
        Ok(())
    }

    pub fn drop_database(&mut self, name: &str, if_exists: bool) -> GatewayResult<()> {
        let qualified = self.qualify_database(name);
        if qualified == format!("{}.{}", self.current_catalog, self.current_database) {
            return Err(GatewayError::sql_execution(format!(
                "cannot drop database '{}' as it is currently in use",
                qualified
            )));
        }
        if !self.databases.remove(&qualified) {
            if if_exists {
                return Ok(());
            }
            return Err(GatewayError::object_not_found("database", qualified));
        }
        let prefix = format!("{}.", qualified);
        self.objects.retain(|object, _| !object.starts_with(&prefix));
        Ok(())
    }

    pub fn use_catalog(&mut self, name: &str) -> GatewayResult<()> {
        let name = name_parts(name).join(".");
        if !self.catalogs.contains(&name) {
            return Err(GatewayError::object_not_found("catalog", name));
        }
        self.current_database = DEFAULT_DATABASE.to_string();
        self.current_catalog = name;
        Ok(())
    }

    pub fn use_database(&mut self, name: &str) -> GatewayResult<()> {
        let qualified = self.qualify_database(name);
        if !self.databases.contains(&qualified) {
            return Err(GatewayError::object_not_found("database", qualified));
        }
        if let Some((catalog, database)) = qualified.split_once('.') {
            self.current_catalog = catalog.to_string();
            self.current_database = database.to_string();
        }
        Ok(())
    }

    pub fn has_catalog(&self, name: &str) -> bool {
        self.catalogs.contains(&name_parts(name).join("."))
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.databases.contains(&self.qualify_database(name))
    }

    pub fn list_catalogs(&self) -> Vec<String> {
        self.catalogs.iter().cloned().collect()
    }

    /// Databases of the current catalog.
    pub fn list_databases(&self) -> Vec<String> {
        let prefix = format!("{}.", self.current_catalog);
        self.databases
            .iter()
            .filter_map(|db| db.strip_prefix(&prefix))
            .map(str::to_string)
            .collect()
    }

    // ==================== MODULES ====================

    pub fn load_module(&mut self, name: &str) -> GatewayResult<()> {
        if self.modules.iter().any(|m| m.name == name) {
            return Err(GatewayError::object_exists("module", name));
        }
        self.modules.push(Module {
            name: name.to_string(),
            used: true,
        });
        Ok(())
    }

    pub fn unload_module(&mut self, name: &str) -> GatewayResult<()> {
        let before = self.modules.len();
        self.modules.retain(|m| m.name != name);
        if self.modules.len() == before {
            return Err(GatewayError::object_not_found("module", name));
        }
        Ok(())
    }

    /// Enable exactly `names`, in that order; every other module stays
    /// loaded but unused.
    pub fn use_modules(&mut self, names: &[String]) -> GatewayResult<()> {
        let mut seen = BTreeSet::new();
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(GatewayError::sql_execution(format!(
                    "module '{}' appears more than once",
                    name
                )));
            }
            if !self.modules.iter().any(|m| &m.name == name) {
                return Err(GatewayError::object_not_found("module", name.as_str()));
            }
        }
        let mut reordered = Vec::with_capacity(self.modules.len());
        for name in names {
            if let Some(pos) = self.modules.iter().position(|m| &m.name == name) {
                let mut module = self.modules.remove(pos);
                module.used = true;
                reordered.push(module);
            }
        }
        for mut module in self.modules.drain(..) {
            module.used = false;
            reordered.push(module);
        }
        self.modules = reordered;
        Ok(())
    }

    /// `(name, used)` in resolution order.
    pub fn list_modules(&self) -> Vec<(String, bool)> {
        self.modules
            .iter()
            .map(|m| (m.name.clone(), m.used))
            .collect()
    }
}
