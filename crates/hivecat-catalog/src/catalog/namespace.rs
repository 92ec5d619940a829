//! Namespace operations.

use std::collections::BTreeMap;

use hivecat_core::location::directory_prefix;
use hivecat_metastore::{Database, HivePrincipal};
use tracing::{info, instrument, warn};

use super::{HiveCatalog, LOCATION_PROPERTY, split_namespace_properties};
use crate::error::{CatalogError, CatalogResult, namespace_error};
use crate::identifier::is_system_namespace;
use crate::metrics;
use crate::session::Session;

impl HiveCatalog {
    /// Lists namespaces, excluding system namespaces.
    ///
    /// # Errors
    ///
    /// Propagates metastore failures.
    pub async fn list_namespaces(&self) -> CatalogResult<Vec<String>> {
        let databases = self
            .metastore
            .get_all_databases()
            .await
            .map_err(namespace_error)?;
        Ok(databases
            .into_iter()
            .filter(|name| !is_system_namespace(name))
            .collect())
    }

    /// Returns the properties of a namespace: its location, if any, plus the
    /// parameters it was created with.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NamespaceNotFound`] if the namespace is absent.
    pub async fn load_namespace_metadata(
        &self,
        namespace: &str,
    ) -> CatalogResult<BTreeMap<String, String>> {
        let database = self.require_database(namespace).await?;
        let mut properties = database.parameters;
        if let Some(location) = database.location {
            properties.insert(LOCATION_PROPERTY.to_string(), location);
        }
        Ok(properties)
    }

    /// Returns the owner of a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NamespaceNotFound`] if the namespace is absent.
    pub async fn get_namespace_principal(
        &self,
        namespace: &str,
    ) -> CatalogResult<Option<HivePrincipal>> {
        Ok(self.require_database(namespace).await?.owner())
    }

    /// Creates a namespace.
    ///
    /// The `location` property, when present, must resolve to a storage
    /// location; all other properties are stored as parameters. The owner is
    /// recorded only under per-object security.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidProperty`] for an unresolvable location.
    /// - [`CatalogError::NamespaceAlreadyExists`] if the name is taken.
    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn create_namespace(
        &self,
        session: &Session,
        namespace: &str,
        properties: &BTreeMap<String, String>,
        owner: &HivePrincipal,
    ) -> CatalogResult<()> {
        let (location, parameters) = split_namespace_properties(properties);
        let location = match location {
            Some(raw) => {
                let resolved = self.storage.resolve_location(&raw).await.map_err(|err| {
                    CatalogError::InvalidProperty {
                        message: format!("Invalid location URI: {raw}: {err}"),
                    }
                })?;
                Some(resolved.to_string())
            }
            None => None,
        };

        let mut database = Database::new(namespace)
            .with_location(location)
            .with_owner(self.namespace_owner(owner));
        database.parameters = parameters;

        self.metastore
            .create_database(database)
            .await
            .map_err(namespace_error)?;
        info!(user = session.user(), "Created namespace");
        Ok(())
    }

    /// Drops an empty namespace.
    ///
    /// The namespace directory is deleted with it only when listing shows the
    /// directory is empty. When the directory cannot be listed, the configured
    /// fallback decides.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NamespaceNotEmpty`] if tables or views remain.
    /// - [`CatalogError::NamespaceNotFound`] if the namespace is absent.
    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn drop_namespace(&self, namespace: &str) -> CatalogResult<()> {
        if !self.list_tables(Some(namespace)).await?.is_empty() {
            return Err(CatalogError::NamespaceNotEmpty {
                namespace: namespace.to_string(),
            });
        }

        let database = self.require_database(namespace).await?;
        let fallback = self.config.delete_schema_locations_fallback;
        let delete_data = match database.location.as_deref() {
            Some(location) => match self.storage.list(&directory_prefix(location)).await {
                Ok(objects) => objects.is_empty(),
                Err(err) => {
                    metrics::record_namespace_location_check_failure();
                    warn!(
                        location,
                        error = %err,
                        fallback,
                        "Could not check namespace directory"
                    );
                    fallback
                }
            },
            None => fallback,
        };

        self.metastore
            .drop_database(namespace, delete_data)
            .await
            .map_err(namespace_error)?;
        info!(delete_data, "Dropped namespace");
        Ok(())
    }

    /// Renames a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NamespaceNotFound`] or
    /// [`CatalogError::NamespaceAlreadyExists`].
    #[instrument(skip_all, fields(namespace = %source, target = %target))]
    pub async fn rename_namespace(&self, source: &str, target: &str) -> CatalogResult<()> {
        self.metastore
            .rename_database(source, target)
            .await
            .map_err(namespace_error)
    }

    /// Changes the owner of a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NamespaceNotFound`] if the namespace is absent.
    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn set_namespace_principal(
        &self,
        namespace: &str,
        principal: HivePrincipal,
    ) -> CatalogResult<()> {
        self.metastore
            .set_database_owner(namespace, principal)
            .await
            .map_err(namespace_error)
    }

    pub(super) async fn require_database(&self, namespace: &str) -> CatalogResult<Database> {
        self.metastore
            .get_database(namespace)
            .await
            .map_err(namespace_error)?
            .ok_or_else(|| CatalogError::NamespaceNotFound {
                namespace: namespace.to_string(),
            })
    }
}
