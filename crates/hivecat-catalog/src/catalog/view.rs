//! View operations.

use hivecat_metastore::HivePrincipal;
use tracing::{info, instrument};

use super::HiveCatalog;
use crate::error::{CatalogResult, ObjectKind};
use crate::identifier::{SchemaTableName, is_system_namespace};
use crate::kind::RecordKind;
use crate::session::Session;
use crate::view::{VIEW_COMMENT, VIEW_EXPANDED_TEXT_MARKER, ViewDefinition, decode_view, encode_view};

impl HiveCatalog {
    /// Creates or replaces a view.
    ///
    /// Under system security the definition is stored without an owner.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ViewAlreadyExists`](crate::CatalogError::ViewAlreadyExists)
    /// when a record exists and either `replace` is false or that record is
    /// not a view written by this catalog.
    #[instrument(skip_all, fields(namespace = %name.schema, view = %name.table, replace))]
    pub async fn create_view(
        &self,
        session: &Session,
        name: &SchemaTableName,
        definition: &ViewDefinition,
        replace: bool,
    ) -> CatalogResult<()> {
        let definition = if self.config.uses_system_security() {
            definition.without_owner()
        } else {
            definition.clone()
        };
        let record = self.view_record(
            session,
            name,
            VIEW_COMMENT,
            encode_view(&definition)?,
            VIEW_EXPANDED_TEXT_MARKER,
        );
        let privileges = self.privileges(session);

        if let Some((_, kind)) = self.get_record(name).await? {
            if !replace || kind != RecordKind::View {
                return Err(ObjectKind::View.already_exists(name.clone()));
            }
            self.metastore
                .replace_table(&name.schema, &name.table, record, privileges)
                .await
                .map_err(|err| ObjectKind::View.metastore_error(err))?;
            info!("Replaced view");
            return Ok(());
        }

        self.metastore
            .create_table(record, privileges)
            .await
            .map_err(|err| ObjectKind::View.metastore_error(err))?;
        info!("Created view");
        Ok(())
    }

    /// Drops a view.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ViewNotFound`](crate::CatalogError::ViewNotFound)
    /// if no view of this catalog has that name.
    #[instrument(skip_all, fields(namespace = %name.schema, view = %name.table))]
    pub async fn drop_view(&self, name: &SchemaTableName) -> CatalogResult<()> {
        if self.get_view(name).await?.is_none() {
            return Err(ObjectKind::View.not_found(name.clone()));
        }
        self.metastore
            .drop_table(&name.schema, &name.table, true)
            .await
            .map_err(|err| ObjectKind::View.metastore_error(err))
    }

    /// Renames a view.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ViewNotFound`](crate::CatalogError::ViewNotFound)
    /// or [`CatalogError::ViewAlreadyExists`](crate::CatalogError::ViewAlreadyExists).
    #[instrument(skip_all, fields(view = %source, target = %target))]
    pub async fn rename_view(
        &self,
        source: &SchemaTableName,
        target: &SchemaTableName,
    ) -> CatalogResult<()> {
        self.metastore
            .rename_table(&source.schema, &source.table, &target.schema, &target.table)
            .await
            .map_err(|err| ObjectKind::View.metastore_error(err))
    }

    /// Changing view ownership is not supported, as for tables.
    ///
    /// # Errors
    ///
    /// Always returns [`CatalogError::Unsupported`](crate::CatalogError::Unsupported).
    pub fn set_view_principal(
        &self,
        name: &SchemaTableName,
        principal: HivePrincipal,
    ) -> CatalogResult<()> {
        self.set_table_principal(name, principal)
    }

    /// Lists views (not materialized views) in one or all namespaces.
    ///
    /// # Errors
    ///
    /// Propagates metastore failures.
    pub async fn list_views(&self, namespace: Option<&str>) -> CatalogResult<Vec<SchemaTableName>> {
        self.list_by_comment(namespace, VIEW_COMMENT).await
    }

    /// Returns a view definition, or `None` when no view of this catalog has
    /// that name. System namespaces never contain views.
    ///
    /// The record owner replaces the stored owner unless the view runs as
    /// invoker.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidMetadata`](crate::CatalogError::InvalidMetadata)
    /// for an undecodable definition.
    pub async fn get_view(&self, name: &SchemaTableName) -> CatalogResult<Option<ViewDefinition>> {
        if is_system_namespace(&name.schema) {
            return Ok(None);
        }
        let Some((record, RecordKind::View)) = self.get_record(name).await? else {
            return Ok(None);
        };
        let text = record.view_original_text.as_deref().unwrap_or_default();
        let mut definition = decode_view(text)?;
        if record.owner.is_some() && !definition.run_as_invoker {
            definition.owner.clone_from(&record.owner);
        }
        Ok(Some(definition))
    }
}
