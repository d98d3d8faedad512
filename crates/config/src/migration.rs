use super::ConfigError;
use std::path::Path;
use std::sync::Arc;
use toml_edit::{Array, DocumentMut, Item, Table, Value};

/// Migrates config file to latest format if needed
pub async fn migrate_config_if_needed<P: AsRef<Path>>(
    path: P,
    events: Option<&Arc<stowage_events::EventBus>>,
) -> Result<(), ConfigError> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    let mut doc = content.parse::<DocumentMut>()?;
    let added_fields = migrate_document(&mut doc)?;

    // Only write if we added fields
    if !added_fields.is_empty() {
        tokio::fs::write(path.as_ref(), doc.to_string()).await?;

        if let Some(event_bus) = events {
            event_bus.emit(stowage_events::AppEvent::ConfigMigrated {
                added_fields: added_fields.clone(),
            });
        }
    }

    Ok(())
}

/// Adds every missing section and field with its default value.
/// Returns the dotted names of what was added; empty when the document is current.
pub fn migrate_document(doc: &mut DocumentMut) -> Result<Vec<String>, ConfigError> {
    let mut added_fields = Vec::new();

    migrate_uploads_section(doc, &mut added_fields)?;
    migrate_storage_section(doc, &mut added_fields)?;

    Ok(added_fields)
}

fn migrate_uploads_section(
    doc: &mut DocumentMut,
    added_fields: &mut Vec<String>,
) -> Result<(), ConfigError> {
    let uploads = ensure_table(doc.as_table_mut(), "uploads", "uploads", added_fields)?;

    ensure_field(uploads, "uploads", "temp_dir", Value::from("./tmp"), added_fields);
    ensure_field(uploads, "uploads", "max_upload_size_mb", Value::from(10), added_fields);

    if !uploads.contains_key("allowed_mime_types") {
        let mut arr = Array::new();
        for mime_type in super::defaults::allowed_mime_types() {
            arr.push(mime_type);
        }
        uploads["allowed_mime_types"] = Item::Value(Value::Array(arr));
        added_fields.push("uploads.allowed_mime_types".to_string());
    }

    Ok(())
}

fn migrate_storage_section(
    doc: &mut DocumentMut,
    added_fields: &mut Vec<String>,
) -> Result<(), ConfigError> {
    let storage = ensure_table(doc.as_table_mut(), "storage", "storage", added_fields)?;

    let local = ensure_table(storage, "local", "storage.local", added_fields)?;
    ensure_field(local, "storage.local", "enabled", Value::from(true), added_fields);
    ensure_field(local, "storage.local", "root", Value::from("./storage"), added_fields);

    let s3 = ensure_table(storage, "s3", "storage.s3", added_fields)?;
    ensure_field(s3, "storage.s3", "enabled", Value::from(false), added_fields);
    ensure_field(s3, "storage.s3", "endpoint_url", Value::from(""), added_fields);
    ensure_field(s3, "storage.s3", "region", Value::from("us-east-1"), added_fields);
    ensure_field(s3, "storage.s3", "access_key_id", Value::from(""), added_fields);
    ensure_field(s3, "storage.s3", "secret_access_key", Value::from(""), added_fields);
    ensure_field(s3, "storage.s3", "bucket", Value::from(""), added_fields);

    let minio = ensure_table(storage, "minio", "storage.minio", added_fields)?;
    ensure_field(minio, "storage.minio", "enabled", Value::from(false), added_fields);
    ensure_field(minio, "storage.minio", "endpoint", Value::from("localhost:9000"), added_fields);
    ensure_field(minio, "storage.minio", "access_key_id", Value::from(""), added_fields);
    ensure_field(minio, "storage.minio", "secret_access_key", Value::from(""), added_fields);
    ensure_field(minio, "storage.minio", "use_ssl", Value::from(false), added_fields);
    ensure_field(minio, "storage.minio", "region", Value::from("us-east-1"), added_fields);
    ensure_field(minio, "storage.minio", "bucket", Value::from(""), added_fields);

    let sftp = ensure_table(storage, "sftp", "storage.sftp", added_fields)?;
    ensure_field(sftp, "storage.sftp", "enabled", Value::from(false), added_fields);
    ensure_field(sftp, "storage.sftp", "host", Value::from(""), added_fields);
    ensure_field(sftp, "storage.sftp", "port", Value::from(22), added_fields);
    ensure_field(sftp, "storage.sftp", "user", Value::from(""), added_fields);
    ensure_field(sftp, "storage.sftp", "password", Value::from(""), added_fields);

    let webdav = ensure_table(storage, "webdav", "storage.webdav", added_fields)?;
    ensure_field(webdav, "storage.webdav", "enabled", Value::from(false), added_fields);
    ensure_field(webdav, "storage.webdav", "host", Value::from(""), added_fields);
    ensure_field(webdav, "storage.webdav", "user", Value::from(""), added_fields);
    ensure_field(webdav, "storage.webdav", "password", Value::from(""), added_fields);

    Ok(())
}

fn ensure_table<'a>(
    parent: &'a mut Table,
    key: &str,
    path: &str,
    added_fields: &mut Vec<String>,
) -> Result<&'a mut Table, ConfigError> {
    if !parent.contains_key(key) {
        let mut table = Table::new();
        table.set_implicit(true);
        parent.insert(key, Item::Table(table));
        added_fields.push(path.to_string());
    }

    parent[key]
        .as_table_mut()
        .ok_or_else(|| ConfigError::MigrationError(format!("Invalid [{}] section in config", path)))
}

fn ensure_field(
    table: &mut Table,
    section: &str,
    key: &str,
    default_value: Value,
    added_fields: &mut Vec<String>,
) {
    if !table.contains_key(key) {
        table[key] = Item::Value(default_value);
        added_fields.push(format!("{}.{}", section, key));
    }
}
