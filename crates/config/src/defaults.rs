/// Default values for configuration fields

pub fn temp_dir() -> String {
    "./tmp".to_string()
}

pub fn max_upload_size_mb() -> u64 {
    10
}

pub fn allowed_mime_types() -> Vec<String> {
    vec![
        "image/gif".to_string(),
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "application/pdf".to_string(),
    ]
}

pub fn upload_settings() -> super::models::UploadSettings {
    super::models::UploadSettings {
        temp_dir: temp_dir(),
        max_upload_size_mb: max_upload_size_mb(),
        allowed_mime_types: allowed_mime_types(),
    }
}

// Storage defaults
pub fn local_enabled() -> bool {
    true
}

pub fn local_root() -> String {
    "./storage".to_string()
}

pub fn local_settings() -> super::models::LocalSettings {
    super::models::LocalSettings {
        enabled: local_enabled(),
        root: local_root(),
    }
}

pub fn s3_region() -> String {
    "us-east-1".to_string()
}

pub fn s3_settings() -> super::models::S3Settings {
    super::models::S3Settings {
        enabled: false,
        endpoint_url: String::new(),
        region: s3_region(),
        access_key_id: String::new(),
        secret_access_key: String::new(),
        bucket: String::new(),
    }
}

pub fn minio_endpoint() -> String {
    "localhost:9000".to_string()
}

pub fn minio_settings() -> super::models::MinioSettings {
    super::models::MinioSettings {
        enabled: false,
        endpoint: minio_endpoint(),
        access_key_id: String::new(),
        secret_access_key: String::new(),
        use_ssl: false,
        region: s3_region(),
        bucket: String::new(),
    }
}

pub fn sftp_port() -> u16 {
    22
}

pub fn sftp_settings() -> super::models::SftpSettings {
    super::models::SftpSettings {
        enabled: false,
        host: String::new(),
        port: sftp_port(),
        user: String::new(),
        password: String::new(),
    }
}

pub fn webdav_settings() -> super::models::WebDavSettings {
    super::models::WebDavSettings {
        enabled: false,
        host: String::new(),
        user: String::new(),
        password: String::new(),
    }
}

pub fn storage_settings() -> super::models::StorageSettings {
    super::models::StorageSettings {
        local: local_settings(),
        s3: s3_settings(),
        minio: minio_settings(),
        sftp: sftp_settings(),
        webdav: webdav_settings(),
    }
}

pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# ===============================================================================
# Stowage Configuration
# ===============================================================================

[uploads]
temp_dir = "./tmp"                   # Staging directory for inbound uploads
max_upload_size_mb = 10              # Max accepted file size in MB
allowed_mime_types = [               # Sniffed content types accepted by the upload pipeline
    "image/gif",
    "image/jpeg",
    "image/png",
    "application/pdf",
]

# ===============================================================================
# STORAGE BACKENDS
# ===============================================================================
# Each enabled section is registered under its name: LOCAL, S3, MINIO, SFTP, WEBDAV

[storage.local]
enabled = true                       # Local disk backend
root = "./storage"                   # Root directory for stored files

[storage.s3]
enabled = false                      # Requires a build with --features s3
endpoint_url = ""                    # Custom endpoint (empty = AWS endpoint for region)
region = "us-east-1"                 # S3 region
access_key_id = ""                   # AWS Access Key ID
secret_access_key = ""               # AWS Secret Access Key
bucket = ""                          # Bucket name

[storage.minio]
enabled = false                      # Requires a build with --features s3
endpoint = "localhost:9000"          # MinIO host:port
access_key_id = ""                   # MinIO access key
secret_access_key = ""               # MinIO secret key
use_ssl = false                      # Use https for the endpoint
region = "us-east-1"                 # Region reported to the SDK
bucket = ""                          # Bucket name

[storage.sftp]
enabled = false                      # Requires a build with --features sftp
host = ""                            # SFTP server host
port = 22                            # SSH port
user = ""                            # Login user
password = ""                        # Login password

[storage.webdav]
enabled = false                      # WebDAV backend
host = ""                            # Base URL, e.g. https://dav.example.com/dav
user = ""                            # Basic auth user
password = ""                        # Basic auth password
"#;
