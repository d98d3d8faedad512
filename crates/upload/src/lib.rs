mod errors;
mod pipeline;
mod sniff;

pub use errors::UploadError;
pub use pipeline::{StagedUpload, UploadPipeline};
pub use sniff::{detect, OCTET_STREAM, SNIFF_LEN, TEXT_PLAIN};
