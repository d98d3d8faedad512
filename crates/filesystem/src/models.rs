/// Local directory helpers used at startup and by the local backend
pub struct FileSystem;
