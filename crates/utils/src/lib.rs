pub mod path;
pub mod size;
pub mod validator;
pub mod errors;

pub use path::*;
pub use size::*;
pub use validator::*;
pub use errors::*;
