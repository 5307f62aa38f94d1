//! Request decorators that attach caller credentials.

mod api_key;
mod url_param;

pub use api_key::{ApiKey, FUNCTIONS_KEY_HEADER};
pub use url_param::{BUID_PARAM, UrlParam};
