pub mod config;
pub mod error;
pub mod recent;
pub mod text;
pub mod types;
pub mod validate;

pub use config::{ClientConfig, ProxyConfig};
pub use error::{codes, CredcheckError, ErrorEnvelope};
pub use recent::{RecentCheck, RecentChecks};
pub use text::{decode_display_text, parse_keywords, process_keywords, MAX_DISPLAY_KEYWORDS};
pub use types::*;
pub use validate::{validate_target_url, UrlRejection};
