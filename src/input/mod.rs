//! Run inputs read from disk: cookies, post body, media

pub mod cookies;
pub mod markdown;
pub mod media;

pub use cookies::{load_cookies, parse_cookies, Cookie, SameSite};
pub use markdown::{load_content, to_platform_text};
pub use media::scan_media_folder;
