pub mod click;
pub mod link;
pub mod validation;

pub use click::{ClickEvent, ClickMetadata, RecentClick};
pub use link::{
    CreateLinkRequest, Link, LinkChanges, LinkFilter, NewLink, UpdateLinkRequest,
    DEFAULT_CATEGORY, DEFAULT_CREATOR,
};
pub use validation::{normalize_keyword, validate_keyword, validate_url, ValidationError};
