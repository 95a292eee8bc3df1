//! Browser-session types.
//!
//! Values stored in the tower-sessions session of each browser.

/// Session keys.
pub mod keys {
    /// OAuth flow awaiting its callback (`PendingOAuth`).
    pub const OAUTH_PENDING: &str = "oauth_pending";

    /// Shop established by a verified launch or OAuth callback.
    pub const SHOP: &str = "shop";

    /// Host parameter from the last launch, needed to re-enter the admin iframe.
    pub const HOST: &str = "host";

    /// Id of this browser's online Shopify session, if any.
    pub const ONLINE_SESSION_ID: &str = "online_session_id";

    /// Token admin forms must echo back.
    pub const FORM_TOKEN: &str = "form_token";

    /// Catalog ids this browser has unlocked.
    pub const PREVIEW_UNLOCKED: &str = "preview_unlocked";
}
