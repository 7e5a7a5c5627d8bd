//! Well-known names of the open taxonomy and constructors for common contexts.
//!
//! The taxonomy is open: any string is accepted as a context or event type. The names
//! below are the ones the built-in plugins and validation rules know about.

use super::contexts::{GlobalContext, LocationContext};
use serde_json::Value;

pub const APPLICATION_CONTEXT: &str = "ApplicationContext";
pub const PATH_CONTEXT: &str = "PathContext";
pub const COOKIE_ID_CONTEXT: &str = "CookieIdContext";
pub const HTTP_CONTEXT: &str = "HttpContext";
pub const SESSION_CONTEXT: &str = "SessionContext";
pub const MARKETING_CONTEXT: &str = "MarketingContext";

pub const ROOT_LOCATION_CONTEXT: &str = "RootLocationContext";
pub const CONTENT_CONTEXT: &str = "ContentContext";
pub const PRESSABLE_CONTEXT: &str = "PressableContext";
pub const LINK_CONTEXT: &str = "LinkContext";
pub const INPUT_CONTEXT: &str = "InputContext";
pub const OVERLAY_CONTEXT: &str = "OverlayContext";
pub const NAVIGATION_CONTEXT: &str = "NavigationContext";
pub const EXPANDABLE_CONTEXT: &str = "ExpandableContext";
pub const MEDIA_PLAYER_CONTEXT: &str = "MediaPlayerContext";

pub const PRESS_EVENT: &str = "PressEvent";
pub const INPUT_CHANGE_EVENT: &str = "InputChangeEvent";
pub const APPLICATION_LOADED_EVENT: &str = "ApplicationLoadedEvent";
pub const VISIBLE_EVENT: &str = "VisibleEvent";
pub const HIDDEN_EVENT: &str = "HiddenEvent";
pub const SUCCESS_EVENT: &str = "SuccessEvent";
pub const FAILURE_EVENT: &str = "FailureEvent";
pub const MEDIA_START_EVENT: &str = "MediaStartEvent";
pub const MEDIA_STOP_EVENT: &str = "MediaStopEvent";

/// Internal discriminator marking events triggered by a user interaction
pub const INTERACTIVE_EVENT_MARKER: &str = "__interactive_event";

/// Internal discriminator marking events not triggered by a user interaction
pub const NON_INTERACTIVE_EVENT_MARKER: &str = "__non_interactive_event";

/// Prefix of internal keys that must never reach a collector
pub const RESERVED_KEY_PREFIX: &str = "__";

/// Event types that are interactive in the standard taxonomy
pub const INTERACTIVE_EVENT_TYPES: &[&str] = &[PRESS_EVENT, INPUT_CHANGE_EVENT];

pub fn is_interactive_event_type(event_type: &str) -> bool {
    INTERACTIVE_EVENT_TYPES.contains(&event_type)
}

pub fn application_context(id: impl Into<String>) -> GlobalContext {
    GlobalContext::new(APPLICATION_CONTEXT, id)
}

pub fn path_context(id: impl Into<String>) -> GlobalContext {
    GlobalContext::new(PATH_CONTEXT, id)
}

pub fn cookie_id_context(id: impl Into<String>, cookie_id: impl Into<String>) -> GlobalContext {
    GlobalContext::new(COOKIE_ID_CONTEXT, id)
        .with_property("cookie_id", Value::String(cookie_id.into()))
}

pub fn http_context(
    id: impl Into<String>,
    referrer: impl Into<String>,
    user_agent: impl Into<String>,
) -> GlobalContext {
    GlobalContext::new(HTTP_CONTEXT, id)
        .with_property("referrer", Value::String(referrer.into()))
        .with_property("user_agent", Value::String(user_agent.into()))
}

pub fn session_context(id: impl Into<String>, hit_number: u64) -> GlobalContext {
    GlobalContext::new(SESSION_CONTEXT, id).with_property("hit_number", hit_number)
}

pub fn root_location_context(id: impl Into<String>) -> LocationContext {
    LocationContext::new(ROOT_LOCATION_CONTEXT, id)
}

pub fn content_context(id: impl Into<String>) -> LocationContext {
    LocationContext::new(CONTENT_CONTEXT, id)
}

pub fn pressable_context(id: impl Into<String>) -> LocationContext {
    LocationContext::new(PRESSABLE_CONTEXT, id)
}

pub fn link_context(id: impl Into<String>, href: impl Into<String>) -> LocationContext {
    LocationContext::new(LINK_CONTEXT, id).with_property("href", Value::String(href.into()))
}

pub fn input_context(id: impl Into<String>) -> LocationContext {
    LocationContext::new(INPUT_CONTEXT, id)
}

pub fn overlay_context(id: impl Into<String>) -> LocationContext {
    LocationContext::new(OVERLAY_CONTEXT, id)
}

pub fn navigation_context(id: impl Into<String>) -> LocationContext {
    LocationContext::new(NAVIGATION_CONTEXT, id)
}

pub fn expandable_context(id: impl Into<String>) -> LocationContext {
    LocationContext::new(EXPANDABLE_CONTEXT, id)
}

pub fn media_player_context(id: impl Into<String>) -> LocationContext {
    LocationContext::new(MEDIA_PLAYER_CONTEXT, id)
}
