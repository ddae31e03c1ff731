// Bridge action names. Matching is exact and case-sensitive.

// display
pub const SHOW: &str = "show";
pub const UPDATE: &str = "update";

// queries
pub const GET_IDS: &str = "getIds";
pub const GET_BY_IDS: &str = "getByIds";
pub const GET_OPTIONS_BY_ID: &str = "getOptionsById";
pub const EXIST: &str = "exist";
pub const GET_ALL: &str = "getAll";

// removal
pub const CANCEL: &str = "cancel";
pub const CANCEL_ALL: &str = "cancelAll";
pub const CLEAR: &str = "clear";
pub const CLEAR_ALL: &str = "clearAll";
pub const CLOSE: &str = "close";

// permissions
pub const HAS_PERMISSION: &str = "hasPermission";

// host lifecycle and platform callbacks
pub const DEVICE_READY: &str = "deviceready";
pub const RESUME: &str = "resume";
pub const PAUSE: &str = "pause";
pub const CLICKED: &str = "clicked";
pub const DISMISSED: &str = "dismissed";
