//! Wall-clock helper shared by the keyring and the token layer.
//!
//! Wire timestamps are `u32` seconds-since-epoch (§4.C, §6); see SPEC_FULL §9 for the
//! decision to keep that width rather than widen it. `now_u32` fails rather than silently
//! wrapping if the clock is ever past 2106.

use crate::error::{Result, WebauthError};
use chrono::Utc;

pub fn now_u32() -> Result<u32> {
    let secs = Utc::now().timestamp();
    u32::try_from(secs).map_err(|_| WebauthError::Invalid("current time does not fit in u32".into()))
}
