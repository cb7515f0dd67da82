//! Well-known notification channel names.
//!
//! These must match the values stored in
//! `notification_preferences.channels`.

/// Web Push delivered to the user's registered browser subscriptions.
pub const CHANNEL_PUSH: &str = "push";

/// In-app notification surfaced through the realtime feed.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Email notification.
pub const CHANNEL_EMAIL: &str = "email";

/// All channel names accepted by the preferences endpoint.
pub const VALID_CHANNELS: &[&str] = &[CHANNEL_PUSH, CHANNEL_IN_APP, CHANNEL_EMAIL];

/// Channels a user receives when no preference row exists.
pub const DEFAULT_CHANNELS: &[&str] = &[CHANNEL_PUSH, CHANNEL_IN_APP];

/// Validate a requested channel list.
pub fn validate_channels(channels: &[String]) -> Result<(), String> {
    for channel in channels {
        if !VALID_CHANNELS.contains(&channel.as_str()) {
            return Err(format!(
                "Unknown channel '{channel}'. Must be one of: {}",
                VALID_CHANNELS.join(", ")
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_channels_pass() {
        let channels = vec!["push".to_string(), "email".to_string()];
        assert!(validate_channels(&channels).is_ok());
    }

    #[test]
    fn unknown_channel_rejected() {
        let channels = vec!["sms".to_string()];
        let err = validate_channels(&channels).unwrap_err();
        assert!(err.contains("Unknown channel 'sms'"));
    }

    #[test]
    fn empty_list_is_allowed() {
        assert!(validate_channels(&[]).is_ok());
    }
}
