use std::io;
use std::path::PathBuf;

use crate::nav::ViewId;

use super::Settings;

/// Version of the data-handling notice shown by the consent view. Raising it
/// shows the notice again on next launch.
pub const NOTICE_VERSION: u32 = 1;

/// Directory name below the platform data directory.
pub const APP_DIR: &str = "arbor";

/// First view to activate for the given settings.
pub fn initial_view(settings: &Settings) -> ViewId {
    if settings.acknowledged_notice_version < NOTICE_VERSION {
        ViewId::Consent
    } else if settings.address.trim().is_empty() {
        ViewId::ConnectForm
    } else {
        ViewId::CommunityMenu
    }
}

/// Where the view after consent should lead; consent itself is skipped.
pub fn after_consent(settings: &Settings) -> ViewId {
    initial_view(&Settings {
        acknowledged_notice_version: NOTICE_VERSION,
        ..settings.clone()
    })
}

/// `override_dir` if given, otherwise the platform data directory.
pub fn resolve_data_dir(override_dir: Option<PathBuf>) -> Option<PathBuf> {
    override_dir.or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
}

pub fn prepare_data_dir(dir: PathBuf) -> io::Result<PathBuf> {
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_table_is_evaluated_in_order() {
        let fresh = Settings::default();
        assert_eq!(initial_view(&fresh), ViewId::Consent);

        let consented = Settings {
            acknowledged_notice_version: NOTICE_VERSION,
            ..Settings::default()
        };
        assert_eq!(initial_view(&consented), ViewId::ConnectForm);

        let connected = Settings {
            address: "relay:7117".into(),
            ..consented.clone()
        };
        assert_eq!(initial_view(&connected), ViewId::CommunityMenu);

        let stale_notice = Settings {
            acknowledged_notice_version: 0,
            ..connected
        };
        assert_eq!(initial_view(&stale_notice), ViewId::Consent);
        assert_eq!(after_consent(&stale_notice), ViewId::CommunityMenu);
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        let chosen = resolve_data_dir(Some(dir.path().join("x")));
        assert_eq!(chosen, Some(dir.path().join("x")));
        let created = prepare_data_dir(dir.path().join("x")).unwrap();
        assert!(created.is_dir());
    }
}
