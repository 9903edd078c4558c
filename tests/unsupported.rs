//! Resolution behavior on a platform that reports no tray.
//!
//! Lives in its own test binary because backend selection and the
//! container singleton are process-wide: here the process binds a backend
//! whose facility is absent, and every resolution must collapse to
//! `Unsupported`, repeatably, since the outcome is cached.

use std::sync::{Arc, Once};

use systray_shim::binding::{self, TrayBackend};
use systray_shim::error::BindFailure;
use systray_shim::peer::{IconRequest, SystemTrayPeer, TrayIconPeer};
use systray_shim::{SystemTray, TrayError, TrayIcon, TrayImage};

fn absent_probe() -> Result<bool, BindFailure> {
    Ok(false)
}

fn absent_container() -> Result<Box<dyn SystemTrayPeer>, BindFailure> {
    Err(BindFailure::unavailable("desktop tray is missing"))
}

fn absent_icon(_request: IconRequest) -> Result<Arc<dyn TrayIconPeer>, BindFailure> {
    Err(BindFailure::unavailable("desktop tray is missing"))
}

static ABSENT: TrayBackend = TrayBackend {
    name: "absent",
    probe: absent_probe,
    container: absent_container,
    icon: absent_icon,
};

fn setup() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        binding::install(&ABSENT).expect("no other backend may be installed first");
    });
}

#[test]
fn instance_reports_unsupported_and_the_outcome_is_cached() {
    setup();

    assert_eq!(SystemTray::instance().err(), Some(TrayError::Unsupported));
    assert_eq!(SystemTray::instance().err(), Some(TrayError::Unsupported));
}

#[test]
fn is_supported_is_false_and_never_errors_for_absence() {
    setup();

    assert!(matches!(SystemTray::is_supported(), Ok(false)));
    assert!(matches!(SystemTray::is_supported(), Ok(false)));
}

#[test]
fn icon_construction_reports_unsupported() {
    setup();
    let image = TrayImage::from_rgba(vec![0xff; 16 * 16 * 4], 16, 16);

    assert_eq!(TrayIcon::new(image).err(), Some(TrayError::Unsupported));
}

#[test]
fn a_second_backend_cannot_displace_the_first() {
    setup();

    assert!(binding::install(&ABSENT).is_err());
}
