//! Power-loss recovery: state persisted by one boot is restored by the next.

use zonewatch::alarm::state::ArmState;
use zonewatch::app::events::AppEvent;
use zonewatch::drivers::siren::{SirenMode, SirenState};

use super::alarm_flow_tests::Rig;
use super::mock_hw::{MemStorage, test_config};

#[test]
fn armed_state_survives_restart() {
    let storage = MemStorage::default();
    let config = test_config(2);

    let mut first = Rig::boot(&config, storage.clone());
    first.tick();
    first.submit("1234");
    assert!(first.app.is_armed());
    drop(first);

    let second = Rig::boot(&config, storage);
    assert_eq!(second.app.alarm().arm_state(), ArmState::Armed);
    assert_eq!(second.siren_state(), SirenState::Idle);
    assert_eq!(
        second.sink.events[0].to_string(),
        "System is armed with no zones excluded"
    );
}

#[test]
fn zone_left_open_across_restart_sounds_when_armed() {
    let storage = MemStorage::default();
    let config = test_config(2);

    let mut first = Rig::boot(&config, storage.clone());
    first.tick();
    first.submit("1234");
    assert!(first.app.is_armed());
    drop(first);

    // Door forced open while the controller was down.
    let mut second = Rig::boot(&config, storage);
    second.zones[0].set_high(true);
    second.ticks(5);
    assert!(second.app.is_armed());
    assert_eq!(second.siren_state(), SirenState::Sounding(SirenMode::Steady));
    assert!(!second.steady.is_high(), "steady relay active-low");
}

#[test]
fn zone_open_at_boot_is_quiet_when_excluded_or_disarmed() {
    let storage = MemStorage::default();
    let config = test_config(2);

    let mut first = Rig::boot(&config, storage.clone());
    first.tick();
    first.submit("12342");
    assert!(first.app.is_armed());
    drop(first);

    let mut second = Rig::boot(&config, storage.clone());
    second.zones[1].set_high(true);
    second.ticks(5);
    assert_eq!(second.siren_state(), SirenState::Idle);
    assert!(second.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ZoneExcluded { channel } if channel == "monitoring.zone-2"
    )));

    second.submit("1234");
    assert!(!second.app.is_armed());
    drop(second);

    let mut third = Rig::boot(&config, storage);
    third.zones[0].set_high(true);
    third.ticks(5);
    assert_eq!(third.siren_state(), SirenState::Idle);
}

#[test]
fn exclusions_survive_restart() {
    let storage = MemStorage::default();
    let config = test_config(3);

    let mut first = Rig::boot(&config, storage.clone());
    first.tick();
    first.submit("123423");
    drop(first);

    let mut second = Rig::boot(&config, storage);
    assert!(second.app.is_armed());
    assert_eq!(
        second.sink.events[0].to_string(),
        "System is armed with these zones excluded: [zone-2, zone-3]"
    );

    // Excluded zone stays quiet after the restart, others still trigger.
    second.tick();
    second.zones[1].set_high(true);
    second.tick();
    assert_eq!(second.siren_state(), SirenState::Idle);
    second.zones[0].set_high(true);
    second.tick();
    assert!(second.app.siren().is_sounding());
}

#[test]
fn disarm_before_restart_leaves_nothing_behind() {
    let storage = MemStorage::default();
    let config = test_config(2);

    let mut first = Rig::boot(&config, storage.clone());
    first.tick();
    first.submit("12342");
    first.submit("1234");
    assert!(!first.app.is_armed());
    drop(first);

    let second = Rig::boot(&config, storage);
    assert!(!second.app.is_armed());
    assert!(second.app.alarm().exclusions().is_empty());
}

#[test]
fn corrupt_medium_boots_disarmed() {
    let storage = MemStorage::default();
    storage.corrupt("alarm", "armed");

    let rig = Rig::boot(&test_config(1), storage.clone());
    assert!(!rig.app.is_armed());
    assert!(matches!(
        rig.sink.events[0],
        AppEvent::Started {
            armed: ArmState::Disarmed,
            ..
        }
    ));
    // The default was written back over the corrupt record.
    drop(rig);
    let again = Rig::boot(&test_config(1), storage);
    assert!(!again.app.is_armed());
    assert!(!again.app.alarm().store().has_pending_writes());
}

#[test]
fn unreachable_medium_runs_in_memory() {
    let storage = MemStorage::default();
    storage.offline.set(true);

    let mut rig = Rig::boot(&test_config(1), storage.clone());
    rig.tick();
    rig.submit("1234");
    assert!(rig.app.is_armed(), "state change stands without persistence");
    assert!(rig.app.alarm().store().has_pending_writes());

    // Medium comes back: the next mutation flushes both records.
    storage.offline.set(false);
    rig.submit("12341");
    assert!(!rig.app.alarm().store().has_pending_writes());
    assert!(storage.exists_record("alarm", "armed"));
}
