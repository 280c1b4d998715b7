//! Arm / disarm protocol.
//!
//! ```text
//!   raw code ─▶ parse_code ─▶ append exclusions (memory + store)
//!                                   │
//!                     numeral == code?
//!                 no ─┤            ├─ yes, Disarmed ─▶ open-zone check ─▶ Armed
//!      "Incorrect code"            └─ yes, Armed ───▶ Disarmed, exclusions
//!                                                     cleared, siren off
//! ```
//!
//! Exclusions named by a code are recorded before the match decision, so a
//! wrong code with trailing digits still excludes those zones. An attempt
//! limiter, when one is fitted, is consulted only after that point. Every state
//! change is written to the store before the reply is produced; a failed
//! write is logged and the in-memory state stands.

pub mod code;
pub mod state;

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::app::events::Notice;
use crate::app::ports::{EventSink, StoragePort};
use crate::drivers::siren::{SilenceReason, SirenDriver};
use crate::error::ProtocolError;
use crate::sensors::zone::ZoneStatus;
use crate::store::PersistentStateStore;

use code::parse_code;
use state::{ArmState, ExclusionSet, ZoneId};

/// Last segment of a channel name, after the final `.` or `/`.
///
/// `"monitoring.zone-5"` and `"user/feeds/zone-5"` both yield `"zone-5"`.
pub fn channel_suffix(channel: &str) -> &str {
    match channel.rfind(['.', '/']) {
        Some(i) => &channel[i + 1..],
        None => channel,
    }
}

/// Result of evaluating one code submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeOutcome {
    /// The input could not be parsed; nothing changed.
    Malformed(ProtocolError),
    /// Parsed but did not match the configured code.
    Incorrect,
    /// Exclusions recorded; the comparison was refused by the attempt limiter.
    RateLimited,
    Armed,
    Disarmed,
    /// Arming refused: these zones are open and not excluded.
    Blocked(Vec<String>),
}

impl CodeOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            Self::Malformed(_) | Self::Incorrect => {
                Notice::warning("Incorrect code, system state unchanged")
            }
            Self::RateLimited => Notice::warning("Too many attempts, system state unchanged"),
            Self::Armed => Notice::info("System armed"),
            Self::Disarmed => Notice::info("System disarmed"),
            Self::Blocked(names) => Notice::info(format!(
                "Cannot arm system; the following zone(s) are open: {}",
                names.join(", ")
            )),
        }
    }
}

pub struct AlarmController<S: StoragePort> {
    code: u32,
    state: ArmState,
    exclusions: ExclusionSet,
    store: PersistentStateStore<S>,
}

impl<S: StoragePort> AlarmController<S> {
    /// Build the controller from the persisted state.
    pub fn restore(code: u32, mut store: PersistentStateStore<S>) -> Self {
        let (state, exclusions) = store.load();
        info!("Alarm: restored {} (excluded {})", state, exclusions);
        Self {
            code,
            state,
            exclusions,
            store,
        }
    }

    /// Evaluate a raw operator input and return the operator reply.
    pub fn submit_code<Z: ZoneStatus, O: OutputPin>(
        &mut self,
        raw: &str,
        zones: &[Z],
        siren: &mut SirenDriver<O>,
        sink: &mut impl EventSink,
    ) -> Notice {
        self.submit(raw, zones, siren, sink).notice()
    }

    /// Evaluate a raw operator input.
    pub fn submit<Z: ZoneStatus, O: OutputPin>(
        &mut self,
        raw: &str,
        zones: &[Z],
        siren: &mut SirenDriver<O>,
        sink: &mut impl EventSink,
    ) -> CodeOutcome {
        self.submit_with(raw, zones, siren, sink, || true)
    }

    /// Like [`submit`](Self::submit), but `admit` decides whether the code
    /// is compared at all. It runs after the exclusions are recorded and is
    /// not consulted for malformed input.
    pub fn submit_with<Z: ZoneStatus, O: OutputPin>(
        &mut self,
        raw: &str,
        zones: &[Z],
        siren: &mut SirenDriver<O>,
        sink: &mut impl EventSink,
        admit: impl FnOnce() -> bool,
    ) -> CodeOutcome {
        let parsed = match parse_code(raw) {
            Ok(p) => p,
            Err(e) => {
                warn!("Alarm: rejected input ({})", e);
                return CodeOutcome::Malformed(e);
            }
        };

        for id in parsed.exclusions {
            self.exclude(id);
        }

        if !admit() {
            warn!("Alarm: code attempt rate-limited");
            return CodeOutcome::RateLimited;
        }

        if parsed.numeral != self.code {
            warn!("Alarm: incorrect code");
            return CodeOutcome::Incorrect;
        }

        match self.state {
            ArmState::Disarmed => self.arm(zones),
            ArmState::Armed => {
                self.disarm(siren, sink);
                CodeOutcome::Disarmed
            }
        }
    }

    /// Whether the zone published on `channel` is excluded.
    pub fn zone_is_excluded(&self, channel: &str) -> bool {
        self.exclusions.contains(channel_suffix(channel))
    }

    pub fn arm_state(&self) -> ArmState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state.is_armed()
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn store(&self) -> &PersistentStateStore<S> {
        &self.store
    }

    // ── Transitions ───────────────────────────────────────────

    fn exclude(&mut self, id: ZoneId) {
        match self.exclusions.insert(id.clone()) {
            Ok(true) => info!("Alarm: excluded {}", id),
            Ok(false) => return,
            Err(_) => {
                warn!("Alarm: exclusion set full, {} ignored", id);
                return;
            }
        }
        if let Err(e) = self.store.append_exclusion(id) {
            error!("Alarm: failed to persist exclusion ({})", e);
        }
    }

    fn arm<Z: ZoneStatus>(&mut self, zones: &[Z]) -> CodeOutcome {
        let blocking: Vec<String> = zones
            .iter()
            .filter(|z| z.is_open() && !self.zone_is_excluded(z.channel()))
            .map(|z| z.name().to_owned())
            .collect();

        if !blocking.is_empty() {
            info!("Alarm: arming blocked by {} open zone(s)", blocking.len());
            return CodeOutcome::Blocked(blocking);
        }

        self.state = ArmState::Armed;
        if let Err(e) = self.store.save_arm_state(self.state) {
            error!("Alarm: failed to persist arm state ({})", e);
        }
        info!("Alarm: armed, excluded {}", self.exclusions);
        CodeOutcome::Armed
    }

    fn disarm<O: OutputPin>(&mut self, siren: &mut SirenDriver<O>, sink: &mut impl EventSink) {
        self.state = ArmState::Disarmed;
        if let Err(e) = self.store.save_arm_state(self.state) {
            error!("Alarm: failed to persist arm state ({})", e);
        }

        self.exclusions.clear();
        if let Err(e) = self.store.clear_exclusions() {
            error!("Alarm: failed to clear stored exclusions ({})", e);
        }

        if siren.is_sounding() {
            siren.disable(SilenceReason::Disarm, sink);
        }
        info!("Alarm: disarmed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::events::{AppEvent, Severity};
    use crate::app::ports::StorageError;
    use core::convert::Infallible;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemStorage(HashMap<String, Vec<u8>>);

    impl StoragePort for MemStorage {
        fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
            let v = self.0.get(&format!("{ns}::{key}")).ok_or(StorageError::NotFound)?;
            buf[..v.len()].copy_from_slice(v);
            Ok(v.len())
        }

        fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
            self.0.insert(format!("{ns}::{key}"), data.to_vec());
            Ok(())
        }

        fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
            self.0.remove(&format!("{ns}::{key}"));
            Ok(())
        }

        fn exists(&self, ns: &str, key: &str) -> bool {
            self.0.contains_key(&format!("{ns}::{key}"))
        }
    }

    struct Relay;

    impl embedded_hal::digital::ErrorType for Relay {
        type Error = Infallible;
    }

    impl OutputPin for Relay {
        fn set_low(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    struct Zone {
        name: &'static str,
        channel: &'static str,
        open: bool,
    }

    impl ZoneStatus for Zone {
        fn name(&self) -> &str {
            self.name
        }

        fn channel(&self) -> &str {
            self.channel
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[derive(Default)]
    struct Events(Vec<AppEvent>);

    impl EventSink for Events {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(event.clone());
        }
    }

    fn controller() -> AlarmController<MemStorage> {
        AlarmController::restore(1234, PersistentStateStore::new(MemStorage::default()))
    }

    fn siren() -> SirenDriver<Relay> {
        SirenDriver::new(Relay, Relay, 10)
    }

    const CLOSED: [Zone; 2] = [
        Zone { name: "Front door", channel: "monitoring.zone-1", open: false },
        Zone { name: "Garage", channel: "monitoring.zone-3", open: false },
    ];

    #[test]
    fn channel_suffix_takes_last_segment() {
        assert_eq!(channel_suffix("monitoring.zone-5"), "zone-5");
        assert_eq!(channel_suffix("user/feeds/zone-5"), "zone-5");
        assert_eq!(channel_suffix("a.b/zone-2"), "zone-2");
        assert_eq!(channel_suffix("zone-7"), "zone-7");
        assert_eq!(channel_suffix("monitoring."), "");
    }

    #[test]
    fn correct_code_toggles_arm_state() {
        let mut alarm = controller();
        let mut siren = siren();
        let mut events = Events::default();

        let n = alarm.submit_code("1234", &CLOSED, &mut siren, &mut events);
        assert_eq!(n, Notice::info("System armed"));
        assert!(alarm.is_armed());

        let n = alarm.submit_code("1234", &CLOSED, &mut siren, &mut events);
        assert_eq!(n, Notice::info("System disarmed"));
        assert!(!alarm.is_armed());
    }

    #[test]
    fn wrong_code_is_a_warning() {
        let mut alarm = controller();
        let n = alarm.submit_code("9999", &CLOSED, &mut siren(), &mut Events::default());
        assert_eq!(n.message, "Incorrect code, system state unchanged");
        assert_eq!(n.severity, Severity::Warning);
        assert_eq!(alarm.arm_state(), ArmState::Disarmed);
    }

    #[test]
    fn malformed_code_reads_as_incorrect() {
        let mut alarm = controller();
        let outcome = alarm.submit("12a45", &CLOSED, &mut siren(), &mut Events::default());
        assert_eq!(outcome, CodeOutcome::Malformed(ProtocolError::NonNumeral));
        assert_eq!(outcome.notice().message, "Incorrect code, system state unchanged");
        assert!(alarm.exclusions().is_empty());
    }

    #[test]
    fn trailing_digit_excludes_before_decision() {
        let mut alarm = controller();
        let zones = [
            Zone { name: "Front door", channel: "monitoring.zone-1", open: false },
            Zone { name: "Basement", channel: "monitoring.zone-5", open: true },
        ];

        let n = alarm.submit_code("12345", &zones, &mut siren(), &mut Events::default());
        assert_eq!(n.message, "System armed");
        assert!(alarm.zone_is_excluded("monitoring.zone-5"));
        assert!(!alarm.zone_is_excluded("monitoring.zone-1"));
    }

    #[test]
    fn wrong_code_still_records_exclusion() {
        let mut alarm = controller();
        alarm.submit_code("43215", &CLOSED, &mut siren(), &mut Events::default());
        assert!(alarm.exclusions().contains("zone-5"));
        assert_eq!(alarm.arm_state(), ArmState::Disarmed);
    }

    #[test]
    fn refused_attempt_keeps_its_exclusions() {
        let mut alarm = controller();
        let outcome = alarm.submit_with(
            "12342",
            &CLOSED,
            &mut siren(),
            &mut Events::default(),
            || false,
        );
        assert_eq!(outcome, CodeOutcome::RateLimited);
        assert_eq!(outcome.notice().severity, Severity::Warning);
        assert!(alarm.exclusions().contains("zone-2"));
        assert_eq!(alarm.arm_state(), ArmState::Disarmed);
    }

    #[test]
    fn open_zone_blocks_arming() {
        let mut alarm = controller();
        let zones = [
            Zone { name: "Front door", channel: "monitoring.zone-1", open: true },
            Zone { name: "Garage", channel: "monitoring.zone-3", open: true },
            Zone { name: "Hall", channel: "monitoring.zone-4", open: false },
        ];

        let n = alarm.submit_code("1234", &zones, &mut siren(), &mut Events::default());
        assert_eq!(
            n,
            Notice::info("Cannot arm system; the following zone(s) are open: Front door, Garage")
        );
        assert_eq!(alarm.arm_state(), ArmState::Disarmed);
    }

    #[test]
    fn disarm_clears_exclusions_and_silences() {
        let mut alarm = controller();
        let mut siren = siren();
        let mut events = Events::default();

        alarm.submit_code("12343", &CLOSED, &mut siren, &mut events);
        assert!(alarm.is_armed());
        siren.trigger(crate::drivers::siren::SirenMode::Steady, &mut events);

        alarm.submit_code("1234", &CLOSED, &mut siren, &mut events);
        assert!(alarm.exclusions().is_empty());
        assert!(!siren.is_sounding());
        assert!(events.0.iter().any(|e| matches!(
            e,
            AppEvent::SirenSilenced { reason: SilenceReason::Disarm, .. }
        )));
        assert_eq!(alarm.store().try_load(), Ok((ArmState::Disarmed, ExclusionSet::new())));
    }

    #[test]
    fn short_code_compares_whole() {
        let mut alarm =
            AlarmController::restore(42, PersistentStateStore::new(MemStorage::default()));
        let n = alarm.submit_code("42", &CLOSED, &mut siren(), &mut Events::default());
        assert_eq!(n.message, "System armed");
        assert_eq!(alarm.store().try_load().map(|(a, _)| a), Ok(ArmState::Armed));
    }
}
