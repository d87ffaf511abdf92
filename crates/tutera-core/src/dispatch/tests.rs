#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;

use super::*;
use crate::memory::InMemoryBrightness;
use crate::model::{
    ClimateState, DeviceKind, QuickAction, Room, RoomId, RoomSummary, Scene,
};
use crate::store::RefreshSnapshot;

// ── Fake executor ───────────────────────────────────────────────────

#[derive(Default)]
struct FakeExecutor {
    delay: Duration,
    calls: Mutex<Vec<Intent>>,
    failing: Mutex<HashSet<DeviceId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    refreshes: AtomicUsize,
}

impl FakeExecutor {
    fn calls(&self) -> Vec<Intent> {
        self.calls.lock().unwrap().clone()
    }

    fn fail(&self, id: DeviceId) {
        self.failing.lock().unwrap().insert(id);
    }
}

impl CommandExecutor for FakeExecutor {
    async fn execute(&self, intent: &Intent) -> Result<Option<DeviceState>, CoreError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(intent.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failing = match intent {
            Intent::Device { id, .. } => self.failing.lock().unwrap().contains(id),
            _ => false,
        };
        if failing {
            return Err(CoreError::Transport {
                message: "no route to device".into(),
                status: None,
            });
        }
        Ok(None)
    }

    async fn refresh(&self) -> Result<(), CoreError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Fixture ─────────────────────────────────────────────────────────

const ROOM: RoomId = RoomId(1);

fn light(raw: u32) -> DeviceId {
    DeviceId::new(DeviceKind::Light, raw)
}

fn lock_id() -> DeviceId {
    DeviceId::new(DeviceKind::Lock, 9)
}

fn thermostat_id() -> DeviceId {
    DeviceId::new(DeviceKind::Thermostat, 5)
}

fn pct(v: u8) -> Percent {
    Percent::new(v).unwrap()
}

fn dimmer(raw: u32, level: u8) -> Device {
    Device {
        id: light(raw),
        name: format!("Light {raw}"),
        room_id: Some(ROOM),
        state: DeviceState::Dimmer {
            brightness: pct(level),
        },
    }
}

struct Fixture {
    dispatcher: Dispatcher<FakeExecutor>,
    memory: Arc<InMemoryBrightness>,
}

impl Fixture {
    fn new(delay_ms: u64) -> Self {
        let store = Arc::new(DataStore::new());
        store.apply_refresh(RefreshSnapshot {
            rooms: vec![Room {
                id: ROOM,
                name: "Kitchen".into(),
                area_id: None,
                area_name: None,
            }],
            devices: vec![
                dimmer(1, 40),
                dimmer(2, 90),
                dimmer(3, 0),
                Device {
                    id: lock_id(),
                    name: "Back door".into(),
                    room_id: Some(ROOM),
                    state: DeviceState::Lock { locked: true },
                },
                Device {
                    id: thermostat_id(),
                    name: "Kitchen climate".into(),
                    room_id: Some(ROOM),
                    state: DeviceState::Thermostat(ClimateState {
                        current: Some(Temperature::from_tenths(200)),
                        setpoint: Some(Temperature::from_tenths(210)),
                        mode: ClimateMode::Heat,
                    }),
                },
            ],
            scenes: vec![Scene {
                id: SceneId(4),
                name: "Dinner".into(),
                room_id: Some(ROOM),
                kind: None,
                active: false,
                favorite: false,
            }],
            quick_actions: vec![QuickAction {
                id: QuickActionId(2),
                name: "All off".into(),
            }],
        });

        let memory = Arc::new(InMemoryBrightness::new());
        let executor = FakeExecutor {
            delay: Duration::from_millis(delay_ms),
            ..FakeExecutor::default()
        };
        let dispatcher = Dispatcher::new(
            executor,
            store,
            memory.clone(),
            DispatchSettings::default(),
        );
        Self { dispatcher, memory }
    }

    fn brightness(&self, id: DeviceId) -> Percent {
        self.dispatcher
            .store()
            .device(&id)
            .unwrap()
            .state
            .brightness()
            .unwrap()
    }

    fn executor(&self) -> &FakeExecutor {
        self.dispatcher.executor()
    }
}

fn brightness_call(id: DeviceId, level: u8) -> Intent {
    Intent::Device {
        id,
        patch: DevicePatch::Brightness(pct(level)),
    }
}

// ── Discrete intents ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn rapid_toggles_keep_one_call_in_flight() {
    let fx = Fixture::new(100);
    let d = &fx.dispatcher;

    let first = d.toggle(&light(3)).unwrap(); // off -> on (default 75%)
    let second = d.toggle(&light(3)).unwrap(); // on -> off, queued
    let third = d.toggle(&light(3)).unwrap(); // off -> on, displaces second
    let fourth = d.toggle(&light(3)).unwrap(); // on -> off, displaces third

    assert_eq!(fourth.outcome().await.unwrap(), CommandOutcome::Confirmed);
    assert_eq!(first.outcome().await.unwrap(), CommandOutcome::Overtaken);
    assert_eq!(second.outcome().await.unwrap(), CommandOutcome::Superseded);
    assert_eq!(third.outcome().await.unwrap(), CommandOutcome::Superseded);

    assert_eq!(
        fx.executor().calls(),
        vec![brightness_call(light(3), 75), brightness_call(light(3), 0)]
    );
    assert_eq!(fx.executor().max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(fx.brightness(light(3)), Percent::ZERO);
    assert!(fx.dispatcher.store().is_settled(&light(3)));
    assert!(!fx.dispatcher.is_in_flight(&Target::Device(light(3))));
}

#[tokio::test(start_paused = true)]
async fn toggle_restores_remembered_brightness() {
    let fx = Fixture::new(0);

    fx.dispatcher.toggle(&light(1)).unwrap().outcome().await.unwrap();
    assert_eq!(fx.brightness(light(1)), Percent::ZERO);
    assert_eq!(fx.memory.recall(&light(1)), Some(pct(40)));

    fx.dispatcher.toggle(&light(1)).unwrap().outcome().await.unwrap();
    assert_eq!(fx.brightness(light(1)), pct(40));
}

#[tokio::test(start_paused = true)]
async fn submitted_power_intents_use_brightness_memory() {
    let fx = Fixture::new(0);
    let power = |raw, on| Intent::Device {
        id: light(raw),
        patch: DevicePatch::Power(on),
    };

    fx.dispatcher.submit(power(1, false)).unwrap().outcome().await.unwrap();
    assert_eq!(fx.brightness(light(1)), Percent::ZERO);
    assert_eq!(fx.memory.recall(&light(1)), Some(pct(40)));

    fx.dispatcher.submit(power(1, true)).unwrap().outcome().await.unwrap();
    assert_eq!(fx.brightness(light(1)), pct(40));

    fx.dispatcher.submit(power(3, true)).unwrap().outcome().await.unwrap();
    assert_eq!(fx.brightness(light(3)), pct(75));

    assert_eq!(
        fx.executor().calls(),
        vec![
            brightness_call(light(1), 0),
            brightness_call(light(1), 40),
            brightness_call(light(3), 75),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_command_rolls_back_and_broadcasts() {
    let fx = Fixture::new(10);
    fx.executor().fail(lock_id());
    let mut failures = fx.dispatcher.failures();

    let ticket = fx.dispatcher.set_locked(&lock_id(), false).unwrap();
    assert!(!fx.dispatcher.store().device(&lock_id()).unwrap().is_on());

    let result = ticket.outcome().await;
    assert!(matches!(result, Err(CoreError::Transport { .. })));

    let failure = failures.recv().await.unwrap();
    assert_eq!(failure.target, Target::Device(lock_id()));
    assert_eq!(
        fx.dispatcher.store().device(&lock_id()).unwrap().state,
        DeviceState::Lock { locked: true }
    );
}

#[tokio::test]
async fn thermostat_cannot_be_toggled() {
    let fx = Fixture::new(0);
    let result = fx.dispatcher.toggle(&thermostat_id());
    assert!(matches!(result, Err(CoreError::Validation { .. })));
    assert!(fx.executor().calls().is_empty());
}

#[tokio::test]
async fn setpoint_is_confirmed_into_store() {
    let fx = Fixture::new(0);
    let outcome = fx
        .dispatcher
        .set_setpoint(&thermostat_id(), Temperature::from_tenths(225))
        .unwrap()
        .outcome()
        .await
        .unwrap();

    assert_eq!(outcome, CommandOutcome::Confirmed);
    let DeviceState::Thermostat(climate) =
        &fx.dispatcher.store().device(&thermostat_id()).unwrap().state
    else {
        panic!("expected thermostat");
    };
    assert_eq!(climate.setpoint, Some(Temperature::from_tenths(225)));
}

#[tokio::test]
async fn unknown_device_is_rejected_up_front() {
    let fx = Fixture::new(0);
    let result = fx.dispatcher.set_power(&light(77), true);
    assert!(matches!(result, Err(CoreError::Validation { .. })));
}

// ── Continuous intents ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn slider_sends_only_the_last_value() {
    let fx = Fixture::new(0);
    let d = &fx.dispatcher;

    let a = d.set_brightness(&light(1), pct(10)).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let b = d.set_brightness(&light(1), pct(20)).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let c = d.set_brightness(&light(1), pct(30)).unwrap();

    // Every value shows immediately.
    assert_eq!(fx.brightness(light(1)), pct(30));
    assert!(fx.executor().calls().is_empty());

    assert_eq!(c.outcome().await.unwrap(), CommandOutcome::Confirmed);
    assert_eq!(a.outcome().await.unwrap(), CommandOutcome::Superseded);
    assert_eq!(b.outcome().await.unwrap(), CommandOutcome::Superseded);
    assert_eq!(fx.executor().calls(), vec![brightness_call(light(1), 30)]);
}

#[tokio::test(start_paused = true)]
async fn discrete_intent_cancels_waiting_slider_value() {
    let fx = Fixture::new(0);
    let d = &fx.dispatcher;

    let slider = d.set_brightness(&light(2), pct(55)).unwrap();
    let off = d.set_power(&light(2), false).unwrap();

    assert_eq!(off.outcome().await.unwrap(), CommandOutcome::Confirmed);
    assert_eq!(slider.outcome().await.unwrap(), CommandOutcome::Superseded);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(fx.executor().calls(), vec![brightness_call(light(2), 0)]);
    assert_eq!(fx.brightness(light(2)), Percent::ZERO);
    assert_eq!(fx.memory.recall(&light(2)), Some(pct(55)));
}

// ── Room fan-out ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn room_off_then_on_restores_each_light() {
    let fx = Fixture::new(20);

    let off = fx.dispatcher.set_room_power(&ROOM, false).await.unwrap();
    assert_eq!(off.succeeded, vec![light(1), light(2), light(3)]);
    for raw in 1..=3 {
        assert_eq!(fx.brightness(light(raw)), Percent::ZERO);
    }

    fx.dispatcher.set_room_power(&ROOM, true).await.unwrap();
    assert_eq!(fx.brightness(light(1)), pct(40));
    assert_eq!(fx.brightness(light(2)), pct(90));
    // Never lit, nothing remembered.
    assert_eq!(fx.brightness(light(3)), pct(75));

    let summary = fx.dispatcher.store().room_summary(&ROOM).unwrap();
    assert_eq!(summary.lights_on, 3);
}

#[tokio::test(start_paused = true)]
async fn room_members_are_switched_concurrently() {
    let fx = Fixture::new(50);
    let store = fx.dispatcher.store();

    let started = tokio::time::Instant::now();
    fx.dispatcher.set_room_power(&ROOM, false).await.unwrap();

    assert_eq!(fx.executor().max_in_flight.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() < Duration::from_millis(100));

    // Published views agree with the per-device state once everything settles.
    for device in store.devices_snapshot().iter() {
        assert_eq!(**device, *store.device(&device.id).unwrap());
    }
    let room = store.room(&ROOM).unwrap();
    let members: Vec<Arc<Device>> = [light(1), light(2), light(3), lock_id(), thermostat_id()]
        .iter()
        .map(|id| store.device(id).unwrap())
        .collect();
    let expected = RoomSummary::build(&room, members.iter().map(|d| &**d));
    assert_eq!(*store.room_summary(&ROOM).unwrap(), expected);
    assert_eq!(expected.lights_on, 0);
}

#[tokio::test(start_paused = true)]
async fn partial_room_failure_names_only_failed_light() {
    let fx = Fixture::new(20);
    fx.executor().fail(light(2));

    let err = fx.dispatcher.set_room_power(&ROOM, false).await.unwrap_err();

    let (succeeded, failures) = match err {
        CoreError::PartialFailure {
            succeeded,
            failures,
        } => (succeeded, failures),
        other => panic!("expected PartialFailure, got {other:?}"),
    };
    assert_eq!(succeeded, vec![light(1), light(3)]);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].device, light(2));

    // Successes stay applied, the failure rolled back, and the room view
    // converges on that.
    assert_eq!(fx.brightness(light(1)), Percent::ZERO);
    assert_eq!(fx.brightness(light(2)), pct(90));
    let summary = fx.dispatcher.store().room_summary(&ROOM).unwrap();
    assert_eq!(summary.lights_on, 1);
    assert_eq!(summary.average_brightness, Some(pct(90)));
}

// ── Scenes & quick actions ──────────────────────────────────────────

#[tokio::test]
async fn scene_recall_refreshes_store() {
    let fx = Fixture::new(0);

    let outcome = fx
        .dispatcher
        .recall_scene(&SceneId(4))
        .unwrap()
        .outcome()
        .await
        .unwrap();

    assert_eq!(outcome, CommandOutcome::Confirmed);
    assert_eq!(fx.executor().refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(fx.executor().calls(), vec![Intent::RecallScene(SceneId(4))]);
}

#[tokio::test]
async fn quick_action_runs_and_unknown_scene_is_rejected() {
    let fx = Fixture::new(0);

    fx.dispatcher
        .run_quick_action(&QuickActionId(2))
        .unwrap()
        .outcome()
        .await
        .unwrap();
    assert_eq!(fx.executor().refreshes.load(Ordering::SeqCst), 1);

    assert!(matches!(
        fx.dispatcher.recall_scene(&SceneId(99)),
        Err(CoreError::Validation { .. })
    ));
}
