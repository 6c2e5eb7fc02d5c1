// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use ballsim_control::{BallSimService, Scenario};
use ballsim_core::{
    Callback, Envelope, Frame, Message, MessageKind, PreviewPoint, TargetFoundState,
    TaskCompletion, TimeStamp, Transport, Vec2,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// --- A TRANSPORT THAT RECORDS EVERYTHING AND STOPS AFTER N TICKS ---
#[derive(Default)]
struct RecordingTransport {
    subscribers: Mutex<HashMap<MessageKind, Vec<Callback>>>,
    published: Mutex<Vec<(u32, Message)>>,
    published_at: Mutex<Vec<Instant>>,
    ticks_left: AtomicUsize,
}

impl RecordingTransport {
    fn allow_ticks(&self, ticks: usize) {
        self.ticks_left.store(ticks, Ordering::SeqCst);
    }

    fn deliver(&self, message: Message, sender_stamp: u32) {
        let callbacks = self
            .subscribers
            .lock()
            .unwrap()
            .get(&message.kind())
            .cloned()
            .unwrap_or_default();
        for callback in callbacks {
            callback(Envelope::new(message, TimeStamp::now(), sender_stamp));
        }
    }

    fn subscriber_count(&self, kind: MessageKind) -> usize {
        self.subscribers
            .lock()
            .unwrap()
            .get(&kind)
            .map_or(0, Vec::len)
    }

    fn take_published(&self) -> Vec<(u32, Message)> {
        std::mem::take(&mut *self.published.lock().unwrap())
    }

    fn first_publish(&self) -> Option<Instant> {
        self.published_at.lock().unwrap().first().copied()
    }
}

impl Transport for RecordingTransport {
    fn publish(&self, message: Message, _sent: TimeStamp, sender_stamp: u32) {
        self.published.lock().unwrap().push((sender_stamp, message));
        self.published_at.lock().unwrap().push(Instant::now());
    }

    fn subscribe(&self, kind: MessageKind, callback: Callback) {
        self.subscribers
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push(callback);
    }

    fn is_running(&self) -> bool {
        self.ticks_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn fast(scenario: Scenario) -> Scenario {
    Scenario {
        startup_delay_ms: 0,
        period_ms: 1,
        ..scenario
    }
}

fn agent_at(x: f32, y: f32) -> Message {
    Message::Frame(Frame::at(Vec2::new(x, y), 0.0))
}

fn obstacle_at(distance: f32) -> Message {
    Message::PreviewPoint(PreviewPoint {
        azimuth_angle: 0.0,
        distance,
    })
}

fn arena_frame(x: f32, y: f32) -> Message {
    Message::Frame(Frame::at(Vec2::new(x, y), 1.0))
}

fn task_done() -> Message {
    Message::TaskCompletion(TaskCompletion { completed: true })
}

#[test]
fn test_room_visit_moves_target_and_reports_status() {
    // --- 1. ARRANGE ---
    let transport = Arc::new(RecordingTransport::default());
    let mut service = BallSimService::new(transport.clone(), fast(Scenario::room()))
        .expect("room preset is valid");
    transport.deliver(agent_at(1.0, -1.0), 0);
    transport.deliver(obstacle_at(2.0), 1);
    transport.allow_ticks(1);

    // --- 2. ACT ---
    let summary = service.run();

    // --- 3. ASSERT ---
    assert_eq!(summary.iterations, 1);
    assert_eq!(summary.found_count, 1);
    let published = transport.take_published();
    assert_eq!(published.len(), 3, "target, ball and status");
    assert_eq!(published[0], (1, arena_frame(-0.7, -1.0)));
    assert_eq!(published[1].0, 2);
    assert_eq!(
        published[2],
        (
            0,
            Message::TargetFoundState(TargetFoundState {
                target_found_count: 1,
                is_chpad_found: false
            })
        )
    );
}

#[test]
fn test_foreign_sender_stamps_are_ignored() {
    let transport = Arc::new(RecordingTransport::default());
    let service = BallSimService::new(transport.clone(), fast(Scenario::maze()))
        .expect("maze preset is valid");

    // Our own ball frame echoed back, and a preview point from the wrong node.
    transport.deliver(agent_at(0.7, 0.0), 2);
    transport.deliver(obstacle_at(0.5), 4);

    let observation = service.observed().snapshot();
    assert_eq!(observation.position.x, 0.0);
    assert!(!observation.has_distance_reading());

    transport.deliver(agent_at(0.7, 0.2), 0);
    transport.deliver(obstacle_at(0.5), 1);
    let observation = service.observed().snapshot();
    assert_eq!(observation.position.x, 0.7);
    assert_eq!(observation.position.y, 0.2);
    assert_eq!(observation.obstacle_distance, 0.5);
}

#[test]
fn test_completion_from_foreign_stamp_keeps_progress() {
    // --- 1. ARRANGE ---
    let transport = Arc::new(RecordingTransport::default());
    let scenario = fast(Scenario::maze().with_completion_gate(true));
    let mut service = BallSimService::new(transport.clone(), scenario).expect("valid");
    transport.deliver(agent_at(-0.65, 0.0), 0);
    transport.allow_ticks(1);
    assert_eq!(service.run().found_count, 1);

    // --- 2. ACT ---
    // Stamp 3 is one of our own target streams, never the mission supervisor.
    transport.deliver(task_done(), 3);
    transport.allow_ticks(1);
    let summary = service.run();

    // --- 3. ASSERT ---
    assert!(!service.observed().snapshot().task_completed);
    assert_eq!(summary.found_count, 1);
    let published = transport.take_published();
    assert_eq!(published.last().map(|(stamp, _)| *stamp), Some(0));
    assert_eq!(
        published.last().map(|(_, message)| *message),
        Some(Message::TargetFoundState(TargetFoundState {
            target_found_count: 1,
            is_chpad_found: false
        }))
    );
}

#[test]
fn test_completion_subscription_follows_gate() {
    let plain = Arc::new(RecordingTransport::default());
    BallSimService::new(plain.clone(), Scenario::maze()).expect("valid");
    assert_eq!(plain.subscriber_count(MessageKind::TaskCompletion), 0);
    assert_eq!(plain.subscriber_count(MessageKind::Frame), 1);
    assert_eq!(plain.subscriber_count(MessageKind::PreviewPoint), 1);

    let gated = Arc::new(RecordingTransport::default());
    BallSimService::new(gated.clone(), Scenario::maze().with_completion_gate(true))
        .expect("valid");
    assert_eq!(gated.subscriber_count(MessageKind::TaskCompletion), 1);
}

#[test]
fn test_completion_resets_found_count() {
    // --- 1. ARRANGE ---
    let transport = Arc::new(RecordingTransport::default());
    let scenario = fast(Scenario::maze().with_completion_gate(true));
    let mut service = BallSimService::new(transport.clone(), scenario).expect("valid");

    transport.deliver(agent_at(-0.65, 0.0), 0);
    transport.allow_ticks(1);
    assert_eq!(service.run().found_count, 1);
    let retired = transport.take_published();
    assert_eq!(retired[0], (1, arena_frame(-5.0, -5.0)));

    // --- 2. ACT ---
    transport.deliver(agent_at(0.0, 0.0), 0);
    transport.deliver(task_done(), 0);
    transport.allow_ticks(1);
    let summary = service.run();

    // --- 3. ASSERT ---
    assert_eq!(summary.found_count, 0);
    let restored = transport.take_published();
    assert_eq!(restored[0], (1, arena_frame(-0.65, 0.0)));
    assert_eq!(service.engine().timer().ticks(), 1);
}

#[test]
fn test_startup_delay_runs_once_before_first_tick() {
    // --- 1. ARRANGE ---
    let delay = Duration::from_millis(200);
    let transport = Arc::new(RecordingTransport::default());
    let scenario = Scenario {
        startup_delay_ms: 200,
        period_ms: 1,
        ..Scenario::line()
    };
    let mut service = BallSimService::new(transport.clone(), scenario).expect("valid");
    transport.allow_ticks(5);

    // --- 2. ACT ---
    let started = Instant::now();
    let summary = service.run();
    let elapsed = started.elapsed();

    // --- 3. ASSERT ---
    assert_eq!(summary.iterations, 5);
    let first = transport.first_publish().expect("ticks published");
    assert!(
        first.duration_since(started) >= delay,
        "published before the startup delay elapsed"
    );
    // Five 1 ms ticks on top of one delay; a per-tick delay would take a second.
    assert!(elapsed < delay * 3, "delay repeated: {elapsed:?}");
}

#[test]
fn test_stopped_session_runs_no_tick() {
    let transport = Arc::new(RecordingTransport::default());
    let mut service =
        BallSimService::new(transport.clone(), fast(Scenario::line())).expect("valid");

    let summary = service.run();

    assert_eq!(summary.iterations, 0);
    assert!(transport.take_published().is_empty());
}

#[test]
fn test_invalid_scenario_is_rejected_before_subscribing() {
    let transport = Arc::new(RecordingTransport::default());
    let mut scenario = Scenario::maze();
    scenario.period_ms = 0;

    assert!(BallSimService::new(transport.clone(), scenario).is_err());
    assert_eq!(transport.subscriber_count(MessageKind::Frame), 0);
}
