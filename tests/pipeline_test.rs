use std::cell::RefCell;
use std::collections::VecDeque;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use bodytrack_rs::sensor::SensorKind;
use bodytrack_rs::sensor::adapters::azure_kinect::raw as azure_raw;
use bodytrack_rs::sensor::adapters::kinect_v2::raw;
use bodytrack_rs::sensor::adapters::{
    AzureKinectAdapter, CaptureStream, KinectV2Adapter, ReplayReader,
};
use bodytrack_rs::skeleton::{BodyIndexFrame, ImageSize, JointKind, Skeleton, TrackingId};
use bodytrack_rs::tracking::{ActiveSlots, UserCount};
use bodytrack_rs::{DriverConfig, SensorDriver, SensorListener};

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Sensor(bool),
    Users(usize),
    Skeleton(TrackingId),
    BodyIndex(ImageSize),
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<Seen>>>);

impl Recorder {
    fn take(&self) -> Vec<Seen> {
        self.0.borrow_mut().drain(..).collect()
    }

    fn contains(&self, seen: &Seen) -> bool {
        self.0.borrow().contains(seen)
    }
}

impl SensorListener for Recorder {
    fn sensor_found(&mut self, found: bool) {
        self.0.borrow_mut().push(Seen::Sensor(found));
    }

    fn users_found(&mut self, count: usize) {
        self.0.borrow_mut().push(Seen::Users(count));
    }

    fn skeleton_update(&mut self, skeleton: &Skeleton, _slots: &ActiveSlots) {
        self.0.borrow_mut().push(Seen::Skeleton(skeleton.tracking_id));
    }

    fn body_index_update(&mut self, frame: &BodyIndexFrame, _slots: &ActiveSlots) {
        self.0.borrow_mut().push(Seen::BodyIndex(frame.size()));
    }
}

fn write_settings(file_name: &str, plugin_type: &str) -> PathBuf {
    let path = env::temp_dir().join(format!("{}-{}", std::process::id(), file_name));
    let xml = format!(
        "<configuration><plugins><plugin><name>kinect2</name>\
         <type>{plugin_type}</type></plugin></plugins></configuration>"
    );
    fs::write(&path, xml).unwrap();
    path
}

fn two_bodies(id_a: u64, x_a: f32, id_b: u64, x_b: f32) -> raw::NativeBodyFrame {
    raw::NativeBodyFrame::empty()
        .with_body(
            0,
            raw::NativeBody::tracked(id_a).with_joint(JointKind::SpineBase, x_a, 0.9, 2.0),
        )
        .with_body(
            1,
            raw::NativeBody::tracked(id_b).with_joint(JointKind::SpineBase, x_b, 0.9, 2.0),
        )
}

fn one_body(id: u64, x: f32) -> raw::NativeBodyFrame {
    raw::NativeBodyFrame::empty().with_body(
        0,
        raw::NativeBody::tracked(id).with_joint(JointKind::SpineBase, x, 0.9, 2.0),
    )
}

#[test]
fn test_single_user_session_over_replayed_frames() {
    let settings = write_settings("bodytrack-single.xml", "VS.Plugins.Kinect2Plugin");
    let recording = vec![
        // Frames 1-2: A stands off-center, B near the centerline.
        two_bodies(10, 0.4, 11, -0.1),
        two_bodies(10, 0.4, 11, -0.1),
        // Frames 3-4: B steps out of view.
        one_body(10, 0.4),
        one_body(10, 0.4),
    ];
    let mut handout = Some(recording);
    let recorder = Recorder::default();
    let mut driver = SensorDriver::new(
        DriverConfig {
            settings_path: settings.clone(),
            users: UserCount::One,
        },
        move |_| {
            let frames = handout.take().unwrap_or_default();
            Box::new(KinectV2Adapter::new(Box::new(ReplayReader::new(frames))))
        },
    );
    driver.subscribe(Box::new(recorder.clone()));

    driver.start();
    assert_eq!(recorder.take(), vec![Seen::Sensor(false), Seen::Users(0)]);

    driver.fixed_tick();
    assert!(driver.is_ready());
    assert_eq!(driver.sensor_kind(), SensorKind::KinectV2);
    assert_eq!(driver.body_index_size(), Some(ImageSize::new(512, 424)));

    // Frame 1: B wins the role, standing nearest the centerline.
    driver.frame_tick();
    assert_eq!(
        recorder.take(),
        vec![Seen::Sensor(true), Seen::Users(1), Seen::Skeleton(11)]
    );
    assert!(driver.is_player_one(11));
    assert!(driver.is_player_one_index(1));

    // Frame 2: same pair, role unchanged, only B is broadcast.
    driver.frame_tick();
    assert_eq!(recorder.take(), vec![Seen::Skeleton(11)]);

    // Frame 3: B vanished. The role holds for this frame; no user is active.
    driver.frame_tick();
    assert_eq!(recorder.take(), vec![Seen::Users(0)]);
    assert!(driver.is_player_one(11));

    // Frame 4: B stayed gone, so the role re-derives to A.
    driver.frame_tick();
    assert_eq!(recorder.take(), vec![Seen::Users(1), Seen::Skeleton(10)]);
    assert!(driver.is_player_one(10));

    // Recording ran dry: the buffered capture repeats and nothing is
    // re-dispatched.
    driver.frame_tick();
    driver.frame_tick();
    assert_eq!(recorder.take(), vec![]);

    // Closing reports the outage on the next tick.
    driver.close_sensor();
    driver.frame_tick();
    assert_eq!(recorder.take(), vec![Seen::Sensor(false)]);

    let _ = fs::remove_file(settings);
}

#[test]
fn test_two_user_session_assigns_sides_and_follows_crossover() {
    let recording = vec![
        // Frame 1: L on the left, R on the right.
        two_bodies(20, -0.8, 21, 0.6),
        // Frame 2: they crossed over.
        two_bodies(20, 0.7, 21, -0.5),
        // Frame 3: only R remains.
        one_body(21, -0.5),
    ];
    let mut handout = Some(recording);
    let recorder = Recorder::default();
    let mut driver = SensorDriver::new(
        DriverConfig {
            // No settings file: the default backend is used.
            settings_path: PathBuf::from("/nonexistent/VSClientSettings.xml"),
            users: UserCount::Two,
        },
        move |_| {
            let frames = handout.take().unwrap_or_default();
            Box::new(KinectV2Adapter::new(Box::new(ReplayReader::new(frames))))
        },
    );
    driver.subscribe(Box::new(recorder.clone()));

    driver.start();
    driver.fixed_tick();
    assert_eq!(driver.sensor_kind(), SensorKind::KinectV2);
    recorder.take();

    // Frame 1: the right-most body is player one, the left-most player two.
    driver.frame_tick();
    assert_eq!(
        recorder.take(),
        vec![
            Seen::Sensor(true),
            Seen::Users(2),
            Seen::Skeleton(20),
            Seen::Skeleton(21),
        ]
    );
    assert!(driver.is_player_one(21));
    assert!(driver.is_player_two(20));

    // Frame 2: the roles follow the physical sides across the crossover.
    driver.frame_tick();
    assert_eq!(recorder.take(), vec![Seen::Skeleton(20), Seen::Skeleton(21)]);
    assert!(driver.is_player_one(20));
    assert!(driver.is_player_two(21));

    // Frame 3: one user left the view; both bindings persist.
    driver.frame_tick();
    assert_eq!(recorder.take(), vec![Seen::Users(1), Seen::Skeleton(21)]);
    assert!(driver.is_player_one(20));
    assert!(driver.is_player_two(21));
}

/// Capture stream that blocks until a capture is queued or the script is
/// marked finished, the way the device worker sees the real SDK.
#[derive(Clone, Default)]
struct BlockingScript {
    captures: Arc<Mutex<VecDeque<azure_raw::NativeCapture>>>,
    finished: Arc<AtomicBool>,
}

impl BlockingScript {
    fn push(&self, capture: azure_raw::NativeCapture) {
        self.captures.lock().unwrap().push_back(capture);
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

struct BlockingStream(BlockingScript);

impl CaptureStream for BlockingStream {
    fn open(&mut self) -> bool {
        true
    }

    fn close(&mut self) {}

    fn next_capture(&mut self) -> Option<azure_raw::NativeCapture> {
        loop {
            if let Some(capture) = self.0.captures.lock().unwrap().pop_front() {
                return Some(capture);
            }
            if self.0.finished.load(Ordering::SeqCst) {
                return None;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

#[test]
fn test_azure_session_pushes_frames_through_the_driver() {
    let settings = write_settings("bodytrack-azure.xml", "VS.Plugins.AzureKinectPlugin");
    let script = BlockingScript::default();
    let size = ImageSize::new(
        azure_raw::BODY_INDEX_MAP_WIDTH,
        azure_raw::BODY_INDEX_MAP_HEIGHT,
    );

    let factory_script = script.clone();
    let recorder = Recorder::default();
    let mut driver = SensorDriver::new(
        DriverConfig {
            settings_path: settings.clone(),
            users: UserCount::One,
        },
        move |kind| match kind {
            SensorKind::AzureKinect => Box::new(AzureKinectAdapter::new(Box::new(
                BlockingStream(factory_script.clone()),
            ))),
            other => panic!("unexpected backend {other:?}"),
        },
    );
    driver.subscribe(Box::new(recorder.clone()));

    driver.start();
    driver.fixed_tick();
    assert_eq!(driver.sensor_kind(), SensorKind::AzureKinect);
    assert!(driver.is_ready());
    assert_eq!(driver.body_index_size(), Some(size));
    recorder.take();

    let mut map = vec![azure_raw::BACKGROUND; size.pixel_count()];
    map[0] = 0;
    script.push(
        azure_raw::NativeCapture::new(vec![
            azure_raw::NativeBody::new(5).with_joint_mm(azure_raw::joint_id::PELVIS, 500.0, -900.0, 2000.0),
        ])
        .with_body_index_map(map),
    );

    // The worker delivers asynchronously; tick until both frames landed.
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline
        && !(recorder.contains(&Seen::Skeleton(5)) && recorder.contains(&Seen::BodyIndex(size)))
    {
        driver.frame_tick();
        thread::sleep(Duration::from_millis(2));
    }

    assert_eq!(
        recorder.take(),
        vec![
            Seen::Sensor(true),
            Seen::Users(1),
            Seen::Skeleton(5),
            Seen::BodyIndex(size),
        ]
    );
    assert!(driver.is_player_one(5));

    script.finish();
    driver.close_sensor();
    driver.frame_tick();
    assert_eq!(recorder.take(), vec![Seen::Sensor(false)]);

    let _ = fs::remove_file(settings);
}
