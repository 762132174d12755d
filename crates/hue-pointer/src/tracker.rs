//! The per-frame tracking loop and its state machine.
//!
//! Single-threaded and cooperative: capture → segment → localize → map →
//! move-pointer, strictly in sequence, once per iteration. The only
//! suspension point is the blocking capture call; cancellation is polled
//! once per iteration, never mid-frame.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use hue_pointer_core::{
    hsv_from_rgb, Centroid, FrameSegmenter, MarkerLocalizer, SegmentParams,
};

use crate::calibrate::{CalibrationSet, Calibrator, CalibratorParams, MarkerSlot};
use crate::io::{CaptureError, ControlEvent, ControlInput, FramePreview, FrameSource, PointerDevice};
use crate::mapper::{CoordinateMapper, MapperParams, Resolution, ScreenPoint};
use crate::store::{CalibrationStore, StoreError};

/// Externally observable loop state. `Stopped` is terminal; there is no
/// resume.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrackerState {
    Calibrating,
    Tracking,
    Stopped,
}

/// Fatal loop errors. Marker-not-detected is *not* here: an empty
/// segmentation simply produces an invalid centroid and no movement that
/// frame.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Loop configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoopParams {
    #[serde(default)]
    pub calibrator: CalibratorParams,
    #[serde(default)]
    pub segment: SegmentParams,
    #[serde(default)]
    pub mapper: MapperParams,
    pub screen: Resolution,
    /// Frame cap for offline and scripted runs; `None` runs until the
    /// termination signal or a capture failure.
    #[serde(default)]
    pub max_frames: Option<u64>,
}

impl LoopParams {
    pub fn for_screen(screen: Resolution) -> Self {
        Self {
            calibrator: CalibratorParams::default(),
            segment: SegmentParams::default(),
            mapper: MapperParams::default(),
            screen,
            max_frames: None,
        }
    }
}

/// Mutable per-session context: the frozen calibration plus the smoothing
/// memory per marker. Passed explicitly through the pipeline, never a
/// global.
#[derive(Clone, Copy, Debug)]
pub struct TrackingState {
    pub calibration: CalibrationSet,
    pub last_point: [Option<ScreenPoint>; 2],
    pub last_centroid: [Centroid; 2],
}

impl TrackingState {
    pub fn new(calibration: CalibrationSet) -> Self {
        Self {
            calibration,
            last_point: [None; 2],
            last_centroid: [Centroid::none(); 2],
        }
    }
}

/// Orchestrates calibration and per-frame tracking over the collaborator
/// seams.
pub struct TrackingLoop<S, P, D, I, C>
where
    S: FrameSource,
    P: FramePreview,
    D: PointerDevice,
    I: ControlInput,
    C: CalibrationStore,
{
    params: LoopParams,
    source: S,
    preview: P,
    pointer: D,
    input: I,
    store: C,
    segmenter: FrameSegmenter,
    localizer: MarkerLocalizer,
    state: TrackerState,
    tracking: Option<TrackingState>,
    frames: u64,
}

impl<S, P, D, I, C> TrackingLoop<S, P, D, I, C>
where
    S: FrameSource,
    P: FramePreview,
    D: PointerDevice,
    I: ControlInput,
    C: CalibrationStore,
{
    /// Build the loop. The store is consulted once: a well-formed persisted
    /// set starts the loop in `Tracking`, anything else in `Calibrating`.
    pub fn new(params: LoopParams, source: S, preview: P, pointer: D, input: I, store: C) -> Self {
        let (state, tracking) = match store.load() {
            Some(set) => {
                info!("calibration loaded, starting in tracking state");
                (TrackerState::Tracking, Some(TrackingState::new(set)))
            }
            None => {
                info!("no usable calibration, starting in calibrating state");
                (TrackerState::Calibrating, None)
            }
        };
        let segmenter = FrameSegmenter::new(params.segment);

        Self {
            params,
            source,
            preview,
            pointer,
            input,
            store,
            segmenter,
            localizer: MarkerLocalizer::new(),
            state,
            tracking,
            frames: 0,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn tracking_state(&self) -> Option<&TrackingState> {
        self.tracking.as_ref()
    }

    /// Frames processed while in `Tracking`.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Drive the state machine until `Stopped`.
    ///
    /// A `CaptureError` from either phase stops the loop and surfaces as
    /// `Err`; a save failure after calibration is only warned about, since
    /// the current session can still track with the in-memory set.
    pub fn run(&mut self) -> Result<(), TrackError> {
        while self.state != TrackerState::Stopped {
            match self.state {
                TrackerState::Calibrating => {
                    if let Err(err) = self.calibrate() {
                        self.state = TrackerState::Stopped;
                        return Err(err);
                    }
                }
                TrackerState::Tracking => {
                    if let Err(err) = self.step() {
                        self.state = TrackerState::Stopped;
                        return Err(err);
                    }
                }
                TrackerState::Stopped => {}
            }
        }
        Ok(())
    }

    fn calibrate(&mut self) -> Result<(), TrackError> {
        let calibrator = Calibrator::new(self.params.calibrator.clone());
        let set = calibrator.run(&mut self.source, &mut self.preview, &mut self.input)?;

        if let Err(err) = self.store.save(&set) {
            warn!("calibration save failed ({err}); tracking continues this session only");
        }

        self.tracking = Some(TrackingState::new(set));
        self.state = TrackerState::Tracking;
        info!("calibration complete, tracking");
        Ok(())
    }

    /// One tracking iteration.
    fn step(&mut self) -> Result<(), TrackError> {
        // Termination signal, checked once per iteration.
        while let Some(event) = self.input.poll() {
            match event {
                ControlEvent::Advance => {
                    info!("termination signal after {} frames", self.frames);
                    self.state = TrackerState::Stopped;
                    return Ok(());
                }
                ControlEvent::Adjust(_) => {
                    debug!("ignoring bound adjustment outside calibration");
                }
            }
        }

        if let Some(cap) = self.params.max_frames {
            if self.frames >= cap {
                info!("frame cap {cap} reached");
                self.state = TrackerState::Stopped;
                return Ok(());
            }
        }

        let frame = self.source.capture_frame()?;
        let camera = Resolution::new(frame.width as u32, frame.height as u32);
        let mapper = CoordinateMapper::new(self.params.mapper, camera, self.params.screen);
        let hsv = hsv_from_rgb(&frame);

        let Self {
            segmenter,
            localizer,
            pointer,
            tracking,
            ..
        } = self;
        let Some(st) = tracking.as_mut() else {
            // Unreachable while the state machine is respected; treat a
            // missing context as an immediate stop rather than panicking.
            warn!("tracking step without calibration context");
            self.state = TrackerState::Stopped;
            return Ok(());
        };

        let mut pointer_target = None;
        for slot in MarkerSlot::ALL {
            let idx = slot.index();
            let seg = segmenter.segment(&hsv.view(), st.calibration.model(slot));
            let centroid = localizer.localize(&seg.regions);
            let mapped = mapper.map(centroid, st.last_point[idx]);

            st.last_centroid[idx] = centroid;
            if let Some(point) = mapped {
                st.last_point[idx] = Some(point);
            }
            if slot == MarkerSlot::A {
                pointer_target = mapped;
            }

            debug!(
                "frame {} slot {slot:?}: centroid valid={} regions={}",
                self.frames,
                centroid.valid,
                seg.regions.len()
            );
        }

        // Marker A drives the pointer; marker B is reserved as a second
        // control signal and only has its position recorded.
        if let Some(point) = pointer_target {
            pointer.move_to(point.x, point.y);
        }

        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::NullPreview;
    use hue_pointer_core::{ColorModel, RgbFrame};
    use std::collections::VecDeque;

    struct ScriptedSource {
        frames: VecDeque<RgbFrame>,
    }

    impl FrameSource for ScriptedSource {
        fn capture_frame(&mut self) -> Result<RgbFrame, CaptureError> {
            self.frames
                .pop_front()
                .ok_or_else(|| CaptureError::new("out of frames"))
        }
    }

    #[derive(Default)]
    struct RecordingPointer {
        moves: Vec<(i32, i32)>,
    }

    impl PointerDevice for RecordingPointer {
        fn move_to(&mut self, x: i32, y: i32) {
            self.moves.push((x, y));
        }
    }

    struct ScriptedInput {
        events: VecDeque<ControlEvent>,
    }

    impl ControlInput for ScriptedInput {
        fn poll(&mut self) -> Option<ControlEvent> {
            self.events.pop_front()
        }
    }

    struct MemoryStore {
        set: Option<CalibrationSet>,
        saved: bool,
        fail_save: bool,
    }

    impl MemoryStore {
        fn empty() -> Self {
            Self {
                set: None,
                saved: false,
                fail_save: false,
            }
        }

        fn with(set: CalibrationSet) -> Self {
            Self {
                set: Some(set),
                saved: false,
                fail_save: false,
            }
        }
    }

    impl CalibrationStore for MemoryStore {
        fn load(&self) -> Option<CalibrationSet> {
            self.set
        }

        fn save(&mut self, set: &CalibrationSet) -> Result<(), StoreError> {
            if self.fail_save {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.set = Some(*set);
            self.saved = true;
            Ok(())
        }
    }

    fn red_calibration() -> CalibrationSet {
        CalibrationSet::new(
            ColorModel::from_bounds([0, 100, 100], [10, 255, 255]),
            ColorModel::from_bounds([100, 100, 100], [140, 255, 255]),
        )
    }

    /// 64x48 gray frame with a red 6x6 blob whose centroid is (cx, cy).
    fn frame_with_red_blob(cx: usize, cy: usize) -> RgbFrame {
        let mut frame = RgbFrame::filled(64, 48, [40, 40, 40]);
        for y in cy - 2..=cy + 3 {
            for x in cx - 2..=cx + 3 {
                frame.set_pixel(x, y, [255, 0, 0]);
            }
        }
        frame
    }

    fn params(max_frames: Option<u64>) -> LoopParams {
        let mut p = LoopParams::for_screen(Resolution::new(640, 480));
        p.mapper.smoothing = 1.0;
        p.max_frames = max_frames;
        p
    }

    #[test]
    fn missing_calibration_starts_in_calibrating() {
        let tracker = TrackingLoop::new(
            params(Some(0)),
            ScriptedSource {
                frames: VecDeque::new(),
            },
            NullPreview,
            RecordingPointer::default(),
            ScriptedInput {
                events: VecDeque::new(),
            },
            MemoryStore::empty(),
        );
        assert_eq!(tracker.state(), TrackerState::Calibrating);
    }

    #[test]
    fn persisted_calibration_starts_in_tracking() {
        let tracker = TrackingLoop::new(
            params(Some(0)),
            ScriptedSource {
                frames: VecDeque::new(),
            },
            NullPreview,
            RecordingPointer::default(),
            ScriptedInput {
                events: VecDeque::new(),
            },
            MemoryStore::with(red_calibration()),
        );
        assert_eq!(tracker.state(), TrackerState::Tracking);
    }

    #[test]
    fn tracking_drives_pointer_from_marker_a() {
        let frames = VecDeque::from(vec![frame_with_red_blob(16, 12), frame_with_red_blob(32, 24)]);
        let mut tracker = TrackingLoop::new(
            params(Some(2)),
            ScriptedSource { frames },
            NullPreview,
            RecordingPointer::default(),
            ScriptedInput {
                events: VecDeque::new(),
            },
            MemoryStore::with(red_calibration()),
        );

        tracker.run().expect("run");
        assert_eq!(tracker.state(), TrackerState::Stopped);
        assert_eq!(tracker.frames(), 2);
        // Blob centroids (16.5, 12.5) and (32.5, 24.5) at 10x scale.
        assert_eq!(tracker.pointer.moves, vec![(165, 125), (325, 245)]);

        let st = tracker.tracking_state().unwrap();
        assert!(st.last_centroid[0].valid);
        // No blue marker anywhere: slot B stays invalid and never produces
        // a point.
        assert!(!st.last_centroid[1].valid);
        assert_eq!(st.last_point[1], None);
    }

    #[test]
    fn lost_marker_keeps_last_pointer_position() {
        let frames = VecDeque::from(vec![
            frame_with_red_blob(16, 12),
            RgbFrame::filled(64, 48, [40, 40, 40]),
        ]);
        let mut tracker = TrackingLoop::new(
            params(Some(2)),
            ScriptedSource { frames },
            NullPreview,
            RecordingPointer::default(),
            ScriptedInput {
                events: VecDeque::new(),
            },
            MemoryStore::with(red_calibration()),
        );

        tracker.run().expect("run");
        // Only the first frame moved the pointer.
        assert_eq!(tracker.pointer.moves, vec![(165, 125)]);
        let st = tracker.tracking_state().unwrap();
        assert_eq!(st.last_point[0], Some(ScreenPoint { x: 165, y: 125 }));
        assert!(!st.last_centroid[0].valid);
    }

    #[test]
    fn termination_signal_stops_before_capture() {
        let mut tracker = TrackingLoop::new(
            params(None),
            ScriptedSource {
                frames: VecDeque::new(),
            },
            NullPreview,
            RecordingPointer::default(),
            ScriptedInput {
                events: VecDeque::from(vec![ControlEvent::Advance]),
            },
            MemoryStore::with(red_calibration()),
        );

        tracker.run().expect("run");
        assert_eq!(tracker.state(), TrackerState::Stopped);
        assert_eq!(tracker.frames(), 0);
        assert!(tracker.pointer.moves.is_empty());
    }

    #[test]
    fn capture_failure_is_fatal_and_stops() {
        let mut tracker = TrackingLoop::new(
            params(None),
            ScriptedSource {
                frames: VecDeque::new(),
            },
            NullPreview,
            RecordingPointer::default(),
            ScriptedInput {
                events: VecDeque::new(),
            },
            MemoryStore::with(red_calibration()),
        );

        let err = tracker.run().unwrap_err();
        assert!(matches!(err, TrackError::Capture(_)));
        assert_eq!(tracker.state(), TrackerState::Stopped);
    }

    #[test]
    fn calibration_phase_saves_then_tracks() {
        // Two calibration slots (advance immediately per slot), then one
        // tracked frame before the cap stops the run.
        let frames = VecDeque::from(vec![
            frame_with_red_blob(16, 12),
            frame_with_red_blob(16, 12),
            frame_with_red_blob(16, 12),
        ]);
        let mut loop_params = params(Some(1));
        loop_params.calibrator.max_iterations = Some(1);
        let mut tracker = TrackingLoop::new(
            loop_params,
            ScriptedSource { frames },
            NullPreview,
            RecordingPointer::default(),
            ScriptedInput {
                events: VecDeque::new(),
            },
            MemoryStore::empty(),
        );

        assert_eq!(tracker.state(), TrackerState::Calibrating);
        tracker.run().expect("run");
        assert_eq!(tracker.state(), TrackerState::Stopped);
        assert!(tracker.store.saved);
        // The committed models are all-zero (no adjustments were scripted),
        // which is valid and simply never matches the gray frame.
        assert_eq!(tracker.frames(), 1);
        assert!(tracker.pointer.moves.is_empty());
    }

    #[test]
    fn save_failure_warns_but_session_tracks() {
        let frames = VecDeque::from(vec![
            frame_with_red_blob(16, 12),
            frame_with_red_blob(16, 12),
            frame_with_red_blob(16, 12),
        ]);
        let mut loop_params = params(Some(1));
        loop_params.calibrator.max_iterations = Some(1);
        let mut store = MemoryStore::empty();
        store.fail_save = true;
        let mut tracker = TrackingLoop::new(
            loop_params,
            ScriptedSource { frames },
            NullPreview,
            RecordingPointer::default(),
            ScriptedInput {
                events: VecDeque::new(),
            },
            store,
        );

        tracker.run().expect("save failure must not abort the session");
        assert_eq!(tracker.frames(), 1);
    }
}
