mod common;

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;

use common::{cleanup, config, frame, read_wav, temp_wav, FailingSource, HeaderFaultFile, RecordingDelegate};
use uart_capture_core::storage::metadata::read_metadata;
use uart_capture_core::{
    start_capture, ByteSource, CaptureController, CaptureError, CaptureState, CaptureStatus, ScriptedSource,
    StreamSource, WavAccumulator, MAGIC,
};

#[test]
fn three_sample_frame_lands_in_file() {
    let path = temp_wav("three");
    let mut source = ScriptedSource::new()
        .bytes(MAGIC)
        .bytes([0x03, 0x00])
        .bytes([0x01, 0x00, 0x02, 0x00, 0x03, 0x00]);

    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    let status = controller.run(&mut source).unwrap();

    assert_eq!(status.samples_written, 3);
    assert_eq!(status.status, CaptureStatus::Failed(CaptureError::SourceClosed));
    let (header, samples) = read_wav(&path);
    assert_eq!(samples, vec![1, 2, 3]);
    assert_eq!(header.data_size, 6);

    cleanup(&path);
}

#[test]
fn samples_written_is_sum_of_frames_in_arrival_order() {
    let path = temp_wav("sum");
    let frames: Vec<Vec<i16>> = vec![
        vec![1, 2, 3],
        vec![],
        (10..15).collect(),
        (100..356).collect(),
        vec![-1, -2],
    ];
    let mut source = ScriptedSource::new().bytes([0x00, 0x42, 0x13]);
    for f in &frames {
        source.push_bytes(frame(f));
    }

    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    let status = controller.run(&mut source).unwrap();

    let expected: Vec<i16> = frames.concat();
    assert_eq!(status.samples_written, expected.len() as u64);
    assert_eq!(status.diagnostics.frames_accumulated, 4);
    assert_eq!(status.diagnostics.empty_frames, 1);

    let (header, samples) = read_wav(&path);
    assert_eq!(header.data_size as u64, status.samples_written * 2);
    assert_eq!(header.riff_size, 36 + header.data_size);
    assert_eq!(samples, expected);

    cleanup(&path);
}

#[test]
fn truncated_payload_is_dropped_and_next_frame_kept() {
    let path = temp_wav("truncated");
    let mut source = ScriptedSource::new()
        .bytes(frame(&[1, 2, 3, 4]))
        .bytes(MAGIC)
        .bytes([0x06, 0x00])
        .bytes([0xDE, 0xAD, 0xBE, 0xEF, 0x01])
        .idle()
        .bytes(frame(&[10, 20]));

    let delegate = Arc::new(RecordingDelegate::new());
    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    controller.set_delegate(delegate.clone());
    let status = controller.run(&mut source).unwrap();

    assert_eq!(status.samples_written, 6);
    assert_eq!(status.diagnostics.short_reads, 1);
    assert_eq!(
        delegate.resyncs.lock().as_slice(),
        &[CaptureError::ShortRead { expected: 12, received: 5 }]
    );
    let (_, samples) = read_wav(&path);
    assert_eq!(samples, vec![1, 2, 3, 4, 10, 20]);

    cleanup(&path);
}

#[test]
fn marker_inside_dropped_payload_starts_a_frame() {
    // Known protocol weakness: without escaping, marker bytes inside payload
    // data being scanned for sync are taken as a real frame boundary.
    let path = temp_wav("false_positive");
    let mut source = ScriptedSource::new()
        .bytes(MAGIC)
        .bytes([0x04, 0x00, 0xAA, 0xBB])
        .idle()
        .bytes([0x00, 0x11])
        .bytes(MAGIC)
        .bytes([0x01, 0x00, 0x2A, 0x00]);

    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    let status = controller.run(&mut source).unwrap();

    assert_eq!(status.samples_written, 1);
    let (_, samples) = read_wav(&path);
    assert_eq!(samples, vec![42]);

    cleanup(&path);
}

#[test]
fn source_closing_mid_frame_keeps_earlier_frames() {
    let path = temp_wav("closed_mid_frame");
    let mut source = ScriptedSource::new()
        .bytes(frame(&[5, 6, 7, 8]))
        .bytes(MAGIC)
        .bytes(100u16.to_le_bytes())
        .bytes([0x11; 10]);

    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    let status = controller.run(&mut source).unwrap();

    assert_eq!(status.status, CaptureStatus::Failed(CaptureError::SourceClosed));
    assert_eq!(status.samples_written, 4);
    assert_eq!(controller.state(), CaptureState::Failed(CaptureError::SourceClosed));

    let (header, samples) = read_wav(&path);
    assert_eq!(header.data_size, 8);
    assert_eq!(samples, vec![5, 6, 7, 8]);
    assert_eq!(fs::metadata(&path).unwrap().len(), 44 + 8);

    cleanup(&path);
}

#[test]
fn stops_when_target_reached() {
    let path = temp_wav("target");
    // 8 Hz for half a second is 4 samples; whole frames are kept.
    let mut source = ScriptedSource::new()
        .bytes(frame(&[1, 2, 3]))
        .bytes(frame(&[4, 5, 6]))
        .bytes(frame(&[7, 8, 9]));

    let mut controller = CaptureController::new(config(&path, 8, Some(0.5))).unwrap();
    let status = controller.run(&mut source).unwrap();

    assert!(status.is_done());
    assert_eq!(status.samples_written, 6);
    assert_relative_eq!(status.elapsed_secs, 0.75);
    assert_eq!(source.remaining_bytes(), 12);

    let (header, samples) = read_wav(&path);
    assert_eq!(samples, vec![1, 2, 3, 4, 5, 6]);
    assert_relative_eq!(header.duration_secs(), 0.75);

    cleanup(&path);
}

#[test]
fn cancellation_between_frames_leaves_valid_file() {
    let path = temp_wav("cancel");
    let mut source = ScriptedSource::new();
    for i in 0..5 {
        source.push_bytes(frame(&[i, i]));
    }

    let delegate = Arc::new(RecordingDelegate::cancelling_after(2));
    let mut controller = CaptureController::new(config(&path, 8000, None)).unwrap();
    delegate.attach(controller.handle());
    controller.set_delegate(delegate.clone());
    let status = controller.run(&mut source).unwrap();

    assert!(status.is_cancelled());
    assert_eq!(status.samples_written, 4);
    assert_eq!(controller.state(), CaptureState::Cancelled);
    assert_eq!(delegate.states.lock().last(), Some(&CaptureState::Cancelled));

    let (header, samples) = read_wav(&path);
    assert_eq!(samples, vec![0, 0, 1, 1]);
    assert_eq!(header.data_size, 8);
    assert_relative_eq!(header.duration_secs(), 4.0 / 8000.0);
    assert_eq!(status.checksum.as_ref().map(|c| c.len()), Some(64));

    cleanup(&path);
}

#[test]
fn cancel_before_run_writes_empty_wav() {
    let path = temp_wav("cancel_early");
    let mut source = ScriptedSource::new().bytes(frame(&[1]));

    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    controller.handle().cancel();
    let status = controller.run(&mut source).unwrap();

    assert!(status.is_cancelled());
    assert_eq!(status.samples_written, 0);
    assert_eq!(source.reads(), 0);
    let (header, samples) = read_wav(&path);
    assert_eq!(header.data_size, 0);
    assert!(samples.is_empty());

    cleanup(&path);
}

#[test]
fn sync_timeouts_are_retried() {
    let path = temp_wav("sync_retry");
    let mut source = ScriptedSource::new()
        .stall(Duration::from_millis(60))
        .stall(Duration::from_millis(60))
        .bytes(frame(&[3, 1, 4]));

    let mut cfg = config(&path, 16000, None);
    cfg.sync_timeout = Duration::from_millis(30);
    let delegate = Arc::new(RecordingDelegate::new());
    let mut controller = CaptureController::new(cfg).unwrap();
    controller.set_delegate(delegate.clone());
    let status = controller.run(&mut source).unwrap();

    assert_eq!(status.samples_written, 3);
    assert!(status.diagnostics.sync_timeouts >= 1);
    assert!(delegate.resyncs.lock().contains(&CaptureError::SyncTimeout));
    let (_, samples) = read_wav(&path);
    assert_eq!(samples, vec![3, 1, 4]);

    cleanup(&path);
}

#[test]
fn cancel_while_link_is_idle_does_not_wait_for_sync_timeout() {
    let path = temp_wav("cancel_idle");
    let mut source = ScriptedSource::new().bytes(frame(&[7, 7]));
    for _ in 0..400 {
        source = source.stall(Duration::from_millis(10));
    }

    let mut cfg = config(&path, 16000, None);
    cfg.sync_timeout = Duration::from_secs(30);
    let mut controller = CaptureController::new(cfg).unwrap();
    let handle = controller.handle();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        handle.cancel();
    });

    let started = Instant::now();
    let status = controller.run(&mut source).unwrap();
    canceller.join().unwrap();

    assert!(status.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(status.samples_written, 2);
    assert_eq!(status.diagnostics.sync_timeouts, 0);
    let (_, samples) = read_wav(&path);
    assert_eq!(samples, vec![7, 7]);

    cleanup(&path);
}

#[test]
fn unbounded_sync_timeout_is_accepted() {
    let path = temp_wav("unbounded_sync");
    let mut source = ScriptedSource::new().idle().bytes(frame(&[4, 2]));

    let mut cfg = config(&path, 16000, None);
    cfg.sync_timeout = Duration::MAX;
    assert!(cfg.validate().is_ok());
    let mut controller = CaptureController::new(cfg).unwrap();
    let status = controller.run(&mut source).unwrap();

    assert_eq!(status.status, CaptureStatus::Failed(CaptureError::SourceClosed));
    assert_eq!(status.samples_written, 2);

    cleanup(&path);
}

#[test]
fn sink_failure_mid_capture_keeps_file_and_status_in_agreement() {
    let path = temp_wav("sink_fault");
    // Header writes: open, first frame, second frame (fails), finalize.
    let wav = WavAccumulator::with_storage(&path, HeaderFaultFile::create(&path, 3), 16000).unwrap();
    let mut source = ScriptedSource::new()
        .bytes(frame(&[1, 2, 3]))
        .bytes(frame(&[4, 5]))
        .bytes(frame(&[6]));

    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    let status = controller.run_with_sink(&mut source, wav).unwrap();

    assert!(matches!(status.status, CaptureStatus::Failed(CaptureError::SinkError(_))));
    assert!(matches!(controller.state(), CaptureState::Failed(CaptureError::SinkError(_))));
    assert_eq!(status.samples_written, 3);
    assert_eq!(status.diagnostics.frames_accumulated, 1);
    assert!(status.checksum.is_some());

    let (header, samples) = read_wav(&path);
    assert_eq!(header.data_size as u64, status.samples_written * 2);
    assert_eq!(samples, vec![1, 2, 3]);

    cleanup(&path);
}

#[test]
fn sink_with_other_rate_is_rejected() {
    let path = temp_wav("rate_mismatch");
    let wav = WavAccumulator::open(&path, 8000).unwrap();

    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    let err = controller
        .run_with_sink(&mut ScriptedSource::new(), wav)
        .unwrap_err();
    assert!(matches!(err, CaptureError::ConfigurationFailed(_)));

    cleanup(&path);
}

#[test]
fn progress_is_rate_limited_to_half_seconds() {
    let path = temp_wav("progress");
    let mut source = ScriptedSource::new();
    for i in 0..8 {
        source.push_bytes(frame(&[i, i]));
    }

    let delegate = Arc::new(RecordingDelegate::new());
    let mut controller = CaptureController::new(config(&path, 8, None)).unwrap();
    controller.set_delegate(delegate.clone());
    controller.run(&mut source).unwrap();

    let progress = delegate.progress.lock();
    let written: Vec<u64> = progress.iter().map(|p| p.samples_written).collect();
    assert_eq!(written, vec![4, 8, 12, 16]);
    assert_relative_eq!(progress[3].elapsed_secs, 2.0);

    cleanup(&path);
}

#[test]
fn state_sequence_for_one_frame() {
    let path = temp_wav("states");
    let mut source = ScriptedSource::new().bytes(frame(&[9, 9]));

    let delegate = Arc::new(RecordingDelegate::new());
    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    controller.set_delegate(delegate.clone());
    let status = controller.run(&mut source).unwrap();

    assert_eq!(
        delegate.states.lock().as_slice(),
        &[
            CaptureState::AwaitingSync,
            CaptureState::ReadingPayload { sample_count: 2 },
            CaptureState::Accumulating { sample_count: 2 },
            CaptureState::AwaitingSync,
            CaptureState::Failed(CaptureError::SourceClosed),
        ]
    );
    assert_eq!(delegate.finished.lock().as_ref(), Some(&status));

    cleanup(&path);
}

#[test]
fn source_failure_is_surfaced() {
    let path = temp_wav("source_failed");
    let mut source = FailingSource::new(ScriptedSource::new().bytes(frame(&[1, 2])));

    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    let status = controller.run(&mut source).unwrap();

    assert_eq!(
        status.status,
        CaptureStatus::Failed(CaptureError::SourceFailed("device unplugged".into()))
    );
    assert_eq!(status.samples_written, 2);
    let (_, samples) = read_wav(&path);
    assert_eq!(samples, vec![1, 2]);

    cleanup(&path);
}

#[test]
fn unopenable_sink_fails_before_capture() {
    let blocker = temp_wav("blocker");
    fs::write(&blocker, b"plain file").unwrap();
    let path = blocker.join("capture.wav");
    let mut source = ScriptedSource::new().bytes(frame(&[1]));

    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    let err = controller.run(&mut source).unwrap_err();

    assert!(matches!(err, CaptureError::SinkError(_)));
    assert!(matches!(controller.state(), CaptureState::Failed(CaptureError::SinkError(_))));
    assert_eq!(source.reads(), 0);

    fs::remove_file(&blocker).ok();
}

#[test]
fn controller_runs_once() {
    let path = temp_wav("once");
    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    controller.run(&mut ScriptedSource::new()).unwrap();

    let err = controller.run(&mut ScriptedSource::new()).unwrap_err();
    assert!(matches!(err, CaptureError::ConfigurationFailed(_)));

    cleanup(&path);
}

#[test]
fn metadata_sidecar_describes_recording() {
    let path = temp_wav("sidecar");
    let mut source = ScriptedSource::new().bytes(frame(&[1, 2, 3, 4]));

    let mut cfg = config(&path, 16000, None);
    cfg.write_metadata = true;
    let mut controller = CaptureController::new(cfg).unwrap();
    let status = controller.run(&mut source).unwrap();

    let meta = read_metadata(&path).unwrap();
    assert_eq!(meta.samples_written, 4);
    assert_eq!(meta.sample_rate, 16000);
    assert_eq!(meta.bit_depth, 16);
    assert_eq!(meta.checksum, status.checksum);
    assert_eq!(meta.diagnostics.frames_accumulated, 1);

    cleanup(&path);
}

#[test]
fn start_capture_closes_source() {
    let path = temp_wav("start_capture");
    let mut source = ScriptedSource::new().bytes(frame(&[7, 7, 7]));

    let status = start_capture(&mut source, 16000, Some(1.0), &path).unwrap();

    assert_eq!(status.samples_written, 3);
    assert_eq!(source.read(1, Duration::from_millis(1)), Err(CaptureError::SourceClosed));

    cleanup(&path);
}

#[test]
fn replays_a_recorded_wire_dump() {
    let path = temp_wav("replay");
    let dump = path.with_extension("bin");
    let mut wire = vec![0x31, 0x53];
    for i in 0..3 {
        wire.extend(frame(&[i * 100; 256]));
    }
    fs::write(&dump, &wire).unwrap();

    let mut source = StreamSource::open_replay(&dump).unwrap();
    let mut controller = CaptureController::new(config(&path, 16000, None)).unwrap();
    let status = controller.run(&mut source).unwrap();

    assert_eq!(status.samples_written, 768);
    let (header, samples) = read_wav(&path);
    assert_eq!(header.data_size, 1536);
    assert_eq!(samples[256], 100);
    assert_eq!(samples[767], 200);

    cleanup(&path);
    fs::remove_file(&dump).ok();
}
