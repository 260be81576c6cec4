use anyhow::Result;
use logboard::{
    writer_factory, Record, RecordValue, Recorder, RecorderConfig, WriterFactory, WriterKind,
    PROJECTOR_CONFIG,
};
use logboard_core::{
    codec::{self, ImageFormat},
    proto::{self, event::What, summary::value::Value},
    summary::{AudioMetadata, Colorspace, ImageMetadata},
    EventFileReader, EventWriter, FileWriter, LogboardError, FILE_VERSION,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tempdir::TempDir;
use test_log::test;

fn read_events(path: &Path) -> Result<Vec<proto::Event>> {
    let events = EventFileReader::open(path)?.collect::<logboard_core::Result<Vec<_>>>()?;
    Ok(events)
}

/// Returns the value of the single summary of `event`.
fn value_of(event: &proto::Event) -> (&str, &Value) {
    match event.what.as_ref() {
        Some(What::Summary(s)) => (&s.value[0].tag, s.value[0].value.as_ref().unwrap()),
        _ => panic!("Expected a summary"),
    }
}

fn root_events(recorder: &Recorder) -> Result<Vec<proto::Event>> {
    read_events(&recorder.event_file().unwrap())
}

/// Event file in `dir`, which must hold exactly one.
fn event_file_in(dir: &Path) -> Result<PathBuf> {
    let mut files = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    files.retain(|p| p.to_string_lossy().contains(".out.tfevents."));
    assert_eq!(files.len(), 1);
    Ok(files.remove(0))
}

#[test]
fn test_add_scalar() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let recorder = Recorder::new(tmp.path());
    assert!(recorder.ready());

    let n = recorder.add_scalar("loss", 0.5, 3)?;
    let events = root_events(&recorder)?;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].what, Some(What::FileVersion(FILE_VERSION.to_string())));

    let (tag, value) = value_of(&events[1]);
    assert_eq!(tag, "loss");
    assert_eq!(*value, Value::SimpleValue(0.5));
    assert_eq!(events[1].step, 3);

    // The returned size is the framed record, header excluded
    let path = recorder.event_file().unwrap();
    let file_len = fs::metadata(&path)?.len() as usize;
    let header = EventFileReader::open(&path)?.read_record()?.unwrap();
    assert_eq!(n, file_len - (header.len() + 16));
    Ok(())
}

#[test]
fn test_negative_step_is_omitted() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let recorder = Recorder::new(tmp.path());
    recorder.add_scalar("loss", 1.0, -1)?;
    let events = root_events(&recorder)?;
    assert_eq!(events[1].step, 0);
    Ok(())
}

#[test]
fn test_add_scalars() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let recorder = Recorder::new(tmp.path());

    let n1 = recorder.add_scalars("scalars", vec![("x", 1.0)], 5)?;
    let n2 = recorder.add_scalars("scalars", vec![("y", 2.0)], 5)?;
    assert!(n1 > 0);
    assert!(n2 > 0);
    let n = recorder.add_scalars("scalars", vec![("x", 3.0), ("y", 4.0)], 6)?;
    assert!(n > 0);

    let x = read_events(&event_file_in(&tmp.path().join("scalars_x"))?)?;
    let y = read_events(&event_file_in(&tmp.path().join("scalars_y"))?)?;
    assert_eq!(x.len(), 3);
    assert_eq!(y.len(), 3);
    assert_eq!(value_of(&x[1]), ("scalars", &Value::SimpleValue(1.0)));
    assert_eq!(value_of(&x[2]), ("scalars", &Value::SimpleValue(3.0)));
    assert_eq!(value_of(&y[2]), ("scalars", &Value::SimpleValue(4.0)));
    assert_eq!(x[1].step, 5);

    // Nothing is written to the root file
    assert_eq!(root_events(&recorder)?.len(), 1);
    Ok(())
}

#[test]
fn test_add_scalars_replaces_slashes() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let recorder = Recorder::new(tmp.path());
    recorder.add_scalars("train/lr", vec![("actor".to_string(), 0.1)], 0)?;
    assert!(tmp.path().join("train_lr_actor").is_dir());
    Ok(())
}

#[test]
fn test_add_scalars_attempts_every_value() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let recorder = Recorder::new(tmp.path());

    // "m_nested/x" cannot be created below the file "m_nested"
    fs::write(tmp.path().join("m_nested"), b"")?;
    let res = recorder.add_scalars("m", vec![("a", 1.0), ("nested/x", 2.0), ("b", 3.0)], 0);
    assert!(matches!(res, Err(LogboardError::WriterNotReady(_))));

    assert_eq!(read_events(&event_file_in(&tmp.path().join("m_a"))?)?.len(), 2);
    assert_eq!(read_events(&event_file_in(&tmp.path().join("m_b"))?)?.len(), 2);
    Ok(())
}

#[test]
fn test_add_scalars_from_threads() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let recorder = Arc::new(Recorder::new(tmp.path()));

    let handles = (0..8i64)
        .map(|i| {
            let recorder = recorder.clone();
            std::thread::spawn(move || {
                recorder.add_scalars("s", vec![("x", i as f32), ("y", i as f32)], i)
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        assert!(handle.join().unwrap()? > 0);
    }

    // One writer per series, shared by every thread
    for series in ["s_x", "s_y"].iter() {
        let events = read_events(&event_file_in(&tmp.path().join(series))?)?;
        assert_eq!(events.len(), 1 + 8);
        let mut steps = events[1..].iter().map(|e| e.step).collect::<Vec<_>>();
        steps.sort_unstable();
        assert_eq!(steps, (0..8).collect::<Vec<_>>());
    }
    Ok(())
}

#[test]
fn test_histogram_and_text() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let recorder = Recorder::new(tmp.path());
    recorder.add_histogram("weights", &[1.0, 2.0, 3.0], 0)?;
    recorder.add_histogram_raw("raw", 0.0, 1.0, 2.0, 1.0, 1.0, &[0.5, 1.0], &[1.0, 1.0], 1)?;
    assert!(matches!(
        recorder.add_histogram_raw("raw", 0.0, 1.0, 2.0, 1.0, 1.0, &[0.5], &[1.0, 1.0], 2),
        Err(LogboardError::InvalidHistogram(_))
    ));
    recorder.add_text("notes", "hello", 2)?;

    let events = root_events(&recorder)?;
    assert_eq!(events.len(), 4);
    match value_of(&events[1]) {
        ("weights", Value::Histo(h)) => {
            assert_eq!(h.num, 3.0);
            assert_eq!(h.bucket.iter().sum::<f64>(), 3.0);
        }
        other => panic!("Unexpected value: {:?}", other),
    }
    match value_of(&events[2]) {
        ("raw", Value::Histo(h)) => assert_eq!(h.bucket_limit, vec![0.5, 1.0]),
        other => panic!("Unexpected value: {:?}", other),
    }
    match value_of(&events[3]) {
        ("notes/text_summary", Value::Tensor(t)) => {
            assert_eq!(t.string_val, vec![b"hello".to_vec()])
        }
        other => panic!("Unexpected value: {:?}", other),
    }
    Ok(())
}

#[test]
fn test_images_and_audio() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let config = RecorderConfig::default().log_dir(tmp.path()).max_cols(2);
    let recorder = Recorder::from_config(&config);

    let meta = ImageMetadata::new(2, 2, 1)?;
    let images = vec![vec![10u8; 4], vec![20u8; 4], vec![30u8; 4]];
    recorder.add_images("mosaic", &images, &meta, 0)?;

    let png = codec::encode(&[0u8; 12], 2, 2, Colorspace::Rgb, ImageFormat::Png)?;
    let path = tmp.path().join("img.png");
    fs::write(&path, &png)?;
    recorder.add_image_file("file", &path, 1)?;
    assert!(recorder.add_image_file("file", tmp.path().join("missing.png"), 1).is_err());

    recorder.add_image("encoded", &png, &ImageMetadata::new(2, 2, 3)?, 2)?;
    assert!(recorder.add_image("encoded", &[], &meta, 2).is_err());

    recorder.add_audio("clip", &[1, 2, 3, 4], &AudioMetadata::new(1, 4), 3)?;
    assert!(matches!(
        recorder.add_audio("clip", &[], &AudioMetadata::new(1, 4), 3),
        Err(LogboardError::InvalidAudio(_))
    ));

    let events = root_events(&recorder)?;
    assert_eq!(events.len(), 5);
    match value_of(&events[1]) {
        ("mosaic", Value::Image(img)) => {
            assert_eq!((img.width, img.height, img.colorspace), (4, 4, 1));
            let raw = codec::load_from_memory(&img.encoded_image_string)?;
            // The fourth cell is zero-filled
            assert_eq!(raw.pixels[..4], [10u8, 10, 20, 20]);
            assert_eq!(raw.pixels[8..], [30u8, 30, 0, 0, 30, 30, 0, 0]);
        }
        other => panic!("Unexpected value: {:?}", other),
    }
    match value_of(&events[2]) {
        ("file", Value::Image(img)) => {
            assert_eq!((img.width, img.height, img.colorspace), (2, 2, 3));
            assert_eq!(img.encoded_image_string, png);
        }
        other => panic!("Unexpected value: {:?}", other),
    }
    match value_of(&events[4]) {
        ("clip", Value::Audio(a)) => {
            assert_eq!(a.sample_rate, 44100.0);
            assert_eq!(a.content_type, "audio/wav");
        }
        other => panic!("Unexpected value: {:?}", other),
    }
    Ok(())
}

#[test]
fn test_add_embedding() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let recorder = Recorder::new(tmp.path());
    let n = recorder.add_embedding(&[1.0, 2.0, 3.0, 4.0], 2, 2, &["a", "b"], 10, "emb")?;

    let config = fs::read_to_string(tmp.path().join(PROJECTOR_CONFIG))?;
    assert_eq!(n, config.len());
    assert!(config.contains("tensor_path: \"00010/emb/tensors.tsv\""));
    assert!(tmp.path().join("00010/emb/metadata.tsv").is_file());

    assert!(matches!(
        recorder.add_embedding(&[1.0, 2.0, 3.0], 2, 2, &["a", "b"], 11, "emb"),
        Err(LogboardError::InvalidEmbedding(_))
    ));
    assert!(!tmp.path().join("00011").exists());
    assert_eq!(fs::read_to_string(tmp.path().join(PROJECTOR_CONFIG))?, config);
    Ok(())
}

#[test]
fn test_write_record() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let recorder = Recorder::new(tmp.path());
    let record = Record::from_slice(&[
        ("loss", RecordValue::Scalar(0.1)),
        ("time", RecordValue::DateTime(chrono::Local::now())),
        ("weights", RecordValue::Array1(vec![0.1, 0.2])),
        ("map", RecordValue::Array2(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], [2, 3])),
        ("rgb", RecordValue::Array3(vec![0.5; 12], [3, 2, 2])),
        ("note", RecordValue::String("ok".to_string())),
    ]);
    assert!(recorder.write_record(&record, 1)? > 0);

    let events = root_events(&recorder)?;
    assert_eq!(events.len(), 6);
    let mut tags = events[1..]
        .iter()
        .map(|e| value_of(e).0.to_string())
        .collect::<Vec<_>>();
    tags.sort();
    assert_eq!(tags, vec!["loss", "map", "note/text_summary", "rgb", "weights"]);

    for event in events[1..].iter() {
        if let ("map", Value::Image(img)) = value_of(event) {
            assert_eq!((img.width, img.height, img.colorspace), (3, 2, 1));
            let raw = codec::load_from_memory(&img.encoded_image_string)?;
            assert_eq!(raw.pixels, vec![0, 51, 102, 153, 204, 255]);
        }
    }

    // Bad arrays fail but do not stop the other values
    let record = Record::from_slice(&[
        ("bad", RecordValue::Array3(vec![0.0; 8], [2, 2, 2])),
        ("loss", RecordValue::Scalar(0.2)),
    ]);
    assert!(recorder.write_record(&record, 2).is_err());
    assert_eq!(root_events(&recorder)?.len(), 7);
    Ok(())
}

#[test]
fn test_sanitize_tags() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let config = RecorderConfig::default()
        .log_dir(tmp.path())
        .sanitize_tags(true);
    let recorder = Recorder::from_config(&config);
    recorder.add_scalar("/train loss%", 1.0, 0)?;

    let events = root_events(&recorder)?;
    assert_eq!(value_of(&events[1]).0, "train_loss_");
    Ok(())
}

#[test]
fn test_async_recorder_flushes_on_drop() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let config = RecorderConfig::default()
        .log_dir(tmp.path())
        .writer(WriterKind::Async);
    let path = {
        let recorder = Recorder::from_config(&config);
        for i in 0..500 {
            recorder.add_scalar("loss", i as f32, i)?;
        }
        recorder.add_scalars("lr", vec![("a", 0.1)], 0)?;
        recorder.event_file().unwrap()
    };

    assert_eq!(read_events(&path)?.len(), 501);
    assert_eq!(read_events(&event_file_in(&tmp.path().join("lr_a"))?)?.len(), 2);
    Ok(())
}

#[test]
fn test_close() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let recorder = Recorder::new(tmp.path());
    recorder.add_scalar("loss", 1.0, 0)?;
    recorder.close()?;
    recorder.close()?;
    assert!(!recorder.ready());
    assert!(recorder.add_scalar("loss", 1.0, 1).is_err());
    assert_eq!(root_events(&recorder)?.len(), 2);
    Ok(())
}

#[test]
fn test_log_dir_is_a_file() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let file = tmp.path().join("not_a_dir");
    fs::write(&file, b"")?;
    let recorder = Recorder::new(&file);
    assert_eq!(recorder.log_dir(), tmp.path());
    assert!(recorder.ready());
    Ok(())
}

#[test]
fn test_empty_log_dir() -> Result<()> {
    let log_dir = {
        let recorder = Recorder::new("");
        assert!(recorder.ready());
        let log_dir = recorder.log_dir().to_path_buf();
        assert!(log_dir.starts_with("runs"));
        assert!(log_dir.file_name().map(|n| !n.is_empty()).unwrap_or(false));
        log_dir
    };
    fs::remove_dir_all(log_dir)?;
    let _ = fs::remove_dir("runs");
    Ok(())
}

#[test]
fn test_custom_factory() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let prefixes = Arc::new(Mutex::new(vec![]));
    let factory: WriterFactory = {
        let prefixes = prefixes.clone();
        let inner = writer_factory(WriterKind::Sync, false, 0);
        Box::new(move |prefix: &Path, hostname: &str| -> Box<dyn EventWriter> {
            prefixes.lock().unwrap().push(prefix.to_path_buf());
            inner(prefix, hostname)
        })
    };

    let recorder = Recorder::with_factory(tmp.path(), factory);
    recorder.add_scalars("s", vec![("x", 1.0), ("y", 2.0)], 0)?;
    recorder.add_scalars("s", vec![("x", 1.0), ("y", 2.0)], 1)?;

    let prefixes = prefixes.lock().unwrap().clone();
    assert_eq!(
        prefixes,
        vec![
            tmp.path().join("events"),
            tmp.path().join("s_x/events"),
            tmp.path().join("s_y/events"),
        ]
    );
    Ok(())
}

#[test]
fn test_file_writer_round_trip() -> Result<()> {
    let tmp = TempDir::new("recorder")?;
    let mut writer = FileWriter::new(tmp.path().join("events"), "host", false);
    let event = logboard_core::Event::with_step(logboard_core::summary::scalar("x", 2.0), 4);
    let n = writer.write(&event)?;
    writer.close()?;

    // Skip the header, then check the raw frame
    let bytes = fs::read(writer.path())?;
    let frame = &bytes[bytes.len() - n..];
    let payload = event.encode();
    assert_eq!(&frame[..8], &(payload.len() as u64).to_le_bytes());
    assert_eq!(&frame[8..12], &logboard_core::masked_crc32c(&frame[..8]).to_le_bytes());
    assert_eq!(&frame[12..n - 4], payload.as_slice());
    assert_eq!(&frame[n - 4..], &logboard_core::masked_crc32c(&payload).to_le_bytes());
    Ok(())
}
