//! Handle-backed sample set lifecycle.

use ml_samples::{HandleSamples, MemoryBackend, Samples, SamplesError};

fn backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    let all = Samples::from_rows(
        (0..10).map(|i| vec![i as f32, (i * i) as f32]).collect(),
        (0..10).map(|i| i % 3).collect(),
    )
    .unwrap();
    backend.insert("digits.h5", "train", all.slice(0..8).unwrap());
    backend.insert("digits.h5", "test", all.slice(8..10).unwrap());
    backend
}

#[test]
fn open_close_then_group_is_closed_error() {
    let mut set = HandleSamples::new("digits.h5", backend());
    set.open().unwrap();
    assert_eq!(set.group("train").unwrap().len(), 8);

    set.close().unwrap();
    let err = set.group("train").unwrap_err();
    assert!(matches!(err, SamplesError::Closed { .. }));
    assert!(err.to_string().contains("digits.h5"));
}

#[test]
fn groups_feed_training_loop() {
    let set = HandleSamples::open_with("digits.h5", backend()).unwrap();
    let train = set.group("train").unwrap().shuffle_seeded(1);
    let test = set.group("test").unwrap();

    let seen: usize = train.batches(3).unwrap().map(|b| b.len()).sum();
    assert_eq!(seen, 8);
    assert_eq!(test.targets(), &[2, 0]);
}

#[test]
fn scoped_releases_handle() {
    let backend = backend();
    let names = HandleSamples::scoped("digits.h5", backend.clone(), |set| set.group_names()).unwrap();
    assert_eq!(names, vec!["test", "train"]);
    assert_eq!(backend.open_count(), 1);
    assert_eq!(backend.close_count(), 1);
}

#[test]
fn drop_releases_handle() {
    let backend = backend();
    let set = HandleSamples::open_with("digits.h5", backend.clone()).unwrap();
    drop(set);
    assert_eq!(backend.close_count(), 1);
}
