//! Save/load round trips through every compiled-in envelope format.

use ml_samples::{Format, Samples, SamplesError, load, load_auto};

fn image_samples() -> Samples {
    // Four 2x3 "images".
    let features: Vec<f32> = (0..24).map(|i| i as f32 / 4.0).collect();
    Samples::new(features, vec![2, 3], vec![0, 1, 1, 2]).unwrap()
}

#[test]
fn roundtrip_every_available_format() {
    let dir = tempfile::tempdir().unwrap();
    let original = image_samples();

    for format in Format::ALL.into_iter().filter(Format::is_available) {
        let path = dir.path().join(format!("train.{}", format.extension()));
        original.save(&path, format).unwrap();

        let loaded = load(&path, format, None).unwrap();
        assert_eq!(loaded, original, "round trip through {format}");
        assert_eq!(loaded.feature_shape(), &[2, 3]);
    }
}

#[test]
fn save_auto_load_auto() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("valid.pickle");

    let original = image_samples().shuffle_seeded(3);
    original.save_auto(&path).unwrap();
    assert_eq!(load_auto(&path).unwrap(), original);
}

#[test]
fn save_auto_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let err = image_samples()
        .save_auto(dir.path().join("train.csv"))
        .unwrap_err();
    assert!(matches!(err, SamplesError::UnknownFormat(_)));
}

#[test]
fn empty_set_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let empty = Samples::empty(vec![3]);

    let path = dir.path().join("empty.pkl");
    empty.save(&path, Format::Pickle).unwrap();
    let loaded = load(&path, Format::Pickle, None).unwrap();
    assert!(loaded.is_empty());
    assert_eq!(loaded.feature_shape(), &[3]);
}

#[test]
fn loaded_batches_match_original() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.pkl");

    let original = image_samples();
    original.save(&path, Format::Pickle).unwrap();
    let loaded = load(&path, Format::Pickle, None).unwrap();

    let sizes: Vec<usize> = loaded.batches(3).unwrap().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![3, 1]);
    approx::assert_relative_eq!(loaded.feature(3)[5], 23.0 / 4.0);
}

#[cfg(feature = "mat")]
#[test]
fn mat_scalar_features() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scalars.mat");

    let original = Samples::new(vec![0.5, 1.5, 2.5], vec![], vec![7, 8, 9]).unwrap();
    original.save(&path, Format::Mat).unwrap();
    assert_eq!(load(&path, Format::Mat, None).unwrap(), original);
}

#[cfg(feature = "hdf5")]
#[test]
fn hdf5_group_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("splits.h5");

    let train = image_samples();
    let test = train.slice(0..1).unwrap();
    train.save(&path, Format::Hdf5).unwrap();
    ml_samples::append_hdf5_group(&test, &path, "test").unwrap();

    assert_eq!(load(&path, Format::Hdf5, None).unwrap(), train);
    assert_eq!(load(&path, Format::Hdf5, Some("test")).unwrap(), test);
}

#[cfg(not(feature = "hdf5"))]
#[test]
fn hdf5_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let err = image_samples()
        .save(dir.path().join("train.h5"), Format::Hdf5)
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("hdf5"));
}
