use burn_ndarray::NdArray;
use oncotrace_analysis::{AnalysisError, AnalysisResult, ChangeAnalyzer, ChangeClass};
use oncotrace_core::spatial::{Direction3, Point3, Spacing3};
use oncotrace_core::{BinaryMask, GridGeometry};
use proptest::prelude::*;

type B = NdArray<f32>;

fn geometry(shape: [usize; 3]) -> GridGeometry {
    GridGeometry::new(
        shape,
        Point3::new([1.0, -2.0, 3.0]),
        Spacing3::new([0.5, 0.5, 2.0]),
        Direction3::identity(),
    )
    .unwrap()
}

fn mask(flags: Vec<bool>, shape: [usize; 3]) -> BinaryMask<B> {
    BinaryMask::from_vec(flags, geometry(shape), &Default::default()).unwrap()
}

/// First `n` voxels of a 10x10x2 grid set.
fn prefix(n: usize) -> BinaryMask<B> {
    mask((0..200).map(|i| i < n).collect(), [2, 10, 10])
}

#[test]
fn test_superset_scores() {
    let analyzer = ChangeAnalyzer::new();
    let result = analyzer.analyze(&prefix(100), &prefix(60), 1.0).unwrap();
    assert!((result.dice - 0.75).abs() < 1e-12);
    assert!((result.jaccard - 0.6).abs() < 1e-12);
    assert_eq!(result.absolute_change_mm3, -40.0);
    assert!((result.relative_change_percent.unwrap() + 40.0).abs() < 1e-9);
    assert!((result.fractions.regression - 0.4).abs() < 1e-12);
    assert!((result.fractions.stable - 0.6).abs() < 1e-12);
}

#[test]
fn test_analysis_with_map_agrees() {
    let analyzer = ChangeAnalyzer::new();
    let first = prefix(100);
    let second = mask((0..200).map(|i| (40..130).contains(&i)).collect(), [2, 10, 10]);

    let (result, map) = analyzer.analyze_with_map(&first, &second).unwrap();
    assert_eq!(result, analyzer.analyze_masks(&first, &second).unwrap());
    assert_eq!(map.counts(), result.counts);
    assert_eq!(map.count(ChangeClass::Stable), 60);
    assert_eq!(map.count(ChangeClass::Regression), 40);
    assert_eq!(map.count(ChangeClass::Progression), 30);
    assert_eq!(map.geometry(), first.geometry());
}

#[test]
fn test_identical_masks() {
    let analyzer = ChangeAnalyzer::new();
    let result = analyzer.analyze_masks(&prefix(37), &prefix(37)).unwrap();
    assert_eq!(result.dice, 1.0);
    assert_eq!(result.jaccard, 1.0);
    assert_eq!(result.fractions.stable, 1.0);
    // voxel volume from spacing 0.5 * 0.5 * 2
    assert!((result.volume1_mm3 - 18.5).abs() < 1e-12);
}

#[test]
fn test_disjoint_masks() {
    let first = mask((0..200).map(|i| i < 50).collect(), [2, 10, 10]);
    let second = mask((0..200).map(|i| i >= 150).collect(), [2, 10, 10]);
    let result = ChangeAnalyzer::new().analyze(&first, &second, 1.0).unwrap();
    assert_eq!(result.dice, 0.0);
    assert_eq!(result.jaccard, 0.0);
    assert_eq!(result.relative_change, Some(0.0));
}

#[test]
fn test_empty_masks() {
    let result = ChangeAnalyzer::new().analyze(&prefix(0), &prefix(0), 1.0).unwrap();
    assert_eq!(result.dice, 0.0);
    assert_eq!(result.relative_change, None);
    assert_eq!(result.fractions.regression + result.fractions.progression + result.fractions.stable, 0.0);
}

#[test]
fn test_dimension_mismatch() {
    let a = mask(vec![true; 8], [2, 2, 2]);
    let b = mask(vec![true; 12], [3, 2, 2]);
    assert!(matches!(
        ChangeAnalyzer::new().analyze(&a, &b, 1.0),
        Err(AnalysisError::GeometryMismatch(_))
    ));
}

#[test]
fn test_origin_mismatch() {
    let a = mask(vec![true; 8], [2, 2, 2]);
    let shifted = GridGeometry::new(
        [2, 2, 2],
        Point3::new([1.0, -2.0, 3.1]),
        Spacing3::new([0.5, 0.5, 2.0]),
        Direction3::identity(),
    )
    .unwrap();
    let b = BinaryMask::<B>::from_vec(vec![true; 8], shifted, &Default::default()).unwrap();
    assert!(matches!(
        ChangeAnalyzer::new().analyze(&a, &b, 1.0),
        Err(AnalysisError::GeometryMismatch(_))
    ));
}

#[test]
fn test_invalid_voxel_volume() {
    let analyzer = ChangeAnalyzer::new();
    for v in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            analyzer.analyze(&prefix(1), &prefix(1), v),
            Err(AnalysisError::InvalidVoxelVolume(_))
        ));
    }
}

#[test]
fn test_result_json_roundtrip() {
    let result = ChangeAnalyzer::new().analyze(&prefix(80), &prefix(120), 1.5).unwrap();
    let json = serde_json::to_string_pretty(&result).unwrap();
    let back: AnalysisResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

fn mask_pair() -> impl Strategy<Value = (Vec<bool>, Vec<bool>)> {
    (
        prop::collection::vec(any::<bool>(), 64),
        prop::collection::vec(any::<bool>(), 64),
    )
}

proptest! {
    #[test]
    fn overlap_scores_are_consistent((a, b) in mask_pair()) {
        let first = mask(a.clone(), [4, 4, 4]);
        let second = mask(b.clone(), [4, 4, 4]);
        let analyzer = ChangeAnalyzer::new();
        let result = analyzer.analyze(&first, &second, 1.0).unwrap();

        prop_assert!((0.0..=1.0).contains(&result.dice));
        prop_assert!((0.0..=1.0).contains(&result.jaccard));
        prop_assert!(result.dice >= result.jaccard - 1e-12);
        let j = result.jaccard;
        prop_assert!((result.dice - 2.0 * j / (1.0 + j)).abs() < 1e-9);

        let counts = result.counts;
        let union = a.iter().zip(&b).filter(|(x, y)| **x || **y).count();
        prop_assert_eq!(counts.union(), union);
        prop_assert_eq!(counts.background + union, 64);

        let f = result.fractions;
        let total = f.regression + f.progression + f.stable;
        if union == 0 {
            prop_assert_eq!(total, 0.0);
        } else {
            prop_assert!((total - 1.0).abs() < 1e-9);
        }

        // order independence up to swapping regression and progression
        let swapped = analyzer.analyze(&second, &first, 1.0).unwrap();
        prop_assert_eq!(swapped.dice, result.dice);
        prop_assert_eq!(swapped.counts.regression, counts.progression);

        let map = analyzer.change_map(&first, &second).unwrap();
        for ((x, y), class) in a.iter().zip(&b).zip(map.to_vec()) {
            prop_assert_eq!(class, ChangeClass::classify(*x, *y));
        }
    }
}
