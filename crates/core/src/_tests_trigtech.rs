#![cfg(test)]

use std::f64::consts::PI;

use num_complex::Complex64;

use super::array::SpectralArray;
use super::config::{ResampleStrategy, TrigOptions};
use super::error::TrigError;
use super::grid::trigpts;
use super::refine::{FunctionContainer, PROBE_POINT, Refine, check_callable, populate};
use super::trigtech::Trigtech;

fn sin_pi() -> Trigtech {
    Trigtech::from_real_fn(|x| (PI * x).sin(), &TrigOptions::default()).expect("sin resolves")
}

fn assert_close(lhs: Complex64, rhs: Complex64, tol: f64) {
    assert!((lhs - rhs).norm() < tol, "complex numbers differ: {lhs:?} vs {rhs:?}");
}

#[test]
fn smooth_function_becomes_happy_and_compact() {
    let f = sin_pi();
    assert!(f.is_happy());
    assert!(f.is_real());
    assert_eq!(f.len(), 3);
    let ci = f.const_index();
    assert_close(f.coeffs().get(ci + 1, 0), Complex64::new(0.0, -0.5), 1e-12);
    assert_close(f.coeffs().get(ci - 1, 0), Complex64::new(0.0, 0.5), 1e-12);
}

#[test]
fn nan_producing_callable_is_rejected() {
    let err = Trigtech::from_real_fn(|x| 1.0 / (x - x), &TrigOptions::default()).unwrap_err();
    assert!(matches!(err, TrigError::NumericalDomain { .. }), "{err:?}");
}

#[test]
fn singularity_away_from_probe_is_caught_during_sampling() {
    let err = Trigtech::from_real_fn(|x| if x == 0.0 { f64::INFINITY } else { x }, &TrigOptions::default())
        .unwrap_err();
    assert!(matches!(err, TrigError::NumericalDomain { x } if x == 0.0), "{err:?}");
}

#[test]
fn unresolvable_function_gives_up_unhappy() {
    let options = TrigOptions::default().with_max_length(64);
    let f = Trigtech::from_real_fn(|x| x.abs().sqrt(), &options).expect("sampling succeeds");
    assert!(!f.is_happy());
    assert!(f.len() <= 64);
}

#[test]
fn evaluation_matches_callable() {
    let options = TrigOptions::default();
    let f = Trigtech::from_real_fn(|x| (PI * x).cos().exp(), &options).unwrap();
    assert!(f.is_happy());
    for &x in &[-0.9, -0.3, 0.0, 0.41, 0.77] {
        let expected = (PI * x).cos().exp();
        assert_close(f.eval_column(0, x), Complex64::new(expected, 0.0), 1e-9);
    }
}

#[test]
fn feval_on_grid_matches_values_for_even_length() {
    let values: Vec<f64> = trigpts(8).iter().map(|&x| 1.0 + (4.0 * PI * x).cos()).collect();
    let f = Trigtech::from_real_values(&values, &TrigOptions::default());
    let at_grid = f.feval(&f.x());
    for (j, &v) in values.iter().enumerate() {
        assert_close(at_grid.get(j, 0), Complex64::new(v, 0.0), 1e-12);
    }
}

#[test]
fn complex_callable_keeps_imaginary_part() {
    let f = Trigtech::from_fn(|x| Complex64::from_polar(1.0, PI * x), &TrigOptions::default()).unwrap();
    assert!(!f.is_real());
    assert_close(f.eval_column(0, 0.25), Complex64::from_polar(1.0, PI * 0.25), 1e-10);
}

#[test]
fn multi_column_construction_shares_length() {
    let mut ops = FunctionContainer::new(Vec::new());
    ops.push(|x| Complex64::new((PI * x).sin(), 0.0));
    ops.push(|x| Complex64::new((3.0 * PI * x).cos(), 0.0));
    let f = Trigtech::from_container(&ops, &TrigOptions::default()).unwrap();
    assert_eq!(f.cols(), 2);
    assert_eq!(f.len(), 7);
    let columns: Vec<Trigtech> = f.columns().collect();
    assert_close(columns[1].eval_column(0, 0.2), Complex64::new((0.6 * PI).cos(), 0.0), 1e-12);
}

#[test]
fn prolong_round_trip_recovers_coefficients() {
    for n in [9, 10] {
        let values: Vec<f64> = trigpts(n).iter().map(|&x| (PI * x).sin() + 0.3 * (2.0 * PI * x).cos()).collect();
        let f = Trigtech::from_real_values(&values, &TrigOptions::default());
        let back = f.prolong(2 * n).prolong(n);
        for (a, b) in back.coeffs().as_slice().iter().zip(f.coeffs().as_slice()) {
            assert_close(*a, *b, 1e-12);
        }
    }
}

#[test]
fn simplify_chops_padded_representation() {
    let f = sin_pi().prolong(33);
    assert_eq!(f.len(), 33);
    assert_eq!(f.simplify().len(), 3);
}

#[test]
fn real_imag_and_conj() {
    let f = Trigtech::from_fn(|x| Complex64::new((PI * x).cos(), (PI * x).sin()), &TrigOptions::default()).unwrap();
    let re = f.real();
    let im = f.imag();
    assert!(re.is_real() && im.is_real());
    assert_close(re.eval_column(0, 0.3), Complex64::new((0.3 * PI).cos(), 0.0), 1e-12);
    assert_close(im.eval_column(0, 0.3), Complex64::new((0.3 * PI).sin(), 0.0), 1e-12);

    let g = f.conj();
    assert_close(g.eval_column(0, 0.3), Complex64::from_polar(1.0, -0.3 * PI), 1e-12);

    let real = sin_pi();
    assert_eq!(real.conj(), real);
    assert!(real.imag().coeffs().as_slice().iter().all(|c| c.norm() == 0.0));
}

#[test]
fn argmax_picks_largest_coefficient() {
    let f = Trigtech::from_coeffs(
        SpectralArray::from_column(vec![
            Complex64::new(0.1, 0.0),
            Complex64::new(0.0, -3.0),
            Complex64::new(1.0, 0.0),
        ]),
        &TrigOptions::default(),
    );
    assert_eq!(f.argmax(), 1);
}

#[test]
fn compose_applies_pointwise_map() {
    let f = sin_pi();
    let g = f.compose(|v| v * v).unwrap();
    assert!(g.is_happy());
    for &x in &[-0.7, 0.1, 0.5] {
        assert_close(g.eval_column(0, x), Complex64::new((PI * x).sin().powi(2), 0.0), 1e-12);
    }
}

#[test]
fn compose_with_matches_pointwise_product() {
    let f = sin_pi();
    let g = Trigtech::from_real_fn(|x| (PI * x).cos(), &TrigOptions::default()).unwrap();
    let product = f.compose_with(&g, |a, b| a * b).unwrap();
    assert!(product.is_happy());
    for &x in &[-0.7, 0.1, 0.5] {
        let expected = (PI * x).sin() * (PI * x).cos();
        assert_close(product.eval_column(0, x), Complex64::new(expected, 0.0), 1e-12);
    }

    let mut ops = FunctionContainer::new(Vec::new());
    ops.push(|x| Complex64::new((PI * x).sin(), 0.0));
    ops.push(|x| Complex64::new((PI * x).cos(), 0.0));
    let two = Trigtech::from_container(&ops, &TrigOptions::default()).unwrap();
    assert!(matches!(f.compose_with(&two, |a, b| a + b), Err(TrigError::ShapeMismatch { .. })));
}

#[test]
fn truncate_returns_central_modes() {
    let f = sin_pi().prolong(11);
    let cut = f.truncate(2);
    assert_eq!(cut.rows(), 2);
    assert_eq!(cut.get(0, 0), f.coeffs().get(f.const_index() - 1, 0));
}

#[test]
fn probe_detects_real_columns() {
    let mut ops = FunctionContainer::single(|x| Complex64::new(x, 0.0));
    ops.push(|x| Complex64::new(0.0, x));
    assert_eq!(check_callable(&ops).unwrap(), vec![true, false]);

    let bad = FunctionContainer::single(|x| Complex64::new(1.0 / (x - PROBE_POINT), 0.0));
    assert!(matches!(check_callable(&bad), Err(TrigError::NumericalDomain { .. })));
}

#[test]
fn nested_and_full_refinement_agree() {
    let ops = FunctionContainer::single(|x| Complex64::new((2.0 * PI * x).sin().exp(), 0.0));
    let nested = TrigOptions::default();
    let full = TrigOptions {
        resample: ResampleStrategy::Full,
        ..TrigOptions::default()
    };

    let first = Refine::new(&ops, &nested).step(None).unwrap();
    let second_nested = Refine::new(&ops, &nested).step(Some(&first.values)).unwrap();
    let second_full = Refine::new(&ops, &full).step(Some(&first.values)).unwrap();
    for (a, b) in second_nested.values.as_slice().iter().zip(second_full.values.as_slice()) {
        assert_close(*a, *b, 1e-14);
    }

    let a = populate(&ops, &nested).unwrap();
    let b = populate(&ops, &full).unwrap();
    assert_eq!(a.coeffs.rows(), b.coeffs.rows());
    assert!(a.is_happy && b.is_happy);
}
