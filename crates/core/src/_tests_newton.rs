#![cfg(test)]

use std::f64::consts::PI;

use num_complex::Complex64;

use super::config::{DeflationOptions, NewtonOptions, TrigOptions};
use super::discretization::{ContinuationState, SemilinearProblem};
use super::error::TrigError;
use super::linalg::LinearOperator;
use super::newton::{ContinuationCorrector, NewtonSolver};
use super::trigtech::Trigtech;

fn constant(value: f64) -> Trigtech {
    Trigtech::from_real_values(&[value], &TrigOptions::default())
}

fn mean(u: &Trigtech) -> Complex64 {
    u.coeffs().get(u.const_index(), 0)
}

fn max_oscillation(u: &Trigtech) -> f64 {
    let ci = u.const_index();
    u.coeffs()
        .column(0)
        .iter()
        .enumerate()
        .filter(|&(p, _)| p != ci)
        .map(|(_, c)| c.norm())
        .fold(0.0, f64::max)
}

#[test]
fn undeflated_newton_finds_nearest_root() {
    let problem = SemilinearProblem::new(0.05, 1.0, 9);
    let solver = NewtonSolver::new(&problem, DeflationOptions::default(), NewtonOptions::default());
    let outcome = solver.solve(&constant(0.9)).unwrap();
    assert!(outcome.converged, "{outcome:?}");
    assert!(outcome.iterations <= 8);
    assert_eq!(outcome.solution.len(), 9);
    assert!((mean(&outcome.solution) - Complex64::new(1.0, 0.0)).norm() < 1e-10);
    assert!(max_oscillation(&outcome.solution) < 1e-12);
}

#[test]
fn deflation_steers_away_from_known_root() {
    let problem = SemilinearProblem::new(0.05, 1.0, 9);
    let mut solver = NewtonSolver::new(&problem, DeflationOptions::default(), NewtonOptions::default());
    solver.add_known_solution(constant(1.0));
    assert_eq!(solver.known_solutions().len(), 1);

    let outcome = solver.solve(&constant(-0.9)).unwrap();
    assert!(outcome.converged, "{outcome:?}");
    assert!((mean(&outcome.solution) - Complex64::new(-1.0, 0.0)).norm() < 1e-9);
    assert!(outcome.residual_norm < 1e-10);
}

#[test]
fn deflated_iteration_never_returns_known_root() {
    let problem = SemilinearProblem::new(0.05, 1.0, 9);
    let options = NewtonOptions {
        max_iterations: 15,
        ..NewtonOptions::default()
    };
    let mut solver = NewtonSolver::new(&problem, DeflationOptions::default(), options);
    solver.add_known_solution(constant(1.0));

    // stalling next to the known root, or even hitting a singular step, is fine
    match solver.solve(&constant(0.95)) {
        Ok(outcome) => {
            assert!(outcome.iterations <= 15);
            if outcome.converged {
                assert!((mean(&outcome.solution) - Complex64::new(1.0, 0.0)).norm() > 1e-3);
            }
        }
        Err(err) => assert!(matches!(err, TrigError::Singular { .. }), "{err:?}"),
    }
}

#[test]
fn damped_newton_still_converges() {
    let problem = SemilinearProblem::new(0.05, 1.0, 9);
    let options = NewtonOptions {
        damping: 0.5,
        max_iterations: 80,
        ..NewtonOptions::default()
    };
    let solver = NewtonSolver::new(&problem, DeflationOptions::default(), options);
    let outcome = solver.solve(&constant(1.3)).unwrap();
    assert!(outcome.converged, "{outcome:?}");
    assert!(outcome.iterations > 5);
}

fn corrector_state() -> ContinuationState {
    let u = Trigtech::from_real_fn(|x| 0.8 + 0.1 * (PI * x).cos(), &TrigOptions::default())
        .expect("function resolves");
    ContinuationState::new(u, 1.2)
}

#[test]
fn corrector_is_bordered_jacobian() {
    let problem = SemilinearProblem::new(0.05, 1.0, 9);
    let state = corrector_state();
    let corrector =
        ContinuationCorrector::new(&state, &problem, &[], DeflationOptions::default()).unwrap();
    assert_eq!(corrector.shape(), (9, 10));
    assert_eq!(
        corrector.parameter_derivative(),
        state.u.prolong(9).coeff_vector().as_slice()
    );

    let x: Vec<Complex64> = (0..10).map(|j| Complex64::new(j as f64 * 0.1 - 0.4, 0.2)).collect();
    let direct = corrector.matvec(&x).unwrap();
    let materialized = corrector.to_matrix().matvec(&x).unwrap();
    for (a, b) in direct.iter().zip(&materialized) {
        assert!((a - b).norm() < 1e-12);
    }

    let y: Vec<Complex64> = (0..9).map(|j| Complex64::new(1.0, j as f64)).collect();
    let back = corrector.rmatvec(&y).unwrap();
    assert_eq!(back.len(), 10);
    let transposed = corrector.to_dense().unwrap().rmatvec(&y).unwrap();
    for (a, b) in back.iter().zip(&transposed) {
        assert!((a - b).norm() < 1e-12);
    }

    let full = corrector.matrix_full(&state).unwrap();
    assert_eq!(full, *corrector.to_matrix());
    assert_eq!(corrector.inverse_basis().unwrap().nnz(), 9);
}

#[test]
fn corrector_rhs_uses_state_parameter() {
    let problem = SemilinearProblem::new(0.05, 1.0, 9);
    // u = 2 solves 4u - u³ = 0 at the continuation parameter, not at λ = 1
    let state = ContinuationState::new(constant(2.0), 4.0);
    let corrector =
        ContinuationCorrector::new(&state, &problem, &[], DeflationOptions::default()).unwrap();
    let rhs = corrector.rhs(&state).unwrap();
    assert!(rhs.iter().all(|r| r.norm() < 1e-13));
    assert_eq!(corrector.residual().collocation().lambda(), 4.0);
}

#[test]
fn corrector_preconditioner_is_block_diagonal() {
    let problem = SemilinearProblem::new(0.05, 1.0, 9);
    let state = corrector_state();
    let corrector =
        ContinuationCorrector::new(&state, &problem, &[constant(-1.0)], DeflationOptions::default())
            .unwrap();
    let precond = corrector.precond().unwrap();
    assert_eq!(precond.shape(), (10, 10));

    let inner = corrector.residual().precond().unwrap();
    let x: Vec<Complex64> = (0..10).map(|j| Complex64::new(0.3 * j as f64, -0.1)).collect();
    let out = precond.matvec(&x).unwrap();
    assert_eq!(out[9], x[9]);
    let head = inner.matvec(&x[..9]).unwrap();
    for (a, b) in out[..9].iter().zip(&head) {
        assert!((a - b).norm() < 1e-14);
    }

    let dense = precond.to_matrix().to_dense_matrix();
    assert_eq!(dense.get(9, 9), Complex64::new(1.0, 0.0));
    assert_eq!(dense.get(9, 0), Complex64::default());
    assert_eq!(dense.get(0, 9), Complex64::default());
}
