use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::cnf::{Clause, ClauseSet, Literal};

fn clause_set(num_vars: u32, clauses: &[Vec<Literal>]) -> ClauseSet {
    let mut set = ClauseSet::new(num_vars);
    for literals in clauses {
        set.add(Clause::new(literals.clone(), None));
    }
    set
}

/// Exhaustive satisfiability check for small formulas
fn brute_force(clauses: &ClauseSet) -> bool {
    let n = clauses.num_vars();
    (0u64..(1 << n)).any(|mask| {
        clauses.is_satisfied_by(|lit| {
            let bit = mask & (1 << (lit.unsigned_abs() - 1)) != 0;
            bit == (lit > 0)
        })
    })
}

fn random_cnf(rng: &mut StdRng, num_vars: u32, num_clauses: usize, width: usize) -> ClauseSet {
    let clauses: Vec<Vec<Literal>> = (0..num_clauses)
        .map(|_| {
            (0..width)
                .map(|_| {
                    let var = rng.gen_range(1..=num_vars) as Literal;
                    if rng.gen_bool(0.5) {
                        var
                    } else {
                        -var
                    }
                })
                .collect()
        })
        .collect();
    clause_set(num_vars, &clauses)
}

/// Pigeon `p` in hole `h` is variable `p * holes + h + 1`
fn pigeonhole(pigeons: u32, holes: u32) -> ClauseSet {
    let var = |p: u32, h: u32| (p * holes + h + 1) as Literal;
    let mut clauses = Vec::new();
    for p in 0..pigeons {
        clauses.push((0..holes).map(|h| var(p, h)).collect());
    }
    for h in 0..holes {
        for p in 0..pigeons {
            for q in p + 1..pigeons {
                clauses.push(vec![-var(p, h), -var(q, h)]);
            }
        }
    }
    clause_set(pigeons * holes, &clauses)
}

#[test]
fn test_dpll_agrees_with_brute_force() {
    let mut rng = StdRng::seed_from_u64(7);
    let solver = DpllSolver::new();

    for round in 0..300 {
        let num_vars = rng.gen_range(1..=8);
        let num_clauses = rng.gen_range(1..=40);
        let width = rng.gen_range(1..=3);
        let clauses = random_cnf(&mut rng, num_vars, num_clauses, width);

        let outcome = solver.solve(&clauses, &SolveOptions::default()).unwrap();
        assert_eq!(
            outcome.is_satisfiable(),
            brute_force(&clauses),
            "round {} disagrees on {:?}",
            round,
            clauses
        );
        if let Some(model) = outcome.model() {
            assert!(model.satisfies(&clauses));
            assert_eq!(model.num_vars(), num_vars as usize);
        }
    }
}

#[test]
fn test_dpll_empty_formula_is_satisfiable() {
    let outcome = DpllSolver::new()
        .solve(&ClauseSet::new(3), &SolveOptions::default())
        .unwrap();
    assert_eq!(outcome.model().unwrap().literals().collect::<Vec<_>>(), vec![-1, -2, -3]);
}

#[test]
fn test_dpll_empty_clause_is_unsatisfiable() {
    let clauses = clause_set(2, &[vec![1, 2], vec![]]);
    let outcome = DpllSolver::new().solve(&clauses, &SolveOptions::default()).unwrap();
    assert_eq!(outcome, SolveOutcome::Unsatisfiable);
}

#[test]
fn test_dpll_conflicting_units() {
    let clauses = clause_set(1, &[vec![1], vec![-1]]);
    let outcome = DpllSolver::new().solve(&clauses, &SolveOptions::default()).unwrap();
    assert_eq!(outcome.status(), SolveStatus::Unsatisfiable);
}

#[test]
fn test_dpll_duplicate_literals_and_tautologies() {
    let clauses = clause_set(2, &[vec![1, 1, -2], vec![2, -2], vec![-1, -1]]);
    let outcome = DpllSolver::new().solve(&clauses, &SolveOptions::default()).unwrap();
    let model = outcome.model().unwrap();
    assert!(model.literal(-1));
    assert!(model.literal(-2));
}

#[test]
fn test_dpll_pigeonhole() {
    let solver = DpllSolver::new();
    let outcome = solver.solve(&pigeonhole(4, 3), &SolveOptions::default()).unwrap();
    assert_eq!(outcome, SolveOutcome::Unsatisfiable);

    let outcome = solver.solve(&pigeonhole(3, 3), &SolveOptions::default()).unwrap();
    assert!(outcome.is_satisfiable());
}

#[test]
fn test_dpll_timeout_is_unknown() {
    let options = SolveOptions::new().with_timeout(Duration::ZERO);
    let outcome = DpllSolver::new().solve(&pigeonhole(4, 3), &options).unwrap();
    assert_eq!(outcome, SolveOutcome::Unknown(UnknownReason::Timeout));
}

#[test]
fn test_dpll_timeout_during_search() {
    // Far too many branches to refute within the deadline
    let solver = DpllSolver::new().with_clock_check_mask(0);
    let options = SolveOptions::new().with_timeout(Duration::from_millis(50));

    let start = std::time::Instant::now();
    let outcome = solver.solve(&pigeonhole(10, 9), &options).unwrap();
    assert_eq!(outcome, SolveOutcome::Unknown(UnknownReason::Timeout));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_dpll_interrupt_is_unknown() {
    let flag = Arc::new(AtomicBool::new(true));
    let options = SolveOptions::new().with_interrupt(flag);
    let outcome = DpllSolver::new().solve(&pigeonhole(4, 3), &options).unwrap();
    assert_eq!(outcome, SolveOutcome::Unknown(UnknownReason::Interrupted));
}

#[test]
fn test_boxed_solver() {
    let solver: Box<dyn SatSolver> = Box::new(DpllSolver::new());
    assert_eq!(solver.name(), "builtin");
    let outcome = solver.solve(&clause_set(1, &[vec![1]]), &SolveOptions::default()).unwrap();
    assert!(outcome.model().unwrap().literal(1));
}

#[cfg(unix)]
mod external {
    use super::*;

    fn script(body: &str) -> ExternalSolver {
        ExternalSolver::new("sh")
            .with_args(["-c".to_string(), format!("cat > /dev/null; {}", body)])
    }

    #[test]
    fn test_external_satisfiable() {
        let clauses = clause_set(2, &[vec![1], vec![-1, 2]]);
        let solver = script("echo 's SATISFIABLE'; echo 'v 1 2 0'; exit 10");
        let outcome = solver.solve(&clauses, &SolveOptions::default()).unwrap();
        assert_eq!(outcome.model().unwrap().literals().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_external_unsatisfiable() {
        let clauses = clause_set(1, &[vec![1], vec![-1]]);
        let solver = script("echo 's UNSATISFIABLE'; exit 20");
        let outcome = solver.solve(&clauses, &SolveOptions::default()).unwrap();
        assert_eq!(outcome, SolveOutcome::Unsatisfiable);
    }

    #[test]
    fn test_external_wrong_model_is_unknown() {
        let clauses = clause_set(1, &[vec![1]]);
        let solver = script("echo 's SATISFIABLE'; echo 'v -1 0'");
        let outcome = solver.solve(&clauses, &SolveOptions::default()).unwrap();
        assert!(matches!(outcome, SolveOutcome::Unknown(UnknownReason::Solver(_))));
    }

    #[test]
    fn test_external_timeout_kills_child() {
        let clauses = clause_set(1, &[vec![1]]);
        let solver = script("sleep 30");
        let options = SolveOptions::new().with_timeout(Duration::from_millis(100));

        let start = std::time::Instant::now();
        let outcome = solver.solve(&clauses, &options).unwrap();
        assert_eq!(outcome, SolveOutcome::Unknown(UnknownReason::Timeout));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_external_missing_binary() {
        let solver = ExternalSolver::new("packsat-no-such-solver-binary");
        let err = solver
            .solve(&clause_set(1, &[vec![1]]), &SolveOptions::default())
            .unwrap_err();
        assert!(matches!(err, crate::error::PackError::Io(_)));
    }
}
