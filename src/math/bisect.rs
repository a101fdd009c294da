//! Bisection for monotone feasibility problems.
//!
//! The safe-deposit solver asks for the largest `x` with `feasible(x)` when
//! feasibility is monotone (true up to some threshold, false after it). We
//! keep an invariant bracket `[lo, hi]` with `feasible(lo)` and
//! `!feasible(hi)` and halve it until `hi - lo <= tol`.

/// Outcome of a bracketed search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bracketed {
    /// Largest feasible point found; `!feasible(x + tol)` holds.
    Root(f64),
    /// `feasible` never failed up to the search ceiling.
    AboveCeiling(f64),
    /// `feasible(lo)` was already false.
    BelowFloor(f64),
}

impl Bracketed {
    pub fn value(self) -> f64 {
        match self {
            Bracketed::Root(x) | Bracketed::AboveCeiling(x) | Bracketed::BelowFloor(x) => x,
        }
    }
}

/// Search `[lo, ...)` for the feasibility boundary.
///
/// The upper end starts at `start_hi` and doubles (at most `max_doublings`
/// times) until it becomes infeasible.
pub fn bisect_max_feasible<F>(lo: f64, start_hi: f64, max_doublings: u32, tol: f64, feasible: F) -> Bracketed
where
    F: Fn(f64) -> bool,
{
    if !feasible(lo) {
        return Bracketed::BelowFloor(lo);
    }

    let mut lo = lo;
    let mut hi = start_hi.max(lo + tol);
    let mut doublings = 0;
    while feasible(hi) {
        if doublings >= max_doublings {
            return Bracketed::AboveCeiling(hi);
        }
        lo = hi;
        hi *= 2.0;
        doublings += 1;
    }

    let tol = tol.max(f64::EPSILON);
    // Bounded in case `tol` is tiny relative to the bracket.
    for _ in 0..200 {
        if hi - lo <= tol {
            break;
        }
        let mid = lo + 0.5 * (hi - lo);
        if feasible(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Bracketed::Root(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_threshold_within_tolerance() {
        let r = bisect_max_feasible(0.0, 10.0, 20, 1e-6, |x| x * x <= 2.0);
        let x = r.value();
        assert!(matches!(r, Bracketed::Root(_)));
        assert!(x * x <= 2.0);
        assert!((x - 2f64.sqrt()).abs() <= 1e-6);
    }

    #[test]
    fn grows_the_bracket() {
        let r = bisect_max_feasible(0.0, 1.0, 20, 0.5, |x| x <= 1000.0);
        assert!(matches!(r, Bracketed::Root(x) if x <= 1000.0 && x > 999.0));
    }

    #[test]
    fn reports_boundaries() {
        assert!(matches!(bisect_max_feasible(0.0, 1.0, 3, 0.1, |_| true), Bracketed::AboveCeiling(8.0)));
        assert!(matches!(bisect_max_feasible(0.0, 1.0, 3, 0.1, |_| false), Bracketed::BelowFloor(0.0)));
    }
}
