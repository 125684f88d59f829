//! Goodness-of-fit tests for checking that a die roller is fair.

use crate::{rng::RandomSource, NUM_FACES};
use claim::{debug_assert_ge, debug_assert_le};
use ndarray::{Array1, ArrayView1, Zip};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

const EPS: f64 = 1e-10;

/// Return true iff `supp(p) ⊆ supp(q)` for dense PMFs `p` and `q`.
pub(crate) fn is_pmf_subset(p: ArrayView1<f64>, q: ArrayView1<f64>) -> bool {
    Zip::from(p).and(q).all(|&p_i, &q_i| {
        // A = (q_i == 0.0)
        // B = (p_i == 0.0)
        // (A ==> B) <==> (¬A ∨ B)
        (q_i > 0.0) || (p_i <= 0.0)
    })
}

/// Compute the [KL-divergence](https://www.wikiwand.com/en/Kullback%E2%80%93Leibler_divergence).
/// between dense PMFs `p` and `q`.
///
/// `D_{KL}(p || q) = \sum_i p_i * \ln(p_i / q_i)`
///
/// Note: p's support must be a subset of q's support, i.e., `q_i = 0` implies
///       `p_i = 0`.
pub(crate) fn kl_divergence(p: ArrayView1<f64>, q: ArrayView1<f64>) -> f64 {
    // caller should check this before
    debug_assert!(is_pmf_subset(p, q));

    Zip::from(p)
        .and(q)
        .fold(0.0, |sum, &p_i, &q_i| sum + kl_div_term(p_i, q_i))
}

#[inline]
pub(crate) fn kl_div_term(p_i: f64, q_i: f64) -> f64 {
    if q_i > EPS {
        if p_i > EPS {
            p_i * (p_i / q_i).ln()
        } else {
            0.0
        }
    } else if p_i > EPS {
        f64::INFINITY
    } else {
        0.0
    }
}

/// The G-test statistic.
///
/// * Used for comparing observed multinomial distribution with expected
///   hypothesis multinomial distribution.
/// * Asymptotically approximates chi^2-test statistic.
///
/// `n`: the number of samples
/// `p`: the expected PMF
/// `p_hat`: the observed PMF
///
/// G-test: https://www.wikiwand.com/en/G-test
pub(crate) fn g_test(n: usize, p: ArrayView1<f64>, p_hat: ArrayView1<f64>) -> f64 {
    (n as f64) * (2.0 * kl_divergence(p_hat, p))
}

/// The CDF of the Chi^2-distribution, where `dof` is the
/// "degrees-of-freedom" parameter and `x ∈ R`. NaN if `dof` isn't positive.
pub(crate) fn chisq_cdf(dof: f64, x: f64) -> f64 {
    ChiSquared::new(dof)
        .map(|distr| distr.cdf(x))
        .unwrap_or(f64::NAN)
}

/// A goodness-of-fit test between a hypothesized multinomial distribution, `p`,
/// and an experimentally observed distribution, `p_hat`, both represented as
/// dense PMFs. `n` is the number of samples taken to construct `p_hat`.
///
/// Returns `(g, p-value)`, where the p-value is `Pr[G(x) >= g | H_0: x ~ p]`.
pub(crate) fn multinomial_test(n: usize, p: ArrayView1<f64>, p_hat: ArrayView1<f64>) -> (f64, f64) {
    // want to compute the DOF (nnz of p)
    let nnz = p.fold(0.0, |nnz, &x| nnz + if x > 0.0 { 1.0 } else { 0.0 });
    let dof = nnz - 1.0;

    debug_assert_le!(nnz, p.dim() as f64);
    debug_assert_ge!(dof, 1.0);

    // impossible to draw p_hat from p
    if !is_pmf_subset(p_hat, p) {
        return (f64::INFINITY, 0.0);
    }

    let g = g_test(n, p, p_hat);
    let pvalue = 1.0 - chisq_cdf(dof, g);

    log::debug!(
        "multinomial_test: n: {}, |p|: {}, dof: {}, g: {}, p-value: {}",
        n,
        p.dim(),
        dof,
        g,
        pvalue
    );

    (g, pvalue)
}

/// Result of rolling many single dice and comparing the face frequencies to a
/// fair die.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaceCheck {
    pub rolls: usize,
    /// `counts[i]` is the number of times face `i + 1` came up.
    pub counts: [usize; NUM_FACES as usize],
    pub g: f64,
    pub p_value: f64,
}

impl FaceCheck {
    /// Tally the faces of `counts` rolls and test them against a fair die.
    pub fn from_counts(counts: [usize; NUM_FACES as usize]) -> Self {
        let rolls: usize = counts.iter().sum();

        let p = Array1::from_elem(NUM_FACES as usize, 1.0 / f64::from(NUM_FACES));
        let p_hat = counts
            .iter()
            .map(|&count| (count as f64) / (rolls.max(1) as f64))
            .collect::<Array1<f64>>();

        let (g, p_value) = multinomial_test(rolls, p.view(), p_hat.view());

        Self {
            rolls,
            counts,
            g,
            p_value,
        }
    }

    /// Roll `rolls` single dice from `rng` and test them.
    pub fn sample<R: RandomSource + ?Sized>(rng: &mut R, rolls: usize) -> Self {
        let mut counts = [0_usize; NUM_FACES as usize];
        for _ in 0..rolls {
            counts[(rng.roll_die() - 1) as usize] += 1;
        }
        Self::from_counts(counts)
    }

    /// The observed frequency of `face`.
    pub fn p_hat(&self, face: u8) -> f64 {
        (self.counts[(face - 1) as usize] as f64) / (self.rolls.max(1) as f64)
    }

    /// Would we reject "this die is fair" at significance level `alpha`?
    pub fn is_suspicious(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}
