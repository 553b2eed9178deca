use super::factor::factor;

/*
Barlow Indispensability
=======================

Clarence Barlow's indispensability assigns every pulse of a stratified meter a
rank: how much the meter would suffer if that pulse were missing. The downbeat
is the most indispensable pulse, the pulse right after it the least.

Vocabulary
----------

  stratification  The meter written as a list of primes, coarsest level first.
                  4/4 in eighths is [2, 2, 2], 6/8 is [2, 3], 3/4 in eighths
                  is [3, 2].

  pulse           Zero-based position in one full cycle of the meter. A meter
                  with stratification [p1, ..., pz] has p1 * ... * pz pulses.

  rank            The indispensability value. A meter with N pulses ranks its
                  pulses with a permutation of 0..N, N - 1 being the downbeat.


Primes
------

  ψ2 = [1, 0]
  ψ3 = [2, 0, 1]

Larger primes p are built from the meter of p - 1, stratified with its
factors in descending order (6 -> [3, 2]). Every rank of that meter at or
above ⌊p/4⌋ is lifted by one, which frees the rank ⌊p/4⌋ for the pulse p - 2.
The last pulse borrows the lifted rank of pulse p - 2:

  ψ5 = [4, 0, 3, 1, 2]
  ψ7 = [6, 0, 4, 2, 5, 1, 3]


Composite meters
----------------

For [p1, ..., pz] with N pulses, pulse k is first rotated back by one
(m = (k - 1) mod N, so the downbeat becomes the last pulse of the previous
cycle). Level i then contributes

  above_i * ψ_pi[(1 + ⌊m / below_i⌋) mod pi]

where above_i is the product of the levels before i and below_i the product of
the levels after it. That is the mixed-radix digit of m at level i, shifted by
one so that each level "looks ahead" to the next pulse.

  [2, 2]    -> [3, 0, 2, 1]
  [2, 2, 2] -> [7, 0, 4, 2, 6, 1, 5, 3]
  [2, 3]    -> [5, 0, 2, 4, 1, 3]
  [3, 2]    -> [5, 0, 3, 1, 4, 2]
*/

/// Indispensability of every pulse of the meter stratified as `factors`
/// (primes, coarsest level first).
///
/// The result has `factors.iter().product()` entries. An empty stratification
/// is a single pulse ranked 0.
pub fn indispensability(factors: &[u32]) -> Vec<u32> {
    let total: usize = factors.iter().map(|&p| p as usize).product();
    let primes: Vec<Vec<u32>> = factors.iter().map(|&p| prime_indispensability(p)).collect();

    (0..total)
        .map(|pulse| pulse_rank(factors, &primes, total, pulse))
        .collect()
}

/// Ranks ψp for a single prime `p`, `p` entries long.
///
/// Values above 3 are only meaningful for primes.
pub fn prime_indispensability(p: u32) -> Vec<u32> {
    if p <= 3 {
        return (0..p).map(|k| (k + p - 1) % p).collect();
    }

    let quarter = p / 4;
    let mut lower = factor(p - 1);
    lower.reverse();
    let lower = indispensability(&lower);
    let lift = |k: usize| {
        let rank = lower[k];
        rank + u32::from(rank >= quarter)
    };

    let p = p as usize;
    (0..p)
        .map(|k| {
            if k == p - 2 {
                quarter
            } else if k == p - 1 {
                lift(k - 1)
            } else {
                lift(k)
            }
        })
        .collect()
}

fn pulse_rank(factors: &[u32], primes: &[Vec<u32>], total: usize, pulse: usize) -> u32 {
    let shifted = (pulse + total - 1) % total;
    let mut above = 1usize;
    let mut rank = 0u32;

    for (&p, ranks) in factors.iter().zip(primes) {
        let p = p as usize;
        let below = total / (above * p);
        let digit = (1 + shifted / below) % p;
        rank += above as u32 * ranks[digit];
        above *= p;
    }

    rank
}
