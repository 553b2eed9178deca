//! Prime factorization for meter levels and subdivisions.

/// Factor `n` into its primes in ascending order, repeated factors included.
///
/// `factor(12) == [2, 2, 3]`, `factor(1)` is empty. Callers guarantee `n >= 1`;
/// zero yields an empty list rather than looping.
pub fn factor(n: u32) -> Vec<u32> {
    let mut factors = Vec::new();
    factor_into(n, &mut factors);
    factors
}

/// Append the prime factors of `n` to `out` (ascending).
pub fn factor_into(mut n: u32, out: &mut Vec<u32>) {
    if n <= 1 {
        return;
    }

    while n % 2 == 0 {
        out.push(2);
        n /= 2;
    }

    let mut p = 3u32;
    // p * p compared in u64 so large primes near u32::MAX don't overflow
    while (p as u64) * (p as u64) <= n as u64 {
        while n % p == 0 {
            out.push(p);
            n /= p;
        }
        p += 2;
    }

    if n > 1 {
        out.push(n);
    }
}
