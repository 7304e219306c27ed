//! scalar helpers shared by the derivative structure kernels:
//! factorials, accurate dot products, IEEE 754 remainder and binary scaling

/// n! as a double, +Infinity once it no longer fits (n > 170)
pub fn factorial(n: usize) -> f64 {
    if n > 170 {
        return f64::INFINITY;
    }
    (1..=n).fold(1.0, |acc, k| acc * k as f64)
}

/// Σ a[i]*b[i] computed with compensated summation of exact products,
/// so the result is as accurate as if computed in twice the working precision.
/// Falls back to the naive sum when the compensated one is NaN (infinite terms).
pub fn linear_combination(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    match len {
        0 => return 0.0,
        1 => return a[0] * b[0],
        _ => {}
    }

    // exact products: high + low == a*b
    let mut prod_high = Vec::with_capacity(len);
    let mut prod_low_sum = 0.0;
    for i in 0..len {
        let high = a[i] * b[i];
        prod_low_sum += a[i].mul_add(b[i], -high);
        prod_high.push(high);
    }

    // two-sum accumulation of the high parts
    let mut s_high_prev = prod_high[0] + prod_high[1];
    let s_prime = s_high_prev - prod_high[1];
    let mut s_low_sum = (prod_high[1] - (s_high_prev - s_prime)) + (prod_high[0] - s_prime);
    for &next in prod_high.iter().skip(2) {
        let s_high_cur = s_high_prev + next;
        let s_prime = s_high_cur - next;
        s_low_sum += (next - (s_high_cur - s_prime)) + (s_high_prev - s_prime);
        s_high_prev = s_high_cur;
    }

    let result = s_high_prev + (prod_low_sum + s_low_sum);
    if result.is_nan() {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    } else {
        result
    }
}

/// IEEE 754 remainder: x - n*y where n is x/y rounded to the nearest integer, ties to even
pub fn ieee_remainder(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() || x.is_infinite() || y == 0.0 {
        return f64::NAN;
    }
    if y.is_infinite() {
        return x;
    }
    let a = y.abs();
    // fmod is exact; reducing modulo 2a first keeps the parity of the quotient
    let doubled = 2.0 * a;
    let mut s = if doubled.is_finite() {
        (x % doubled).abs()
    } else {
        x.abs()
    };
    if s >= 1.5 * a {
        s -= doubled;
    } else if s > 0.5 * a {
        s -= a;
    }
    if x.is_sign_negative() { -s } else { s }
}

/// unbiased binary exponent, as in x = m * 2^e with 1 <= |m| < 2
/// (1024 for infinities and NaN, -1023 for zero and subnormals)
pub fn get_exponent(x: f64) -> i32 {
    (((x.to_bits() >> 52) & 0x7ff) as i32) - 1023
}

/// x * 2^n without overflowing the intermediate power of two
pub fn scalb(x: f64, n: i32) -> f64 {
    let mut x = x;
    let mut n = n;
    while n > 1023 {
        x *= f64::from_bits(2046_u64 << 52);
        n -= 1023;
    }
    while n < -1022 {
        x *= f64::from_bits(1_u64 << 52);
        n += 1022;
    }
    x * f64::from_bits(((n + 1023) as u64) << 52)
}

/// nearest integer value, ties to even
pub fn rint(x: f64) -> f64 {
    x.round_ties_even()
}

/// nearest integer, ties rounded towards positive infinity
pub fn round_half_up(x: f64) -> i64 {
    if x.is_nan() {
        return 0;
    }
    let floor = x.floor();
    if x - floor >= 0.5 {
        (floor + 1.0) as i64
    } else {
        floor as i64
    }
}

#[cfg(test)]
mod tests_math_utils {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0), 1.0);
        assert_eq!(factorial(5), 120.0);
        assert_relative_eq!(factorial(20), 2432902008176640000.0, epsilon = 1.0);
        assert!(factorial(171).is_infinite());
    }

    #[test]
    fn test_linear_combination_cancellation() {
        // naive evaluation of this dot product returns 0
        let a = [1.0e17, 1.0, -1.0e17];
        let b = [1.0, 1.0, 1.0];
        assert_eq!(linear_combination(&a, &b), 1.0);
        let naive: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        assert_eq!(naive, 0.0);
    }

    #[test]
    fn test_linear_combination_exact_products() {
        let a = [-1321008684645961.0 / 268435456.0, -5774608829631843.0 / 268435456.0, -7645843051051357.0 / 8589934592.0];
        let b = [-5712344449280879.0 / 2097152.0, -4550117129121957.0 / 2097152.0, 8846951984510141.0 / 131072.0];
        let expected = -1.8551294182586248737720779899_f64;
        let accurate = linear_combination(&a, &b);
        assert_relative_eq!(accurate, expected, max_relative = 1.0e-15);
        let naive: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        assert_eq!(naive, 0.0);
    }

    #[test]
    fn test_linear_combination_infinite() {
        let a = [f64::INFINITY, 1.0];
        let b = [1.0, 2.0];
        assert_eq!(linear_combination(&a, &b), f64::INFINITY);
    }

    #[test]
    fn test_ieee_remainder() {
        assert_eq!(ieee_remainder(5.0, 3.0), -1.0);
        assert_eq!(ieee_remainder(4.0, 3.0), 1.0);
        // ties go to the even quotient
        assert_eq!(ieee_remainder(2.5, 1.0), 0.5);
        assert_eq!(ieee_remainder(3.5, 1.0), -0.5);
        assert_eq!(ieee_remainder(-5.0, 3.0), 1.0);
        assert!(ieee_remainder(1.0, 0.0).is_nan());
        assert!(ieee_remainder(f64::INFINITY, 2.0).is_nan());
        assert_eq!(ieee_remainder(3.0, f64::INFINITY), 3.0);
        assert!(ieee_remainder(-6.0, 3.0).is_sign_negative());
    }

    #[test]
    fn test_exponent_and_scalb() {
        assert_eq!(get_exponent(1.0), 0);
        assert_eq!(get_exponent(3.0e250), 832);
        assert_eq!(get_exponent(0.75), -1);
        assert_eq!(scalb(3.0, 4), 48.0);
        assert_eq!(scalb(scalb(1.5, -1030), 1030), 1.5);
        assert_eq!(scalb(1.0, -1074), f64::from_bits(1));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(rint(2.5), 2.0);
        assert_eq!(rint(3.5), 4.0);
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(0.49999999999999994), 0);
    }
}
