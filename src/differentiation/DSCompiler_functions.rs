//! Slice-level transcendental kernels of the derivative structure compiler.
//!
//! Each function fills the array of its own univariate derivatives at the
//! operand value and hands it to `compose`. For tan, the inverse trigonometric
//! and the hyperbolic families the n-th derivative is a polynomial (possibly
//! divided by a power of 1 ± x²) whose coefficients follow a recurrence; as the
//! polynomials have the parity of their degree, the coefficients of P_(n-1)
//! and P_n are interleaved in a single array.
use crate::differentiation::DSCompiler::DSCompiler;
use std::f64::consts::{LN_10, PI};

impl DSCompiler {
    ////////////////////////////////////////////////////////////////////////////////////////////
    //                                EXPONENTIALS AND LOGARITHMS
    ////////////////////////////////////////////////////////////////////////////////////////////

    pub fn exp(&self, operand: &[f64], result: &mut [f64]) {
        let function = vec![operand[0].exp(); self.get_order() + 1];
        self.compose(operand, &function, result);
    }

    /// exp(x) - 1
    pub fn exp_m1(&self, operand: &[f64], result: &mut [f64]) {
        let mut function = vec![operand[0].exp(); self.get_order() + 1];
        function[0] = operand[0].exp_m1();
        self.compose(operand, &function, result);
    }

    /// natural logarithm: [ln(x), 1/x, -1/x^2, 2/x^3, ...]
    pub fn ln(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let mut function = vec![0.0; self.get_order() + 1];
        function[0] = x.ln();
        fill_log_derivatives(&mut function, 1.0 / x, 1.0 / x);
        self.compose(operand, &function, result);
    }

    /// ln(1 + x)
    pub fn ln_1p(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let mut function = vec![0.0; self.get_order() + 1];
        function[0] = x.ln_1p();
        let inv = 1.0 / (1.0 + x);
        fill_log_derivatives(&mut function, inv, inv);
        self.compose(operand, &function, result);
    }

    /// base 10 logarithm
    pub fn log10(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let mut function = vec![0.0; self.get_order() + 1];
        function[0] = x.log10();
        let inv = 1.0 / x;
        fill_log_derivatives(&mut function, inv / LN_10, inv);
        self.compose(operand, &function, result);
    }

    ////////////////////////////////////////////////////////////////////////////////////////////
    //                                      TRIGONOMETRY
    ////////////////////////////////////////////////////////////////////////////////////////////

    pub fn cos(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let function = cyclic_derivatives(x.cos(), -x.sin(), -1.0, self.get_order());
        self.compose(operand, &function, result);
    }

    pub fn sin(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let function = cyclic_derivatives(x.sin(), x.cos(), -1.0, self.get_order());
        self.compose(operand, &function, result);
    }

    /// d^n tan(x)/dx^n = P_n(tan(x)), P_0(t) = t, P_n(t) = (1 + t^2) P_(n-1)'(t)
    pub fn tan(&self, operand: &[f64], result: &mut [f64]) {
        let order = self.get_order();
        let t = operand[0].tan();
        let mut function = vec![0.0; order + 1];
        function[0] = t;
        if order > 0 {
            let mut p = vec![0.0; order + 2];
            p[1] = 1.0;
            let t2 = t * t;
            for n in 1..=order {
                let mut v = 0.0;
                p[n + 1] = n as f64 * p[n];
                for k in (0..=n + 1).rev().step_by(2) {
                    v = v * t2 + p[k];
                    if k > 2 {
                        p[k - 2] = (k - 1) as f64 * p[k - 1] + (k - 3) as f64 * p[k - 3];
                    } else if k == 2 {
                        p[0] = p[1];
                    }
                }
                if n % 2 == 0 {
                    v *= t;
                }
                function[n] = v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// d^n acos(x)/dx^n = P_n(x) / (1 - x^2)^((2n-1)/2),
    /// P_1 = -1, P_n(x) = (1 - x^2) P_(n-1)'(x) + (2n - 3) x P_(n-1)(x)
    pub fn acos(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let mut function = vec![0.0; self.get_order() + 1];
        function[0] = x.acos();
        inverse_trig_derivatives(&mut function, x, -1.0);
        self.compose(operand, &function, result);
    }

    /// same recurrence as acos with P_1 = 1
    pub fn asin(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let mut function = vec![0.0; self.get_order() + 1];
        function[0] = x.asin();
        inverse_trig_derivatives(&mut function, x, 1.0);
        self.compose(operand, &function, result);
    }

    /// d^n atan(x)/dx^n = Q_n(x) / (1 + x^2)^n,
    /// Q_1 = 1, Q_n(x) = (1 + x^2) Q_(n-1)'(x) - 2(n-1) x Q_(n-1)(x)
    pub fn atan(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let order = self.get_order();
        let mut function = vec![0.0; order + 1];
        function[0] = x.atan();
        if order > 0 {
            let mut q = vec![0.0; order];
            q[0] = 1.0;
            let x2 = x * x;
            let f = 1.0 / (1.0 + x2);
            let mut coeff = f;
            function[1] = coeff * q[0];
            for n in 2..=order {
                let mut v = 0.0;
                q[n - 1] = -(n as f64) * q[n - 2];
                for k in (0..n).rev().step_by(2) {
                    v = v * x2 + q[k];
                    if k > 2 {
                        q[k - 2] = (k - 1) as f64 * q[k - 1] + (k as f64 - 1.0 - 2.0 * n as f64) * q[k - 3];
                    } else if k == 2 {
                        q[0] = q[1];
                    }
                }
                if n % 2 == 0 {
                    v *= x;
                }
                coeff *= f;
                function[n] = coeff * v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// quadrant-correct arctangent of y/x, computed without dividing by x:
    /// 2 atan(y / (r + x)) for x >= 0, ±π - 2 atan(y / (r - x)) otherwise
    pub fn atan2(&self, y: &[f64], x: &[f64], result: &mut [f64]) {
        let size = self.get_size();
        let mut tmp1 = vec![0.0; size];
        let mut tmp2 = vec![0.0; size];
        let mut r = vec![0.0; size];
        self.multiply(x, x, &mut tmp1);
        self.multiply(y, y, &mut tmp2);
        let mut sum = vec![0.0; size];
        self.add(&tmp1, &tmp2, &mut sum);
        self.root_n(&sum, 2, &mut r);

        if x[0] >= 0.0 {
            self.add(&r, x, &mut tmp1);
            self.divide(y, &tmp1, &mut tmp2);
            self.atan(&tmp2, &mut tmp1);
            for (res, a) in result.iter_mut().zip(&tmp1) {
                *res = 2.0 * a;
            }
        } else {
            self.subtract(&r, x, &mut tmp1);
            self.divide(y, &tmp1, &mut tmp2);
            self.atan(&tmp2, &mut tmp1);
            let shift = if tmp1[0] <= 0.0 { -PI } else { PI };
            result[0] = shift - 2.0 * tmp1[0];
            for (res, a) in result.iter_mut().zip(&tmp1).skip(1) {
                *res = -2.0 * a;
            }
        }

        // signed zeros and infinities handled by the scalar function
        result[0] = y[0].atan2(x[0]);
    }

    ////////////////////////////////////////////////////////////////////////////////////////////
    //                                   HYPERBOLIC FUNCTIONS
    ////////////////////////////////////////////////////////////////////////////////////////////

    pub fn cosh(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let function = cyclic_derivatives(x.cosh(), x.sinh(), 1.0, self.get_order());
        self.compose(operand, &function, result);
    }

    pub fn sinh(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let function = cyclic_derivatives(x.sinh(), x.cosh(), 1.0, self.get_order());
        self.compose(operand, &function, result);
    }

    /// d^n tanh(x)/dx^n = P_n(tanh(x)), P_0(t) = t, P_n(t) = (1 - t^2) P_(n-1)'(t)
    pub fn tanh(&self, operand: &[f64], result: &mut [f64]) {
        let order = self.get_order();
        let t = operand[0].tanh();
        let mut function = vec![0.0; order + 1];
        function[0] = t;
        if order > 0 {
            let mut p = vec![0.0; order + 2];
            p[1] = 1.0;
            let t2 = t * t;
            for n in 1..=order {
                let mut v = 0.0;
                p[n + 1] = -(n as f64) * p[n];
                for k in (0..=n + 1).rev().step_by(2) {
                    v = v * t2 + p[k];
                    if k > 2 {
                        p[k - 2] = (k - 1) as f64 * p[k - 1] - (k - 3) as f64 * p[k - 3];
                    } else if k == 2 {
                        p[0] = p[1];
                    }
                }
                if n % 2 == 0 {
                    v *= t;
                }
                function[n] = v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// d^n acosh(x)/dx^n = P_n(x) / (x^2 - 1)^((2n-1)/2),
    /// P_1 = 1, P_n(x) = (x^2 - 1) P_(n-1)'(x) - (2n - 3) x P_(n-1)(x)
    pub fn acosh(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let order = self.get_order();
        let mut function = vec![0.0; order + 1];
        function[0] = x.acosh();
        if order > 0 {
            let mut p = vec![0.0; order];
            p[0] = 1.0;
            let x2 = x * x;
            let f = 1.0 / (x2 - 1.0);
            let mut coeff = f.sqrt();
            function[1] = coeff * p[0];
            for n in 2..=order {
                let mut v = 0.0;
                p[n - 1] = (1.0 - n as f64) * p[n - 2];
                for k in (0..n).rev().step_by(2) {
                    v = v * x2 + p[k];
                    if k > 2 {
                        p[k - 2] = (1.0 - k as f64) * p[k - 1] + (k as f64 - 2.0 * n as f64) * p[k - 3];
                    } else if k == 2 {
                        p[0] = -p[1];
                    }
                }
                if n % 2 == 0 {
                    v *= x;
                }
                coeff *= f;
                function[n] = coeff * v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// d^n asinh(x)/dx^n = P_n(x) / (x^2 + 1)^((2n-1)/2),
    /// P_1 = 1, P_n(x) = (x^2 + 1) P_(n-1)'(x) - (2n - 3) x P_(n-1)(x)
    pub fn asinh(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let order = self.get_order();
        let mut function = vec![0.0; order + 1];
        function[0] = x.asinh();
        if order > 0 {
            let mut p = vec![0.0; order];
            p[0] = 1.0;
            let x2 = x * x;
            let f = 1.0 / (1.0 + x2);
            let mut coeff = f.sqrt();
            function[1] = coeff * p[0];
            for n in 2..=order {
                let mut v = 0.0;
                p[n - 1] = (1.0 - n as f64) * p[n - 2];
                for k in (0..n).rev().step_by(2) {
                    v = v * x2 + p[k];
                    if k > 2 {
                        p[k - 2] = (k - 1) as f64 * p[k - 1] + (k as f64 - 2.0 * n as f64) * p[k - 3];
                    } else if k == 2 {
                        p[0] = p[1];
                    }
                }
                if n % 2 == 0 {
                    v *= x;
                }
                coeff *= f;
                function[n] = coeff * v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// d^n atanh(x)/dx^n = Q_n(x) / (1 - x^2)^n,
    /// Q_1 = 1, Q_n(x) = (1 - x^2) Q_(n-1)'(x) + 2(n-1) x Q_(n-1)(x)
    pub fn atanh(&self, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let order = self.get_order();
        let mut function = vec![0.0; order + 1];
        function[0] = x.atanh();
        if order > 0 {
            let mut q = vec![0.0; order];
            q[0] = 1.0;
            let x2 = x * x;
            let f = 1.0 / (1.0 - x2);
            let mut coeff = f;
            function[1] = coeff * q[0];
            for n in 2..=order {
                let mut v = 0.0;
                q[n - 1] = n as f64 * q[n - 2];
                for k in (0..n).rev().step_by(2) {
                    v = v * x2 + q[k];
                    if k > 2 {
                        q[k - 2] = (k - 1) as f64 * q[k - 1] + (2.0 * n as f64 - k as f64 + 1.0) * q[k - 3];
                    } else if k == 2 {
                        q[0] = q[1];
                    }
                }
                if n % 2 == 0 {
                    v *= x;
                }
                coeff *= f;
                function[n] = coeff * v;
            }
        }
        self.compose(operand, &function, result);
    }
}

/// [f, f', sign f, sign f', ...] for functions whose second derivative is sign * f
fn cyclic_derivatives(value: f64, first: f64, sign: f64, order: usize) -> Vec<f64> {
    let mut function = vec![0.0; order + 1];
    function[0] = value;
    if order > 0 {
        function[1] = first;
        for i in 2..=order {
            function[i] = sign * function[i - 2];
        }
    }
    function
}

/// function[k] = first * (-1)^(k-1) (k-1)! * inv^(k-1) for k >= 1
fn fill_log_derivatives(function: &mut [f64], first: f64, inv: f64) {
    let mut xk = first;
    for i in 1..function.len() {
        function[i] = xk;
        xk *= -(i as f64) * inv;
    }
}

/// derivatives of asin (p1 = 1) and acos (p1 = -1) from order 1 upwards
fn inverse_trig_derivatives(function: &mut [f64], x: f64, p1: f64) {
    let order = function.len() - 1;
    if order == 0 {
        return;
    }
    let mut p = vec![0.0; order];
    p[0] = p1;
    let x2 = x * x;
    let f = 1.0 / (1.0 - x2);
    let mut coeff = f.sqrt();
    function[1] = coeff * p[0];
    for n in 2..=order {
        let mut v = 0.0;
        p[n - 1] = (n - 1) as f64 * p[n - 2];
        for k in (0..n).rev().step_by(2) {
            v = v * x2 + p[k];
            if k > 2 {
                p[k - 2] = (k - 1) as f64 * p[k - 1] + (2 * n - k) as f64 * p[k - 3];
            } else if k == 2 {
                p[0] = p[1];
            }
        }
        if n % 2 == 0 {
            v *= x;
        }
        coeff *= f;
        function[n] = coeff * v;
    }
}
